//! Common table expressions

use super::span_between;
use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};
use crate::query::matching_paren;

/// Flags `WITH name [(columns)] AS (`. Table hints such as `WITH (NOLOCK)`
/// never match because a name must follow `WITH`.
pub struct CteDetection;

impl Rule for CteDetection {
    fn id(&self) -> &'static str {
        "cte"
    }

    fn name(&self) -> &'static str {
        "Common table expression"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for (i, token) in code.iter().enumerate() {
            if !token.is_keyword("WITH") {
                continue;
            }
            let name = i + 1;
            if !code.get(name).is_some_and(|t| t.is_identifier()) {
                continue;
            }
            let mut j = name + 1;
            if code.get(j).is_some_and(|t| t.is_symbol('(')) {
                match matching_paren(code, j) {
                    Some(close) => j = close + 1,
                    None => continue,
                }
            }
            let is_cte = code.get(j).is_some_and(|t| t.is_keyword("AS"))
                && code.get(j + 1).is_some_and(|t| t.is_symbol('('));
            if is_cte {
                diagnostics.push(
                    Diagnostic::error(
                        self.id(),
                        "Common table expressions (WITH ... AS) are not supported in MCE SQL",
                    )
                    .with_span(span_between(code, i, name))
                    .with_help("Move the CTE body into a subquery in the FROM clause."),
                );
            }
        }

        diagnostics
    }
}
