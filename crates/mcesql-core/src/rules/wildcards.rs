//! `SELECT *` advisories

use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};
use crate::query::{is_star, is_unqualified_star, select_items};

/// Unqualified `*` in a SELECT that joins tables
pub struct SelectStarWithJoin;

impl Rule for SelectStarWithJoin {
    fn id(&self) -> &'static str {
        "select-star-join"
    }

    fn name(&self) -> &'static str {
        "SELECT * with JOIN"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for scope in ctx.scopes().iter().filter(|s| s.has_join(code)) {
            for item in select_items(code, scope) {
                if is_unqualified_star(code, item.expr.clone()) {
                    diagnostics.push(
                        Diagnostic::warning(
                            self.id(),
                            "SELECT * with JOIN returns every column of every joined table",
                        )
                        .with_span(code[item.expr.start].span())
                        .with_help("Qualify the wildcard (e.g. c.*) or list the columns you need."),
                    );
                }
            }
        }

        diagnostics
    }
}

/// `SELECT *` from a single table in the outer query
pub struct SelectStarSingleTable;

impl Rule for SelectStarSingleTable {
    fn id(&self) -> &'static str {
        "select-star"
    }

    fn name(&self) -> &'static str {
        "SELECT * on a single table"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for scope in ctx.scopes().iter().filter(|s| s.depth == 0 && !s.has_join(code)) {
            let tables = ctx.refs_in_scope(scope).count();
            if tables != 1 {
                continue;
            }
            for item in select_items(code, scope) {
                if is_star(code, item.expr.clone()) {
                    let star = &code[item.expr.end - 1];
                    diagnostics.push(
                        Diagnostic::warning(self.id(), "SELECT * returns every column of the table")
                            .with_span(star.span())
                            .with_help(
                                "List the columns the target data extension needs; new fields would otherwise break the mapping.",
                            ),
                    );
                }
            }
        }

        diagnostics
    }
}
