//! Statements a read-only query activity cannot run

use super::is_qualified;
use crate::dialect::{prohibited_keyword, KeywordCategory};
use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};

pub struct ProhibitedKeywords;

impl Rule for ProhibitedKeywords {
    fn id(&self) -> &'static str {
        "prohibited-keyword"
    }

    fn name(&self) -> &'static str {
        "Prohibited keyword"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        code.iter()
            .enumerate()
            .filter(|(i, t)| t.is_word() && !is_qualified(code, *i))
            .filter_map(|(_, token)| {
                let category = prohibited_keyword(token.text)?;
                let keyword = token.upper();
                let (message, help) = match category {
                    KeywordCategory::Dml => (
                        format!("{keyword} is not allowed: MCE SQL queries are read-only"),
                        "Pick Overwrite, Update or Append on the query activity to write results.",
                    ),
                    KeywordCategory::Ddl => (
                        format!("{keyword} is not allowed: MCE SQL cannot change data extension structure"),
                        "Create or change data extensions in Contact Builder.",
                    ),
                    KeywordCategory::Procedural => (
                        format!("{keyword} is not allowed: MCE SQL does not support procedural statements"),
                        "A query activity runs a single SELECT statement.",
                    ),
                };
                Some(
                    Diagnostic::error(self.id(), message)
                        .with_span(token.span())
                        .with_help(help),
                )
            })
            .collect()
    }
}
