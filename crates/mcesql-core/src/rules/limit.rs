use super::is_qualified;
use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};

/// `LIMIT n` is not T-SQL
pub struct LimitProhibition;

impl Rule for LimitProhibition {
    fn id(&self) -> &'static str {
        "limit"
    }

    fn name(&self) -> &'static str {
        "LIMIT clause"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        code.iter()
            .enumerate()
            .filter(|(i, t)| t.is_keyword("LIMIT") && !is_qualified(code, *i))
            .map(|(_, t)| {
                Diagnostic::error(self.id(), "LIMIT is not supported in MCE SQL")
                    .with_span(t.span())
                    .with_help("Use SELECT TOP n instead.")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{check, flagged};

    #[test]
    fn test_limit_flagged() {
        let sql = "SELECT * FROM A LIMIT 10";
        let diagnostics = check(&LimitProhibition, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["LIMIT"]);
        assert_eq!(diagnostics[0].help.as_deref(), Some("Use SELECT TOP n instead."));
    }

    #[test]
    fn test_limit_in_string_ignored() {
        assert!(check(&LimitProhibition, "SELECT 'LIMIT 10' AS a").is_empty());
    }
}
