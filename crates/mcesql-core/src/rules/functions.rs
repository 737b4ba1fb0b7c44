use super::is_qualified;
use crate::dialect::unsupported_function;
use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};
use crate::query::is_function_call;

/// T-SQL functions the platform's engine does not offer
pub struct UnsupportedFunctions;

impl Rule for UnsupportedFunctions {
    fn id(&self) -> &'static str {
        "unsupported-function"
    }

    fn name(&self) -> &'static str {
        "Unsupported function"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        code.iter()
            .enumerate()
            .filter(|(i, _)| is_function_call(code, *i) && !is_qualified(code, *i))
            .filter_map(|(_, token)| {
                let advice = unsupported_function(token.text)?;
                Some(
                    Diagnostic::error(
                        self.id(),
                        format!("{}() is not supported in MCE SQL. {}", token.upper(), advice),
                    )
                    .with_span(token.span()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{check, flagged};

    #[test]
    fn test_try_convert_suggests_convert() {
        let sql = "SELECT try_convert(INT, a) AS n FROM T";
        let diagnostics = check(&UnsupportedFunctions, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["try_convert"]);
        assert!(diagnostics[0].message.contains("Use CONVERT"));
    }

    #[test]
    fn test_name_without_call_is_ignored() {
        assert!(check(&UnsupportedFunctions, "SELECT Trim FROM T").is_empty());
        assert!(check(&UnsupportedFunctions, "SELECT LTRIM(a) AS a FROM T").is_empty());
    }
}
