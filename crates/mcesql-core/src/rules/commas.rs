use super::span_between;
use crate::dialect::CLAUSE_KEYWORDS;
use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};
use crate::query::is_function_call;

/// Misplaced commas in the outer query
///
/// Only depth 0 is checked; commas inside function arguments and
/// subqueries are left to the deep parse.
pub struct CommaValidation;

impl Rule for CommaValidation {
    fn id(&self) -> &'static str {
        "comma"
    }

    fn name(&self) -> &'static str {
        "Comma placement"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for scope in ctx.scopes().iter().filter(|s| s.depth == 0) {
            if let Some(first) = code.get(scope.select_list.start) {
                if scope.select_list.start < scope.end && first.is_symbol(',') {
                    diagnostics.push(
                        Diagnostic::error(self.id(), "Leading comma after SELECT")
                            .with_span(first.span())
                            .with_help("Remove the comma before the first column."),
                    );
                }
            }
        }

        for (i, token) in code.iter().enumerate() {
            if token.depth != 0 || !token.is_symbol(',') {
                continue;
            }
            let Some(next) = code.get(i + 1) else {
                continue;
            };
            if next.is_symbol(',') {
                diagnostics.push(
                    Diagnostic::error(self.id(), "Double comma")
                        .with_span(span_between(code, i, i + 1))
                        .with_help("Remove the extra comma or add the missing column."),
                );
            } else if next.depth == 0
                && next.is_any_keyword(CLAUSE_KEYWORDS)
                && !is_function_call(code, i + 1)
            {
                diagnostics.push(
                    Diagnostic::error(self.id(), format!("Trailing comma before {}", next.upper()))
                        .with_span(token.span())
                        .with_help("Remove the comma after the last item."),
                );
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{check, flagged};

    #[test]
    fn test_trailing_comma_before_from() {
        let sql = "SELECT a, b, FROM T";
        let diagnostics = check(&CommaValidation, sql);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Trailing comma before FROM");
        assert_eq!(flagged(sql, &diagnostics), vec![","]);
        assert_eq!(diagnostics[0].span.start, 11);
    }

    #[test]
    fn test_double_and_leading_commas() {
        let sql = "SELECT , a,, b FROM T";
        let diagnostics = check(&CommaValidation, sql);
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["Leading comma after SELECT", "Double comma"]);
        assert_eq!(flagged(sql, &diagnostics)[1], ",,");
    }

    #[test]
    fn test_nested_commas_ignored() {
        let sql = "SELECT CONCAT(a, , b) AS x FROM T";
        assert!(check(&CommaValidation, sql).is_empty());
    }

    #[test]
    fn test_valid_lists() {
        assert!(check(&CommaValidation, "SELECT a, b FROM T, U ORDER BY a, b").is_empty());
    }

    #[test]
    fn test_left_and_right_functions_after_comma() {
        for sql in [
            "SELECT a, LEFT(b, 2) AS c FROM T",
            "SELECT a, RIGHT(Phone, 4) AS Last4 FROM T",
        ] {
            assert!(check(&CommaValidation, sql).is_empty(), "{sql}");
        }
        let sql = "SELECT a, FROM T, LEFT JOIN U ON 1 = 1";
        let diagnostics = check(&CommaValidation, sql);
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["Trailing comma before FROM", "Trailing comma before LEFT"]);
    }
}
