use super::is_qualified;
use crate::dialect::SET_OPERATORS;
use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};

/// `OFFSET ... FETCH` is only valid after an ORDER BY of the same query
pub struct OffsetWithoutOrderBy;

impl Rule for OffsetWithoutOrderBy {
    fn id(&self) -> &'static str {
        "offset-without-order-by"
    }

    fn name(&self) -> &'static str {
        "OFFSET without ORDER BY"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for (i, token) in code.iter().enumerate() {
            if !token.is_keyword("OFFSET") || is_qualified(code, i) {
                continue;
            }

            let mut ordered = false;
            for j in (1..i).rev() {
                let t = &code[j];
                if t.depth < token.depth {
                    break;
                }
                if t.depth != token.depth {
                    continue;
                }
                if t.is_symbol(';') || t.is_any_keyword(SET_OPERATORS) {
                    break;
                }
                if t.is_keyword("BY") && code[j - 1].is_keyword("ORDER") {
                    ordered = true;
                    break;
                }
            }

            if !ordered {
                diagnostics.push(
                    Diagnostic::error(self.id(), "OFFSET requires an ORDER BY clause in the same query")
                        .with_span(token.span())
                        .with_help("Add ORDER BY before OFFSET ... FETCH."),
                );
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::check;

    #[test]
    fn test_offset_without_order_by() {
        let diagnostics = check(
            &OffsetWithoutOrderBy,
            "SELECT a FROM T OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY",
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_offset_with_order_by() {
        let sql = "SELECT a FROM T ORDER BY a OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY";
        assert!(check(&OffsetWithoutOrderBy, sql).is_empty());
    }

    #[test]
    fn test_window_order_by_does_not_count() {
        let sql = "SELECT ROW_NUMBER() OVER (ORDER BY a) AS n FROM T OFFSET 0 ROWS";
        assert_eq!(check(&OffsetWithoutOrderBy, sql).len(), 1);
    }
}
