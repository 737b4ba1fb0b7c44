//! Small token-pattern rules

use super::{is_qualified, span_between};
use crate::error::{Diagnostic, Span};
use crate::linter::{LintContext, Rule};

/// `IN ()`
pub struct EmptyInClause;

impl Rule for EmptyInClause {
    fn id(&self) -> &'static str {
        "empty-in"
    }

    fn name(&self) -> &'static str {
        "Empty IN list"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        code.windows(3)
            .enumerate()
            .filter(|(i, w)| {
                w[0].is_keyword("IN")
                    && !is_qualified(code, *i)
                    && w[1].is_symbol('(')
                    && w[2].is_symbol(')')
            })
            .map(|(i, _)| {
                Diagnostic::error(self.id(), "IN list cannot be empty")
                    .with_span(span_between(code, i, i + 2))
                    .with_help("Add at least one value, or remove the condition.")
            })
            .collect()
    }
}

/// `@variable` and `@@function` references
pub struct VariableUsage;

impl Rule for VariableUsage {
    fn id(&self) -> &'static str {
        "variable"
    }

    fn name(&self) -> &'static str {
        "Variable usage"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();
        let mut i = 0;

        while i < code.len() {
            if !code[i].is_symbol('@') {
                i += 1;
                continue;
            }
            let mut j = i;
            // @@ROWCOUNT
            if code.get(j + 1).is_some_and(|t| t.is_symbol('@') && t.start == code[j].end) {
                j += 1;
            }
            match code.get(j + 1) {
                Some(word) if word.is_word() && word.start == code[j].end => {
                    let text = &ctx.sql[code[i].start..word.end];
                    diagnostics.push(
                        Diagnostic::error(
                            self.id(),
                            format!("Variables such as {text} are not supported in MCE SQL"),
                        )
                        .with_span(Span::new(code[i].start, word.end))
                        .with_help("Replace the variable with a literal value."),
                    );
                    i = j + 2;
                }
                _ => i = j + 1,
            }
        }

        diagnostics
    }
}

/// A `;` after the last statement
pub struct TrailingSemicolon;

impl Rule for TrailingSemicolon {
    fn id(&self) -> &'static str {
        "trailing-semicolon"
    }

    fn name(&self) -> &'static str {
        "Trailing semicolon"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        match ctx.code().last() {
            Some(last) if last.is_symbol(';') => vec![Diagnostic::warning(
                self.id(),
                "Trailing semicolon is not needed in a query activity",
            )
            .with_span(last.span())
            .with_help("Remove the semicolon.")],
            _ => Vec::new(),
        }
    }
}

/// Code after a top-level `;`
pub struct MultipleStatements;

impl Rule for MultipleStatements {
    fn id(&self) -> &'static str {
        "multiple-statements"
    }

    fn name(&self) -> &'static str {
        "Multiple statements"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        code.iter()
            .enumerate()
            .filter(|(i, t)| {
                t.depth == 0
                    && t.is_symbol(';')
                    && code.get(i + 1).is_some_and(|next| !next.is_symbol(';'))
            })
            .map(|(i, _)| {
                Diagnostic::error(
                    self.id(),
                    "Multiple statements are not supported: a query activity runs a single SELECT",
                )
                .with_span(span_between(code, i, i + 1))
                .with_help("Split the statements into separate query activities.")
            })
            .collect()
    }
}

/// `!=` instead of `<>`
pub struct NotEqualStyle;

impl Rule for NotEqualStyle {
    fn id(&self) -> &'static str {
        "not-equal-style"
    }

    fn name(&self) -> &'static str {
        "Not-equal operator style"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        ctx.code()
            .windows(2)
            .filter(|w| w[0].is_symbol('!') && w[1].is_symbol('=') && w[1].start == w[0].end)
            .map(|w| {
                Diagnostic::warning(self.id(), "Use <> instead of != for not-equal comparisons")
                    .with_span(Span::new(w[0].start, w[1].end))
            })
            .collect()
    }
}

/// `WITH (NOLOCK)` does nothing for a query activity
pub struct RedundantNolock;

impl Rule for RedundantNolock {
    fn id(&self) -> &'static str {
        "nolock"
    }

    fn name(&self) -> &'static str {
        "Redundant NOLOCK hint"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        code.windows(4)
            .enumerate()
            .filter(|(_, w)| {
                w[0].is_keyword("WITH")
                    && w[1].is_symbol('(')
                    && w[2].is_keyword("NOLOCK")
                    && w[3].is_symbol(')')
            })
            .map(|(i, _)| {
                Diagnostic::warning(self.id(), "WITH (NOLOCK) is redundant in MCE SQL")
                    .with_span(span_between(code, i, i + 3))
                    .with_help("Query activities already read without locking; remove the hint.")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use crate::rules::test_support::{check, flagged};

    #[test]
    fn test_empty_in() {
        let sql = "SELECT a FROM T WHERE a IN ( )";
        assert_eq!(flagged(sql, &check(&EmptyInClause, sql)), vec!["IN ( )"]);
        assert!(check(&EmptyInClause, "SELECT a FROM T WHERE a IN (1)").is_empty());
    }

    #[test]
    fn test_variables() {
        let sql = "SELECT a FROM T WHERE a = @id AND b = @@ROWCOUNT";
        let diagnostics = check(&VariableUsage, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["@id", "@@ROWCOUNT"]);
    }

    #[test]
    fn test_at_sign_in_string_is_not_a_variable() {
        assert!(check(&VariableUsage, "SELECT a FROM T WHERE e LIKE '%@x.com'").is_empty());
    }

    #[test]
    fn test_trailing_semicolon() {
        let diagnostics = check(&TrailingSemicolon, "SELECT 1 AS a;  ");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(check(&TrailingSemicolon, "SELECT 1 AS a").is_empty());
    }

    #[test]
    fn test_multiple_statements() {
        let sql = "SELECT 1 AS a; SELECT 2 AS b";
        let diagnostics = check(&MultipleStatements, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["; SELECT"]);
        assert!(check(&MultipleStatements, "SELECT 1 AS a;").is_empty());
    }

    #[test]
    fn test_not_equal() {
        let sql = "SELECT a FROM T WHERE a != 1 AND b <> 2";
        assert_eq!(flagged(sql, &check(&NotEqualStyle, sql)), vec!["!="]);
    }

    #[test]
    fn test_nolock() {
        let sql = "SELECT a FROM T WITH (NOLOCK)";
        let diagnostics = check(&RedundantNolock, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["WITH (NOLOCK)"]);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }
}
