//! Shape checks for an unfinished query
//!
//! These report what is still missing (a SELECT, a select list, a FROM)
//! as prerequisites rather than errors, so the editor can explain the
//! block without calling the text wrong.

use super::span_of_range;
use crate::dialect::SET_OPERATORS;
use crate::error::{Diagnostic, Span};
use crate::linter::{LintContext, Rule};
use crate::query::{is_literal, is_star, references_columns, select_items, text_of, SelectScope};

pub struct SelectPrerequisites;

impl Rule for SelectPrerequisites {
    fn id(&self) -> &'static str {
        "select-prerequisites"
    }

    fn name(&self) -> &'static str {
        "SELECT prerequisites"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let Some(first) = code.first() else {
            return vec![Diagnostic::prereq(self.id(), "Query is empty: start with SELECT")
                .with_span(Span::point(0))];
        };
        if ctx.scopes().is_empty() {
            return vec![
                Diagnostic::prereq(self.id(), "Query must contain a SELECT statement")
                    .with_span(first.span()),
            ];
        }

        let mut diagnostics = Vec::new();
        for scope in ctx.scopes().iter().filter(|s| s.depth == 0) {
            diagnostics.extend(self.check_scope(ctx, scope));
        }
        diagnostics
    }
}

impl SelectPrerequisites {
    fn check_scope(&self, ctx: &LintContext<'_>, scope: &SelectScope) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        let items = select_items(code, scope);
        if items.is_empty() {
            diagnostics.push(
                Diagnostic::prereq(self.id(), "SELECT needs at least one column")
                    .with_span(code[scope.select].span()),
            );
            return diagnostics;
        }

        // later branches of a UNION take their column names from the first
        let names_columns = scope.select == 0
            || !(code[scope.select - 1].is_any_keyword(SET_OPERATORS)
                || code[scope.select - 1].is_keyword("ALL"));
        if names_columns {
            for item in items.iter().filter(|item| item.alias.is_none()) {
                if is_literal(code, item.expr.clone()) {
                    let text = text_of(ctx.sql, code, item.expr.clone());
                    diagnostics.push(
                        Diagnostic::error(self.id(), format!("Literal value {text} needs a column alias"))
                            .with_span(span_of_range(ctx, item.expr.clone()))
                            .with_help(format!("Name the column, e.g. {text} AS FieldName")),
                    );
                }
            }
        }

        match &scope.from {
            None => {
                let needs_from = items.iter().any(|item| {
                    is_star(code, item.expr.clone())
                        || (!is_literal(code, item.expr.clone())
                            && references_columns(code, item.expr.clone()))
                });
                if needs_from {
                    diagnostics.push(
                        Diagnostic::prereq(self.id(), "Add a FROM clause to select columns")
                            .with_span(span_of_range(ctx, scope.select_list.clone())),
                    );
                }
            }
            Some(from) => {
                let has_table = ctx.refs_in_scope(scope).any(|r| r.keyword == from.keyword);
                if !has_table {
                    diagnostics.push(
                        Diagnostic::prereq(self.id(), "FROM clause needs a table name")
                            .with_span(code[from.keyword].span()),
                    );
                }
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use crate::rules::test_support::{check, flagged};

    fn severities(sql: &str) -> Vec<Severity> {
        check(&SelectPrerequisites, sql).iter().map(|d| d.severity).collect()
    }

    #[test]
    fn test_empty_text() {
        let diagnostics = check(&SelectPrerequisites, "   \n ");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Prereq);
        assert_eq!(diagnostics[0].span, Span::point(0));
    }

    #[test]
    fn test_missing_select() {
        let sql = "UPDATE Contacts SET a = 1";
        let diagnostics = check(&SelectPrerequisites, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["UPDATE"]);
        assert_eq!(diagnostics[0].severity, Severity::Prereq);
    }

    #[test]
    fn test_bare_select() {
        assert_eq!(severities("SELECT"), vec![Severity::Prereq]);
        assert_eq!(severities("SELECT DISTINCT TOP 10"), vec![Severity::Prereq]);
    }

    #[test]
    fn test_literal_without_alias() {
        let sql = "SELECT 'x', 1 AS n";
        let diagnostics = check(&SelectPrerequisites, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["'x'"]);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_union_branch_literal_is_fine() {
        assert!(check(&SelectPrerequisites, "SELECT 1 AS n UNION ALL SELECT 2").is_empty());
    }

    #[test]
    fn test_columns_need_from() {
        let sql = "SELECT FirstName, LastName";
        let diagnostics = check(&SelectPrerequisites, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["FirstName, LastName"]);
        assert_eq!(diagnostics[0].severity, Severity::Prereq);
        assert!(check(&SelectPrerequisites, "SELECT GETDATE() AS Now").is_empty());
    }

    #[test]
    fn test_from_without_table() {
        let sql = "SELECT a FROM ";
        let diagnostics = check(&SelectPrerequisites, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["FROM"]);
        assert!(check(&SelectPrerequisites, "SELECT a FROM Contacts").is_empty());
    }
}
