//! Subquery rules

use super::{is_qualified, span_between};
use crate::error::{Diagnostic, Span};
use crate::linter::{LintContext, Rule};

/// ORDER BY inside a subquery without TOP or OFFSET
pub struct SubqueryOrderBy;

impl Rule for SubqueryOrderBy {
    fn id(&self) -> &'static str {
        "subquery-order-by"
    }

    fn name(&self) -> &'static str {
        "ORDER BY in subquery"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for scope in ctx.scopes() {
            let in_parens = scope.select > 0 && code[scope.select - 1].is_symbol('(');
            let Some(order_by) = scope.order_by.as_ref().filter(|_| scope.depth > 0 && in_parens)
            else {
                continue;
            };
            let limited = code[scope.select..scope.end]
                .iter()
                .any(|t| t.depth == scope.depth && (t.is_keyword("TOP") || t.is_keyword("OFFSET")));
            if limited {
                continue;
            }
            diagnostics.push(
                Diagnostic::error(self.id(), "ORDER BY in a subquery requires TOP or OFFSET")
                    .with_span(span_between(code, order_by.keyword, order_by.keyword + 1))
                    .with_help("Remove the ORDER BY, or add TOP to the subquery."),
            );
        }

        diagnostics
    }
}

/// A derived table in FROM or JOIN without an alias
pub struct SubqueryWithoutAlias;

impl Rule for SubqueryWithoutAlias {
    fn id(&self) -> &'static str {
        "subquery-alias"
    }

    fn name(&self) -> &'static str {
        "Subquery without alias"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        ctx.table_refs()
            .iter()
            .filter(|r| r.is_subquery && r.alias.is_none())
            // unterminated subqueries are still being typed
            .filter(|r| ctx.sql[..r.span.end].ends_with(')'))
            .map(|r| {
                Diagnostic::error(self.id(), "Subquery in FROM must have an alias")
                    .with_span(Span::new(r.span.end - 1, r.span.end))
                    .with_help("Add an alias after the closing parenthesis, e.g. ) AS sub")
            })
            .collect()
    }
}

/// `NOT IN (SELECT ...)` silently returns nothing when the subquery yields NULL
pub struct NotInSubquery;

impl Rule for NotInSubquery {
    fn id(&self) -> &'static str {
        "not-in-subquery"
    }

    fn name(&self) -> &'static str {
        "NOT IN with subquery"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for (i, token) in code.iter().enumerate() {
            let matches = token.is_keyword("NOT")
                && !is_qualified(code, i)
                && code.get(i + 1).is_some_and(|t| t.is_keyword("IN"))
                && code.get(i + 2).is_some_and(|t| t.is_symbol('('))
                && code.get(i + 3).is_some_and(|t| t.is_keyword("SELECT"));
            if matches {
                diagnostics.push(
                    Diagnostic::warning(
                        self.id(),
                        "NOT IN with a subquery returns no rows if the subquery returns a NULL",
                    )
                    .with_span(span_between(code, i, i + 1))
                    .with_help("Use NOT EXISTS with a correlated subquery instead."),
                );
            }
        }

        diagnostics
    }
}
