//! Aggregate placement rules

use super::{inside_any, nested_subqueries, span_of_range};
use crate::dialect::WHERE_AGGREGATES;
use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};
use crate::query::{
    find_aggregate, is_function_call, is_literal, is_star, references_columns, select_items,
    text_of,
};

/// Non-aggregated select items missing from GROUP BY
///
/// Matching is textual: an item passes when its normalized text (or its
/// unqualified column name) appears in the normalized GROUP BY text.
pub struct AggregateGrouping;

impl Rule for AggregateGrouping {
    fn id(&self) -> &'static str {
        "aggregate-grouping"
    }

    fn name(&self) -> &'static str {
        "Aggregate without GROUP BY"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for scope in ctx.scopes() {
            let items = select_items(code, scope);
            if !items.iter().any(|item| find_aggregate(code, item.expr.clone()).is_some()) {
                continue;
            }
            let grouped = scope
                .group_by
                .as_ref()
                .map(|clause| normalize(text_of(ctx.sql, code, clause.body.clone())))
                .unwrap_or_default();

            for item in &items {
                let expr = item.expr.clone();
                if expr.is_empty()
                    || find_aggregate(code, expr.clone()).is_some()
                    || is_star(code, expr.clone())
                    || is_literal(code, expr.clone())
                    || !references_columns(code, expr.clone())
                    || code[expr.start].is_symbol('(')
                {
                    continue;
                }

                let text = text_of(ctx.sql, code, expr.clone());
                let normalized = normalize(text);
                let column = normalized.rsplit('.').next().unwrap_or(normalized.as_str());
                if !grouped.is_empty() && (grouped.contains(&normalized) || grouped.contains(column)) {
                    continue;
                }

                diagnostics.push(
                    Diagnostic::error(
                        self.id(),
                        format!("'{text}' must appear in GROUP BY or be used in an aggregate function"),
                    )
                    .with_span(span_of_range(ctx, expr)),
                );
            }
        }

        diagnostics
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '[' | ']' | '"'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// COUNT, SUM, AVG, MIN or MAX inside WHERE
pub struct AggregateInWhere;

impl Rule for AggregateInWhere {
    fn id(&self) -> &'static str {
        "aggregate-in-where"
    }

    fn name(&self) -> &'static str {
        "Aggregate in WHERE"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for scope in ctx.scopes() {
            let Some(clause) = &scope.where_clause else {
                continue;
            };
            let nested = nested_subqueries(code, &clause.body);
            for i in clause.body.clone() {
                let token = &code[i];
                if inside_any(&nested, i)
                    || !token.is_any_keyword(WHERE_AGGREGATES)
                    || !is_function_call(code, i)
                {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::error(
                        self.id(),
                        format!("Aggregate {}() cannot be used in WHERE", token.upper()),
                    )
                    .with_span(token.span())
                    .with_help("Move the condition to a HAVING clause."),
                );
            }
        }

        diagnostics
    }
}
