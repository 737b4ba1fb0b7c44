//! Column and table alias rules

use std::collections::HashSet;

use super::{inside_any, is_qualified, is_qualifier, nested_subqueries};
use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};
use crate::query::{is_column_word, select_items, SelectScope};
use crate::scanner::Token;

/// A select-list alias used in WHERE, GROUP BY, HAVING or ORDER BY
///
/// An alias that equals a column of the same item (`Email AS Email`), a
/// table alias, or a field of a source table resolves to that column and
/// is not flagged.
pub struct AliasInRestrictedClause;

impl Rule for AliasInRestrictedClause {
    fn id(&self) -> &'static str {
        "alias-in-clause"
    }

    fn name(&self) -> &'static str {
        "Alias in restricted clause"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for scope in ctx.scopes() {
            let aliases = column_aliases(ctx, scope);
            if aliases.is_empty() {
                continue;
            }

            for (clause_name, clause) in scope.restricted_clauses() {
                let nested = nested_subqueries(code, &clause.body);
                for i in clause.body.clone() {
                    if inside_any(&nested, i)
                        || !is_column_word(code, i)
                        || is_qualified(code, i)
                        || is_qualifier(code, i)
                    {
                        continue;
                    }
                    let value = code[i].ident_value();
                    if !aliases.contains(&value.to_lowercase()) {
                        continue;
                    }
                    diagnostics.push(
                        Diagnostic::error(
                            self.id(),
                            format!("Column alias '{value}' cannot be used in {clause_name}"),
                        )
                        .with_span(code[i].span())
                        .with_help(
                            "Repeat the expression, or wrap the query in a subquery and use the alias outside it.",
                        ),
                    );
                }
            }
        }

        diagnostics
    }
}

/// Lowercased aliases that do not shadow a column or table name
fn column_aliases(ctx: &LintContext<'_>, scope: &SelectScope) -> HashSet<String> {
    let code = ctx.code();
    let table_names: HashSet<String> = ctx
        .refs_in_scope(scope)
        .map(|r| r.exposed_name().to_lowercase())
        .collect();
    let source_tables: Vec<_> = match ctx.schema {
        Some(schema) => ctx
            .refs_in_scope(scope)
            .filter(|r| !r.is_subquery)
            .filter_map(|r| schema.find(&r.name))
            .collect(),
        None => Vec::new(),
    };

    select_items(code, scope)
        .into_iter()
        .filter_map(|item| {
            let alias = item.alias?;
            if code[alias].is_string() {
                return None;
            }
            let name = code[alias].ident_value();
            let shadows_column = item
                .expr
                .clone()
                .any(|i| is_column_word(code, i) && code[i].ident_value().eq_ignore_ascii_case(&name));
            let is_field = source_tables.iter().any(|t| t.has_field(&name));
            let lower = name.to_lowercase();
            (!shadows_column && !is_field && !table_names.contains(&lower)).then_some(lower)
        })
        .collect()
}

/// The same alias given twice within one SELECT
pub struct DuplicateAlias;

impl Rule for DuplicateAlias {
    fn id(&self) -> &'static str {
        "duplicate-alias"
    }

    fn name(&self) -> &'static str {
        "Duplicate alias"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for scope in ctx.scopes() {
            let mut seen = HashSet::new();
            for item in select_items(code, scope) {
                let Some(alias) = item.alias else {
                    continue;
                };
                let name = alias_name(&code[alias]);
                if !seen.insert(name.to_lowercase()) {
                    diagnostics.push(
                        Diagnostic::error(self.id(), format!("Duplicate column alias '{name}'"))
                            .with_span(code[alias].span()),
                    );
                }
            }

            let mut seen = HashSet::new();
            for reference in ctx.refs_in_scope(scope) {
                let Some(alias) = &reference.alias else {
                    continue;
                };
                if !seen.insert(alias.to_lowercase()) {
                    diagnostics.push(
                        Diagnostic::error(self.id(), format!("Duplicate table alias '{alias}'"))
                            .with_span(reference.span)
                            .with_help("Give each table in the FROM clause its own alias."),
                    );
                }
            }
        }

        diagnostics
    }
}

fn alias_name(token: &Token<'_>) -> String {
    if token.is_string() {
        token.text.trim_matches('\'').replace("''", "'")
    } else {
        token.ident_value()
    }
}
