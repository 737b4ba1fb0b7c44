use super::{inside_any, is_qualified, is_qualifier, nested_subqueries};
use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};
use crate::query::{is_column_word, select_items};

/// An unqualified select-list field present in more than one joined table
///
/// Needs schema metadata for at least two tables of the same SELECT.
pub struct AmbiguousFields;

impl Rule for AmbiguousFields {
    fn id(&self) -> &'static str {
        "ambiguous-field"
    }

    fn name(&self) -> &'static str {
        "Ambiguous field"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let Some(schema) = ctx.schema else {
            return Vec::new();
        };
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for scope in ctx.scopes() {
            let resolved: Vec<_> = ctx
                .refs_in_scope(scope)
                .filter(|r| !r.is_subquery)
                .filter_map(|r| schema.find(&r.name).map(|table| (r, table)))
                .collect();
            if resolved.len() < 2 {
                continue;
            }

            let nested = nested_subqueries(code, &scope.select_list);
            for item in select_items(code, scope) {
                for i in item.expr {
                    if inside_any(&nested, i)
                        || !is_column_word(code, i)
                        || is_qualified(code, i)
                        || is_qualifier(code, i)
                    {
                        continue;
                    }
                    let field = code[i].ident_value();
                    let owners: Vec<_> = resolved
                        .iter()
                        .filter(|(_, table)| table.has_field(&field))
                        .collect();
                    if owners.len() < 2 {
                        continue;
                    }

                    let names: Vec<String> = owners.iter().map(|(r, _)| r.exposed_name()).collect();
                    diagnostics.push(
                        Diagnostic::error(
                            self.id(),
                            format!("Field '{}' is ambiguous: it exists in {}", field, names.join(" and ")),
                        )
                        .with_span(code[i].span())
                        .with_help(format!("Qualify the field, e.g. {}.{}", names[0], field)),
                    );
                }
            }
        }

        diagnostics
    }
}
