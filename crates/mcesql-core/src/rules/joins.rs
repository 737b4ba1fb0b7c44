//! Join rules

use super::{is_qualified, span_between};
use crate::dialect::{JOIN_WORDS, SET_OPERATORS};
use crate::error::Diagnostic;
use crate::linter::{LintContext, Rule};

/// Keywords that end the table part of a join when no ON was seen
const JOIN_TERMINATORS: &[&str] = &["WHERE", "GROUP", "ORDER", "HAVING", "OPTION", "SELECT"];

/// The same table joined twice without telling the copies apart
pub struct SelfJoinSameAlias;

impl Rule for SelfJoinSameAlias {
    fn id(&self) -> &'static str {
        "self-join-alias"
    }

    fn name(&self) -> &'static str {
        "Self-join without distinct aliases"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for scope in ctx.scopes() {
            let refs: Vec<_> = ctx.refs_in_scope(scope).filter(|r| !r.is_subquery).collect();
            for (n, later) in refs.iter().enumerate() {
                let clash = refs[..n].iter().any(|earlier| {
                    earlier.normalized_name() == later.normalized_name()
                        && match (&earlier.alias, &later.alias) {
                            (None, None) => true,
                            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                            _ => false,
                        }
                });
                if clash {
                    diagnostics.push(
                        Diagnostic::error(
                            self.id(),
                            format!(
                                "Table '{}' is referenced more than once without distinct aliases",
                                later.name
                            ),
                        )
                        .with_span(later.span)
                        .with_help("Give each copy of the table its own alias."),
                    );
                }
            }
        }

        diagnostics
    }
}

/// JOIN with no ON condition
///
/// `CROSS JOIN` is exempt. While the cursor sits after an unfinished join
/// at the end of the text the diagnostic is held back.
pub struct MissingJoinOn;

impl Rule for MissingJoinOn {
    fn id(&self) -> &'static str {
        "missing-join-on"
    }

    fn name(&self) -> &'static str {
        "JOIN without ON"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for (i, join) in code.iter().enumerate() {
            if !join.is_keyword("JOIN") || is_qualified(code, i) {
                continue;
            }

            let mut start = i;
            while start > 0
                && code[start - 1].depth == join.depth
                && code[start - 1].is_any_keyword(JOIN_WORDS)
                && !code[start - 1].is_keyword("JOIN")
            {
                start -= 1;
            }
            if code[start..i].iter().any(|t| t.is_keyword("CROSS")) {
                continue;
            }

            let mut has_on = false;
            let mut j = i + 1;
            while j < code.len() {
                let t = &code[j];
                if t.depth < join.depth {
                    break;
                }
                if t.depth == join.depth {
                    if t.is_keyword("ON") {
                        has_on = true;
                        break;
                    }
                    if t.is_any_keyword(JOIN_WORDS)
                        || t.is_any_keyword(JOIN_TERMINATORS)
                        || t.is_any_keyword(SET_OPERATORS)
                        || t.is_symbol(';')
                    {
                        break;
                    }
                }
                j += 1;
            }
            if has_on {
                continue;
            }

            let still_typing = j == code.len()
                && ctx
                    .cursor_offset
                    .is_some_and(|cursor| cursor >= join.end && rest_is_blank(ctx.sql, cursor));
            if still_typing {
                continue;
            }

            let join_text = code[start..=i]
                .iter()
                .map(|t| t.upper())
                .collect::<Vec<_>>()
                .join(" ");
            diagnostics.push(
                Diagnostic::error(self.id(), format!("{join_text} is missing an ON clause"))
                    .with_span(span_between(code, start, i))
                    .with_help("Add ON <condition>, or use CROSS JOIN for a cartesian product."),
            );
        }

        diagnostics
    }
}

fn rest_is_blank(sql: &str, cursor: usize) -> bool {
    sql.get(cursor..).is_some_and(|rest| rest.trim().is_empty())
}
