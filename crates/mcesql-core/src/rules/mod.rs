//! Rule set
//!
//! Every rule is a unit struct implementing [`Rule`]. Rules read the shared
//! [`LintContext`] (tokens, scopes, table references, schema) and never
//! re-scan the raw text themselves.

mod aggregates;
mod aliases;
mod ambiguous;
mod commas;
mod cte;
mod functions;
mod joins;
mod keywords;
mod limit;
mod names;
mod offset;
mod prerequisites;
mod style;
mod subqueries;
mod wildcards;

use std::ops::Range;

use crate::error::Span;
use crate::linter::{LintContext, Rule};
use crate::query::subquery_spans;
use crate::scanner::Token;

pub use aggregates::{AggregateGrouping, AggregateInWhere};
pub use aliases::{AliasInRestrictedClause, DuplicateAlias};
pub use ambiguous::AmbiguousFields;
pub use commas::CommaValidation;
pub use cte::CteDetection;
pub use functions::UnsupportedFunctions;
pub use joins::{MissingJoinOn, SelfJoinSameAlias};
pub use keywords::ProhibitedKeywords;
pub use limit::LimitProhibition;
pub use names::UnbracketedMultiWordNames;
pub use offset::OffsetWithoutOrderBy;
pub use prerequisites::SelectPrerequisites;
pub use style::{
    EmptyInClause, MultipleStatements, NotEqualStyle, RedundantNolock, TrailingSemicolon,
    VariableUsage,
};
pub use subqueries::{NotInSubquery, SubqueryOrderBy, SubqueryWithoutAlias};
pub use wildcards::{SelectStarSingleTable, SelectStarWithJoin};

/// Every built-in rule, in run order
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(SelectPrerequisites),
        Box::new(ProhibitedKeywords),
        Box::new(CteDetection),
        Box::new(LimitProhibition),
        Box::new(OffsetWithoutOrderBy),
        Box::new(UnsupportedFunctions),
        Box::new(CommaValidation),
        Box::new(AliasInRestrictedClause),
        Box::new(DuplicateAlias),
        Box::new(AmbiguousFields),
        Box::new(AggregateGrouping),
        Box::new(AggregateInWhere),
        Box::new(SelfJoinSameAlias),
        Box::new(MissingJoinOn),
        Box::new(SubqueryOrderBy),
        Box::new(SubqueryWithoutAlias),
        Box::new(UnbracketedMultiWordNames),
        Box::new(EmptyInClause),
        Box::new(VariableUsage),
        Box::new(TrailingSemicolon),
        Box::new(MultipleStatements),
        Box::new(NotEqualStyle),
        Box::new(RedundantNolock),
        Box::new(SelectStarWithJoin),
        Box::new(SelectStarSingleTable),
        Box::new(NotInSubquery),
    ]
}

/// Token at `index` is the member part of `a.b`
fn is_qualified(code: &[Token<'_>], index: usize) -> bool {
    index > 0 && code[index - 1].is_symbol('.')
}

/// Token at `index` is a qualifier, as `a` in `a.b`
fn is_qualifier(code: &[Token<'_>], index: usize) -> bool {
    code.get(index + 1).is_some_and(|t| t.is_symbol('.'))
}

/// Span from the start of token `from` to the end of token `to`
fn span_between(code: &[Token<'_>], from: usize, to: usize) -> Span {
    Span::new(code[from].start, code[to].end)
}

/// Span of a token range; empty ranges yield a point at the next token
fn span_of_range(ctx: &LintContext<'_>, range: Range<usize>) -> Span {
    let code = ctx.code();
    if range.start < range.end {
        span_between(code, range.start, range.end - 1)
    } else {
        Span::point(code.get(range.start).map_or(ctx.sql.len(), |t| t.start))
    }
}

/// Subqueries strictly inside `range`, so callers can skip their tokens
fn nested_subqueries(code: &[Token<'_>], range: &Range<usize>) -> Vec<Range<usize>> {
    subquery_spans(code)
        .into_iter()
        .filter(|span| span.start >= range.start && span.start < range.end)
        .collect()
}

fn inside_any(spans: &[Range<usize>], index: usize) -> bool {
    spans.iter().any(|span| span.contains(&index))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::error::Diagnostic;
    use crate::linter::{LintContext, Rule};
    use crate::schema::SchemaCatalog;

    pub fn check(rule: &dyn Rule, sql: &str) -> Vec<Diagnostic> {
        rule.check(&LintContext::new(sql, None, None))
    }

    pub fn check_with_schema(rule: &dyn Rule, sql: &str, schema: &SchemaCatalog) -> Vec<Diagnostic> {
        rule.check(&LintContext::new(sql, Some(schema), None))
    }

    pub fn check_at_cursor(rule: &dyn Rule, sql: &str, cursor: usize) -> Vec<Diagnostic> {
        rule.check(&LintContext::new(sql, None, Some(cursor)))
    }

    /// Source text under each diagnostic
    pub fn flagged<'a>(sql: &'a str, diagnostics: &[Diagnostic]) -> Vec<&'a str> {
        diagnostics
            .iter()
            .map(|d| &sql[d.span.start..d.span.end])
            .collect()
    }
}
