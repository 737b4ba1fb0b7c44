use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{Diagnostic, Severity};

/// Phrases that mark a deep-parse error as a dialect policy violation
/// rather than generic parser noise
const POLICY_PHRASES: &[&str] = &[
    "not supported",
    "not allowed",
    "prohibited",
    "read-only",
    "use top",
];

/// Combine synchronous and deep-parse diagnostics into the final list
///
/// While the synchronous pass reports a prerequisite, deep-parse errors are
/// dropped unless they describe a policy violation. The result is
/// deduplicated on `(severity, start, end, message)` and sorted by start,
/// severity priority, then longer spans first.
pub fn merge_diagnostics(
    sync_diagnostics: &[Diagnostic],
    async_diagnostics: &[Diagnostic],
) -> Vec<Diagnostic> {
    let incomplete = sync_diagnostics.iter().any(|d| d.severity == Severity::Prereq);
    let deep = async_diagnostics.iter().filter(|d| {
        !(incomplete && d.severity == Severity::Error && !is_policy_violation(&d.message))
    });

    let mut seen = HashSet::new();
    let mut merged: Vec<Diagnostic> = sync_diagnostics
        .iter()
        .chain(deep)
        .filter(|d| seen.insert((d.severity, d.span.start, d.span.end, d.message.clone())))
        .cloned()
        .collect();

    merged.sort_by(compare);
    merged
}

fn is_policy_violation(message: &str) -> bool {
    let lower = message.to_lowercase();
    POLICY_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

fn compare(a: &Diagnostic, b: &Diagnostic) -> Ordering {
    a.span
        .start
        .cmp(&b.span.start)
        .then_with(|| a.severity.priority().cmp(&b.severity.priority()))
        .then_with(|| b.span.end.cmp(&a.span.end))
        .then_with(|| a.sort_hint.unwrap_or(0).cmp(&b.sort_hint.unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Span;
    use pretty_assertions::assert_eq;

    fn at(d: Diagnostic, start: usize, end: usize) -> Diagnostic {
        d.with_span(Span::new(start, end))
    }

    #[test]
    fn test_sort_order() {
        let merged = merge_diagnostics(
            &[
                at(Diagnostic::warning("b", "w"), 5, 6),
                at(Diagnostic::prereq("c", "p"), 0, 1),
                at(Diagnostic::error("a", "short"), 5, 6),
                at(Diagnostic::error("a", "long"), 5, 10),
            ],
            &[],
        );
        let order: Vec<&str> = merged.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(order, vec!["p", "long", "short", "w"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let sync = [at(Diagnostic::error("limit", "LIMIT is not supported in MCE SQL"), 16, 21)];
        let deep = [at(Diagnostic::error("deep-parse", "LIMIT is not supported in MCE SQL"), 16, 21)];
        let merged = merge_diagnostics(&sync, &deep);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].rule_id, "limit");
    }

    #[test]
    fn test_prereq_suppresses_parser_noise() {
        let sync = [at(Diagnostic::prereq("select-prerequisites", "FROM clause needs a table name"), 9, 13)];
        let deep = [
            at(Diagnostic::error("deep-parse", "Syntax error: Expected: identifier, found: EOF"), 13, 13),
            at(Diagnostic::error("deep-parse", "LIMIT is not supported in MCE SQL"), 0, 5),
            at(Diagnostic::warning("deep-parse", "advisory"), 0, 1),
        ];
        let merged = merge_diagnostics(&sync, &deep);
        let messages: Vec<&str> = merged.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["LIMIT is not supported in MCE SQL", "advisory", "FROM clause needs a table name"]
        );
    }

    #[test]
    fn test_no_suppression_without_prereq() {
        let deep = [at(Diagnostic::error("deep-parse", "Syntax error: x"), 0, 1)];
        assert_eq!(merge_diagnostics(&[], &deep).len(), 1);
    }

    #[test]
    fn test_sort_hint_breaks_ties() {
        let merged = merge_diagnostics(
            &[
                at(Diagnostic::error("a", "second"), 0, 1).with_sort_hint(2),
                at(Diagnostic::error("a", "first"), 0, 1).with_sort_hint(1),
            ],
            &[],
        );
        assert_eq!(merged[0].message, "first");
    }
}
