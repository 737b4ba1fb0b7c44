//! Lint orchestrator - runs every rule over one shared context

mod context;
mod rule;

use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

pub use context::LintContext;
pub use rule::Rule;

use crate::config::LintConfig;
use crate::error::Diagnostic;
use crate::rules;
use crate::schema::SchemaCatalog;

/// Optional inputs to a lint run
#[derive(Debug, Clone, Copy, Default)]
pub struct LintOptions<'a> {
    pub schema: Option<&'a SchemaCatalog>,
    pub cursor_offset: Option<usize>,
}

impl<'a> LintOptions<'a> {
    pub fn with_schema(mut self, schema: &'a SchemaCatalog) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_cursor(mut self, offset: usize) -> Self {
        self.cursor_offset = Some(offset);
        self
    }
}

/// A rule that panicked during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFailure {
    pub rule_id: &'static str,
    pub cause: String,
}

/// Diagnostics from one run plus the rules that failed to produce any
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub diagnostics: Vec<Diagnostic>,
    pub failed_rules: Vec<RuleFailure>,
}

/// The synchronous lint pass
pub struct Linter {
    rules: Vec<Box<dyn Rule>>,
    config: LintConfig,
}

impl Linter {
    pub fn new(config: LintConfig) -> Self {
        Self::with_rules(rules::all_rules(), config)
    }

    pub fn with_rules(rules: Vec<Box<dyn Rule>>, config: LintConfig) -> Self {
        Self { rules, config }
    }

    /// Enabled rules, in run order
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules
            .iter()
            .map(|rule| rule.as_ref())
            .filter(|rule| self.config.is_rule_enabled(rule.id()))
    }

    /// Lint `sql` and return the concatenated diagnostics of every rule
    pub fn lint(&self, sql: &str, options: &LintOptions<'_>) -> Vec<Diagnostic> {
        self.lint_report(sql, options).diagnostics
    }

    /// Lint `sql`, isolating rule panics
    ///
    /// A rule that panics contributes no diagnostics and is listed in
    /// [`LintReport::failed_rules`]; every other rule still runs.
    pub fn lint_report(&self, sql: &str, options: &LintOptions<'_>) -> LintReport {
        let ctx = LintContext::new(sql, options.schema, options.cursor_offset);
        let mut report = LintReport::default();

        for rule in self.rules() {
            match panic::catch_unwind(AssertUnwindSafe(|| rule.check(&ctx))) {
                Ok(diagnostics) => {
                    tracing::trace!(rule = rule.id(), count = diagnostics.len(), "rule finished");
                    report
                        .diagnostics
                        .extend(diagnostics.into_iter().map(|d| clamp(d, sql.len())));
                }
                Err(payload) => {
                    let cause = panic_message(payload.as_ref());
                    tracing::warn!(rule = rule.id(), %cause, "lint rule failed");
                    report.failed_rules.push(RuleFailure {
                        rule_id: rule.id(),
                        cause,
                    });
                }
            }
        }

        report
    }
}

impl Default for Linter {
    fn default() -> Self {
        Self::new(LintConfig::default())
    }
}

/// Lint with every rule enabled
pub fn lint(sql: &str, options: &LintOptions<'_>) -> Vec<Diagnostic> {
    Linter::default().lint(sql, options)
}

fn clamp(mut diagnostic: Diagnostic, len: usize) -> Diagnostic {
    diagnostic.span = diagnostic.span.clamp_to(len);
    diagnostic
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exploding;

    impl Rule for Exploding {
        fn id(&self) -> &'static str {
            "exploding"
        }

        fn name(&self) -> &'static str {
            "Always panics"
        }

        fn check(&self, _ctx: &LintContext<'_>) -> Vec<Diagnostic> {
            panic!("boom")
        }
    }

    struct OutOfRange;

    impl Rule for OutOfRange {
        fn id(&self) -> &'static str {
            "out-of-range"
        }

        fn name(&self) -> &'static str {
            "Reports past the end"
        }

        fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
            vec![Diagnostic::warning(self.id(), "far away")
                .with_span(crate::error::Span::new(0, ctx.sql.len() + 10))]
        }
    }

    #[test]
    fn test_failing_rule_is_isolated() {
        let linter = Linter::with_rules(
            vec![Box::new(Exploding), Box::new(OutOfRange)],
            LintConfig::default(),
        );
        let report = linter.lint_report("SELECT 1", &LintOptions::default());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.failed_rules.len(), 1);
        assert_eq!(report.failed_rules[0].rule_id, "exploding");
        assert_eq!(report.failed_rules[0].cause, "boom");
    }

    #[test]
    fn test_spans_are_clamped() {
        let linter = Linter::with_rules(vec![Box::new(OutOfRange)], LintConfig::default());
        let diags = linter.lint("abc", &LintOptions::default());
        assert_eq!(diags[0].span.end, 3);
    }

    #[test]
    fn test_disabled_rules_do_not_run() {
        let linter = Linter::with_rules(
            vec![Box::new(Exploding)],
            LintConfig {
                disabled_rules: vec!["exploding".to_string()],
            },
        );
        let report = linter.lint_report("SELECT 1", &LintOptions::default());
        assert!(report.failed_rules.is_empty());
        assert_eq!(linter.rules().count(), 0);
    }
}
