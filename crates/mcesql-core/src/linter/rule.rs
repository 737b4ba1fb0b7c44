//! Lint rule trait

use super::context::LintContext;
use crate::error::Diagnostic;

/// A single, stateless validation over one lint context.
///
/// Rules never see each other's output; the order they run in only affects
/// the order of the unsorted diagnostic list.
pub trait Rule: Send + Sync {
    /// Stable kebab-case id (e.g., "missing-join-on").
    fn id(&self) -> &'static str;

    /// Short human-readable name.
    fn name(&self) -> &'static str;

    /// Check the context and return any diagnostics found.
    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic>;
}
