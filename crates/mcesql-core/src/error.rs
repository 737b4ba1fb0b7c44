//! Error and diagnostic types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Half-open byte range `[start, end)` into the linted text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    #[serde(rename = "startOffset")]
    pub start: usize,
    #[serde(rename = "endOffset")]
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Zero-width span at `offset`
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Clamp both ends into `0..=len`
    pub fn clamp_to(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(span.start.into(), span.len())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Confirmed dialect violation; blocks save/publish
    Error,
    /// Style or performance advisory; never blocks
    Warning,
    /// The statement is not complete yet; blocks, but is explained differently
    Prereq,
}

impl Severity {
    /// Rank used when ordering diagnostics that start at the same offset
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Prereq => 2,
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Error | Severity::Prereq)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Prereq => "prereq",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic produced by a lint rule or the deep-parse worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Id of the rule that produced this diagnostic
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_hint: Option<i32>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, rule_id: &str, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
            span: Span::default(),
            help: None,
            sort_hint: None,
        }
    }

    pub fn error(rule_id: &str, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, rule_id, message)
    }

    pub fn warning(rule_id: &str, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, rule_id, message)
    }

    pub fn prereq(rule_id: &str, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Prereq, rule_id, message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_sort_hint(mut self, hint: i32) -> Self {
        self.sort_hint = Some(hint);
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

/// Does the list contain anything that should block saving or publishing?
pub fn has_blocking_diagnostics(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_blocking)
}

/// First diagnostic in list order with severity `error` or `prereq`
pub fn first_blocking_diagnostic(diagnostics: &[Diagnostic]) -> Option<&Diagnostic> {
    diagnostics.iter().find(|d| d.is_blocking())
}

/// Failures talking to the deep-parse worker
#[derive(Debug, Error, miette::Diagnostic)]
pub enum WorkerError {
    #[error("deep-parse worker is no longer running")]
    #[diagnostic(code(mcesql::worker::disconnected))]
    Disconnected,

    #[error("failed to start deep-parse worker")]
    #[diagnostic(code(mcesql::worker::spawn))]
    Spawn(#[source] std::io::Error),
}

/// Failures loading data extension metadata
#[derive(Debug, Error, miette::Diagnostic)]
pub enum SchemaError {
    #[error("invalid data extension document")]
    #[diagnostic(
        code(mcesql::schema::json),
        help("expected a JSON array of data extensions with name, customerKey and fields")
    )]
    Json(#[from] serde_json::Error),

    #[error("data extension '{0}' is defined more than once")]
    #[diagnostic(code(mcesql::schema::duplicate))]
    DuplicateTable(String),
}
