//! mcesql-core: lint engine for Marketing Cloud Engagement query SQL
//!
//! This library checks query activity SQL against the platform's read-only
//! T-SQL subset: a shared scanner feeds a set of independent rules, and a
//! coordinator merges their output with a deep parse run on a worker.

pub mod config;
pub mod coordinator;
pub mod dialect;
pub mod error;
pub mod linter;
pub mod query;
pub mod refs;
pub mod rules;
pub mod scanner;
pub mod schema;
pub mod types;
pub mod worker;

pub use config::{CoordinatorConfig, LintConfig};
pub use coordinator::{CoordinatorState, DiagnosticsCoordinator};
pub use dialect::MceDialect;
pub use error::{
    first_blocking_diagnostic, has_blocking_diagnostics, Diagnostic, SchemaError, Severity, Span,
    WorkerError,
};
pub use linter::{lint, LintOptions, LintReport, Linter, Rule};
pub use refs::TableReference;
pub use schema::{QualifiedName, SchemaCatalog, SchemaField, SchemaTable};
pub use types::FieldType;
pub use worker::{DeepParser, InlineWorker, ThreadWorker, WorkerPort};
