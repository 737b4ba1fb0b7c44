//! Deep-parse worker
//!
//! The worker is an actor: requests go in over one channel, responses come
//! back over another, and nothing else is shared. [`WorkerPort`] is the
//! coordinator's only view of it, so a thread, a process, or an in-process
//! stand-in all look the same.

mod deep_parse;
mod inline;
mod thread;

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

pub use deep_parse::{DeepParser, DEEP_PARSE_RULE_ID};
pub use inline::InlineWorker;
pub use thread::ThreadWorker;

use crate::error::{Diagnostic, WorkerError};
use crate::linter::panic_message;

/// Coordinator → worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WorkerRequest {
    /// Prime the worker; answered with [`WorkerResponse::Ready`]
    Init,
    #[serde(rename_all = "camelCase")]
    Lint { request_id: u64, sql: String },
}

/// Worker → coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WorkerResponse {
    Ready,
    #[serde(rename_all = "camelCase")]
    LintResult {
        request_id: u64,
        diagnostics: Vec<Diagnostic>,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        request_id: Option<u64>,
        message: String,
    },
}

/// A channel pair to a deep-parse worker
pub trait WorkerPort {
    fn send(&mut self, request: WorkerRequest) -> Result<(), WorkerError>;

    /// Next response if one is ready, without blocking
    fn try_recv(&mut self) -> Result<Option<WorkerResponse>, WorkerError>;

    /// Block until the next response arrives
    fn recv(&mut self) -> Result<WorkerResponse, WorkerError>;
}

/// Answer one request. Parser panics become [`WorkerResponse::Error`].
pub(crate) fn handle_request(parser: &DeepParser, request: WorkerRequest) -> WorkerResponse {
    match request {
        WorkerRequest::Init => WorkerResponse::Ready,
        WorkerRequest::Lint { request_id, sql } => {
            match panic::catch_unwind(AssertUnwindSafe(|| parser.parse(&sql))) {
                Ok(diagnostics) => WorkerResponse::LintResult {
                    request_id,
                    diagnostics,
                },
                Err(payload) => WorkerResponse::Error {
                    request_id: Some(request_id),
                    message: panic_message(payload.as_ref()),
                },
            }
        }
    }
}
