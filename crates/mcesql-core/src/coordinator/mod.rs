//! Diagnostics coordinator
//!
//! Owns one editing session: re-lints synchronously on every change,
//! debounces deep-parse requests to the worker, drops stale responses and
//! keeps the merged diagnostic list current.
//!
//! ```text
//! Idle --text change--> Debouncing --deadline--> WorkerRequested --response--> Idle
//!                           ^   |                       |
//!                           +---+ (text change)         +--text change--> Debouncing
//! ```
//!
//! The coordinator never blocks on its own. Call [`DiagnosticsCoordinator::poll`]
//! from the host's event loop, or [`DiagnosticsCoordinator::settle`] to wait
//! for the deep parse of the current text.

mod clock;
mod merge;

use std::time::Duration;

use tracing::{debug, trace, warn};

pub use clock::{Clock, ManualClock, SystemClock};
pub use merge::merge_diagnostics;

use crate::config::CoordinatorConfig;
use crate::error::{self, Diagnostic, WorkerError};
use crate::linter::{LintOptions, Linter, RuleFailure};
use crate::schema::SchemaCatalog;
use crate::worker::{WorkerPort, WorkerRequest, WorkerResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    /// A deep parse will be requested once the clock reaches `deadline`
    Debouncing { deadline: Duration },
    WorkerRequested { request_id: u64 },
}

pub struct DiagnosticsCoordinator<W: WorkerPort, C: Clock = SystemClock> {
    worker: W,
    clock: C,
    linter: Linter,
    config: CoordinatorConfig,
    schema: Option<SchemaCatalog>,
    text: String,
    cursor_offset: Option<usize>,
    state: CoordinatorState,
    next_request_id: u64,
    latest_request_id: Option<u64>,
    sync_diagnostics: Vec<Diagnostic>,
    async_diagnostics: Vec<Diagnostic>,
    merged: Vec<Diagnostic>,
    failed_rules: Vec<RuleFailure>,
}

impl<W: WorkerPort> DiagnosticsCoordinator<W, SystemClock> {
    pub fn new(worker: W, config: CoordinatorConfig) -> Self {
        Self::with_clock(worker, SystemClock::new(), config)
    }
}

impl<W: WorkerPort, C: Clock> DiagnosticsCoordinator<W, C> {
    pub fn with_clock(worker: W, clock: C, config: CoordinatorConfig) -> Self {
        Self {
            worker,
            clock,
            linter: Linter::default(),
            config,
            schema: None,
            text: String::new(),
            cursor_offset: None,
            state: CoordinatorState::Idle,
            next_request_id: 0,
            latest_request_id: None,
            sync_diagnostics: Vec::new(),
            async_diagnostics: Vec::new(),
            merged: Vec::new(),
            failed_rules: Vec::new(),
        }
    }

    /// Replace the synchronous rule set (e.g. with rules disabled)
    pub fn with_linter(mut self, linter: Linter) -> Self {
        self.linter = linter;
        self
    }

    /// Prime the worker
    pub fn init(&mut self) -> Result<(), WorkerError> {
        self.worker.send(WorkerRequest::Init)
    }

    /// Swap the data extension metadata and re-run the synchronous rules
    pub fn set_schema(&mut self, schema: Option<SchemaCatalog>) {
        self.schema = schema;
        self.relint();
    }

    /// Record new editor text and restart the debounce window
    pub fn on_text_change(&mut self, text: impl Into<String>, cursor_offset: Option<usize>) {
        self.text = text.into();
        self.cursor_offset = cursor_offset;
        self.relint();

        if self.should_dispatch() {
            let deadline = self.clock.now() + self.config.debounce();
            trace!(?deadline, "deep parse scheduled");
            self.state = CoordinatorState::Debouncing { deadline };
        } else {
            debug!(len = self.text.len(), "text empty or too long, skipping deep parse");
            self.latest_request_id = None;
            self.async_diagnostics.clear();
            self.state = CoordinatorState::Idle;
            self.remerge();
        }
    }

    /// Fire the debounce timer if it is due and apply any worker responses
    pub fn poll(&mut self) {
        if let CoordinatorState::Debouncing { deadline } = self.state {
            if self.clock.now() >= deadline {
                self.dispatch();
            }
        }

        loop {
            match self.worker.try_recv() {
                Ok(Some(response)) => self.handle_response(response),
                Ok(None) => break,
                Err(err) => {
                    self.worker_failed(&err);
                    break;
                }
            }
        }
    }

    /// Dispatch a pending request now and block until the current request
    /// resolves
    pub fn settle(&mut self) {
        if matches!(self.state, CoordinatorState::Debouncing { .. }) {
            self.dispatch();
        }
        while let CoordinatorState::WorkerRequested { .. } = self.state {
            match self.worker.recv() {
                Ok(response) => self.handle_response(response),
                Err(err) => self.worker_failed(&err),
            }
        }
    }

    pub fn handle_response(&mut self, response: WorkerResponse) {
        match response {
            WorkerResponse::Ready => debug!("deep-parse worker ready"),
            WorkerResponse::LintResult {
                request_id,
                diagnostics,
            } => {
                if self.latest_request_id != Some(request_id) {
                    debug!(request_id, latest = ?self.latest_request_id, "discarding stale deep-parse result");
                    return;
                }
                let len = self.text.len();
                self.async_diagnostics = diagnostics
                    .into_iter()
                    .filter(|d| d.span.start <= d.span.end && d.span.end <= len)
                    .collect();
                self.finish(request_id);
                self.remerge();
            }
            WorkerResponse::Error {
                request_id,
                message,
            } => {
                warn!(?request_id, %message, "deep parse failed, keeping previous diagnostics");
                if let Some(request_id) = request_id {
                    self.finish(request_id);
                }
            }
        }
    }

    /// The merged, ordered diagnostic list
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.merged
    }

    pub fn has_blocking_diagnostics(&self) -> bool {
        error::has_blocking_diagnostics(&self.merged)
    }

    pub fn first_blocking_diagnostic(&self) -> Option<&Diagnostic> {
        error::first_blocking_diagnostic(&self.merged)
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Remaining debounce time, if a request is pending
    pub fn time_until_dispatch(&self) -> Option<Duration> {
        match self.state {
            CoordinatorState::Debouncing { deadline } => {
                Some(deadline.saturating_sub(self.clock.now()))
            }
            _ => None,
        }
    }

    /// Rules that panicked during the last synchronous pass
    pub fn failed_rules(&self) -> &[RuleFailure] {
        &self.failed_rules
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn should_dispatch(&self) -> bool {
        !self.text.trim().is_empty() && self.text.len() <= self.config.max_length
    }

    fn dispatch(&mut self) {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.latest_request_id = Some(request_id);
        self.state = CoordinatorState::WorkerRequested { request_id };
        debug!(request_id, len = self.text.len(), "requesting deep parse");

        let request = WorkerRequest::Lint {
            request_id,
            sql: self.text.clone(),
        };
        if let Err(err) = self.worker.send(request) {
            self.worker_failed(&err);
        }
    }

    fn finish(&mut self, request_id: u64) {
        if self.state == (CoordinatorState::WorkerRequested { request_id }) {
            self.state = CoordinatorState::Idle;
        }
    }

    fn worker_failed(&mut self, err: &WorkerError) {
        warn!(error = %err, "deep-parse worker unavailable, keeping previous diagnostics");
        if matches!(self.state, CoordinatorState::WorkerRequested { .. }) {
            self.state = CoordinatorState::Idle;
        }
    }

    fn relint(&mut self) {
        let options = LintOptions {
            schema: self.schema.as_ref(),
            cursor_offset: self.cursor_offset,
        };
        let report = self.linter.lint_report(&self.text, &options);
        self.sync_diagnostics = report.diagnostics;
        self.failed_rules = report.failed_rules;
        self.remerge();
    }

    fn remerge(&mut self) {
        self.merged = merge_diagnostics(&self.sync_diagnostics, &self.async_diagnostics);
    }
}
