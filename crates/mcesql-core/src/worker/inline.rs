use std::collections::VecDeque;

use super::{handle_request, DeepParser, WorkerPort, WorkerRequest, WorkerResponse};
use crate::error::WorkerError;

/// Answers every request on the caller's thread as soon as it is sent
///
/// Responses queue up until received, so the coordinator still sees them
/// arrive asynchronously. Useful in tests and one-shot tools.
#[derive(Debug, Default)]
pub struct InlineWorker {
    parser: DeepParser,
    outbox: VecDeque<WorkerResponse>,
}

impl InlineWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses not yet received
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }
}

impl WorkerPort for InlineWorker {
    fn send(&mut self, request: WorkerRequest) -> Result<(), WorkerError> {
        self.outbox.push_back(handle_request(&self.parser, request));
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<WorkerResponse>, WorkerError> {
        Ok(self.outbox.pop_front())
    }

    /// Nothing can arrive later, so an empty outbox is reported as disconnected
    fn recv(&mut self) -> Result<WorkerResponse, WorkerError> {
        self.outbox.pop_front().ok_or(WorkerError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queues_until_received() {
        let mut worker = InlineWorker::new();
        worker.send(WorkerRequest::Init).unwrap();
        worker
            .send(WorkerRequest::Lint {
                request_id: 1,
                sql: "SELECT a FROM T".to_string(),
            })
            .unwrap();
        assert_eq!(worker.pending(), 2);
        assert_eq!(worker.try_recv().unwrap(), Some(WorkerResponse::Ready));
        assert!(matches!(
            worker.recv().unwrap(),
            WorkerResponse::LintResult { request_id: 1, .. }
        ));
        assert!(worker.try_recv().unwrap().is_none());
        assert!(matches!(worker.recv(), Err(WorkerError::Disconnected)));
    }
}
