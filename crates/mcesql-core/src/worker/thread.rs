use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::debug;

use super::{handle_request, DeepParser, WorkerPort, WorkerRequest, WorkerResponse};
use crate::error::WorkerError;

/// Deep-parse worker on a dedicated OS thread
///
/// Dropping the handle closes the request channel and joins the thread.
pub struct ThreadWorker {
    requests: Option<Sender<WorkerRequest>>,
    responses: Receiver<WorkerResponse>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadWorker {
    pub fn spawn() -> Result<Self, WorkerError> {
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("mcesql-deep-parse".to_string())
            .spawn(move || run(request_rx, response_tx))
            .map_err(WorkerError::Spawn)?;

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
        })
    }
}

fn run(requests: Receiver<WorkerRequest>, responses: Sender<WorkerResponse>) {
    let parser = DeepParser::new();
    debug!("deep-parse worker started");
    for request in requests {
        if responses.send(handle_request(&parser, request)).is_err() {
            break;
        }
    }
    debug!("deep-parse worker stopped");
}

impl WorkerPort for ThreadWorker {
    fn send(&mut self, request: WorkerRequest) -> Result<(), WorkerError> {
        let requests = self.requests.as_ref().ok_or(WorkerError::Disconnected)?;
        requests.send(request).map_err(|_| WorkerError::Disconnected)
    }

    fn try_recv(&mut self) -> Result<Option<WorkerResponse>, WorkerError> {
        match self.responses.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    fn recv(&mut self) -> Result<WorkerResponse, WorkerError> {
        self.responses.recv().map_err(|_| WorkerError::Disconnected)
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
