use bf_pipeline::{EstimatorHandle, MapFrame, MapRequest, PipelineError, compute_frame};
use std::sync::mpsc::{Receiver, channel};
use std::thread::{self, JoinHandle};

/// Runs one map computation off the UI thread. The session stays on the
/// UI thread; the worker only gets the estimator handle and the captured
/// request, and hands the finished frame back through the channel.
pub struct ComputeWorker {
    pub result_rx: Receiver<WorkerMessage>,
    _handle: JoinHandle<()>,
}

pub enum WorkerMessage {
    Complete { frame: MapFrame },
    Error { error: PipelineError },
}

impl ComputeWorker {
    pub fn start(stage: EstimatorHandle, request: MapRequest) -> Self {
        let (tx, rx) = channel();

        let handle = thread::spawn(move || {
            let message = match compute_frame(&stage, request) {
                Ok(frame) => WorkerMessage::Complete { frame },
                Err(error) => WorkerMessage::Error { error },
            };
            let _ = tx.send(message);
        });

        Self {
            result_rx: rx,
            _handle: handle,
        }
    }
}
