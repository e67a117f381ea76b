//! A message passing boundary in front of a frame pipeline.
//!
//! Callers hold a cloneable [`WorkerHandle`]
//! and send it decode requests,
//! each of which is decoded in its own task.
//! There is no cancellation:
//! a request which reached the worker runs to completion.

use crate::options::DecodeRequest;
use crate::pipeline::FramePipeline;
use crate::result::PixelFrameResult;
use crate::{Result, WorkerUnavailableSnafu};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, warn};

type Job = (DecodeRequest, oneshot::Sender<Result<PixelFrameResult>>);

/// The receiving end of the decode request channel.
#[derive(Debug)]
pub struct DecodeWorker {
    pipeline: Arc<FramePipeline>,
    requests: mpsc::Receiver<Job>,
}

/// A handle for sending requests to a [`DecodeWorker`].
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    requests: mpsc::Sender<Job>,
}

impl DecodeWorker {
    /// Create a worker over the given pipeline,
    /// queueing at most `capacity` requests.
    ///
    /// The worker does nothing until [`run`](DecodeWorker::run) is awaited.
    pub fn new(pipeline: FramePipeline, capacity: usize) -> (DecodeWorker, WorkerHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            DecodeWorker {
                pipeline: Arc::new(pipeline),
                requests: rx,
            },
            WorkerHandle { requests: tx },
        )
    }

    /// Create a worker and run it in a new task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(pipeline: FramePipeline, capacity: usize) -> WorkerHandle {
        let (worker, handle) = DecodeWorker::new(pipeline, capacity);
        tokio::spawn(worker.run());
        handle
    }

    /// Serve requests until every handle is dropped,
    /// then wait for the pending decodes
    /// and release the codec instances.
    pub async fn run(mut self) {
        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                job = self.requests.recv() => match job {
                    Some((request, reply)) => {
                        let pipeline = Arc::clone(&self.pipeline);
                        tasks.spawn(async move {
                            let outcome = pipeline.decode(request).await;
                            if reply.send(outcome).is_err() {
                                debug!("Requester went away before the frame was decoded");
                            }
                        });
                    }
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Decode task failed: {}", e);
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Decode task failed: {}", e);
            }
        }
        self.pipeline.shutdown().await;
        debug!("Decode worker stopped");
    }
}

impl WorkerHandle {
    /// Send a request to the worker and wait for its outcome.
    pub async fn decode(&self, request: DecodeRequest) -> Result<PixelFrameResult> {
        let (reply, outcome) = oneshot::channel();
        self.requests
            .send((request, reply))
            .await
            .map_err(|_| WorkerUnavailableSnafu.build())?;
        outcome.await.map_err(|_| WorkerUnavailableSnafu.build())?
    }

    /// Whether the worker stopped receiving requests.
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }
}
