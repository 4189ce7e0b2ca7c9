//! Thread-per-parse worker host with stale-result suppression.
//!
//! Every [`WorkerHost::submit`] bumps the generation counter, marks the
//! previous job cancelled and spawns a fresh thread. All workers report on
//! one channel tagged with their generation; only the current generation's
//! response is ever returned to the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use quote_types::{ErrorCode, Platform};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::dispatch::dispatch_cancellable;
use crate::fetch::FileFetcher;
use crate::messages::{WorkerRequest, WorkerResponse};

/// Failures of the host itself, as opposed to failures of a parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("no response from parse worker after {elapsed:?}")]
    Timeout { elapsed: Duration },

    #[error("parse worker channel closed")]
    Disconnected,

    #[error("failed to start parse worker: {reason}")]
    Spawn { reason: String },
}

impl HostError {
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::UploadFailed
    }
}

/// Identifies a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTicket {
    pub job_id: Uuid,
    pub generation: u64,
}

struct Envelope {
    generation: u64,
    response: WorkerResponse,
}

struct ActiveJob {
    ticket: JobTicket,
    cancelled: Arc<AtomicBool>,
    started: Instant,
}

pub struct WorkerHost {
    fetcher: Arc<dyn FileFetcher>,
    config: WorkerConfig,
    generation: u64,
    active: Option<ActiveJob>,
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
    stale_dropped: u64,
}

impl WorkerHost {
    pub fn new(fetcher: Arc<dyn FileFetcher>, config: WorkerConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            fetcher,
            config,
            generation: 0,
            active: None,
            tx,
            rx,
            stale_dropped: 0,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Generation of the most recent submission (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_job(&self) -> Option<JobTicket> {
        self.active.as_ref().map(|job| job.ticket)
    }

    /// Responses discarded because a newer job had been submitted.
    pub fn stale_dropped(&self) -> u64 {
        self.stale_dropped
    }

    /// Start parsing `file_url`, superseding any job still in flight.
    #[instrument(skip(self, file_url), fields(generation = self.generation + 1))]
    pub fn submit(&mut self, file_url: impl Into<String>, platform: Platform) -> JobTicket {
        self.cancel();
        self.generation += 1;

        let request = WorkerRequest::parse(file_url, platform);
        let ticket = JobTicket {
            job_id: request.job_id(),
            generation: self.generation,
        };
        let cancelled = Arc::new(AtomicBool::new(false));

        let tx = self.tx.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let config = self.config.clone();
        let flag = Arc::clone(&cancelled);
        let generation = self.generation;
        let spawned = thread::Builder::new()
            .name(format!("stl-parse-{generation}"))
            .spawn(move || {
                let response = dispatch_cancellable(request, fetcher.as_ref(), &config, &|| {
                    flag.load(Ordering::Acquire)
                });
                if flag.load(Ordering::Acquire) {
                    debug!(generation, "worker finished after cancellation");
                    return;
                }
                // The host may already be gone.
                let _ = tx.send(Envelope {
                    generation,
                    response,
                });
            });

        if let Err(e) = spawned {
            let err = HostError::Spawn {
                reason: e.to_string(),
            };
            warn!(error = %err, "parse worker unavailable");
            let _ = self.tx.send(Envelope {
                generation,
                response: WorkerResponse::failed(ticket.job_id, err.error_code()),
            });
        }

        debug!(job_id = %ticket.job_id, "submitted parse job");
        self.active = Some(ActiveJob {
            ticket,
            cancelled,
            started: Instant::now(),
        });
        ticket
    }

    /// Invalidate the in-flight job, if any. Its result will never be
    /// returned.
    pub fn cancel(&mut self) {
        if let Some(job) = self.active.take() {
            job.cancelled.store(true, Ordering::Release);
            debug!(generation = job.ticket.generation, "cancelled parse job");
        }
    }

    /// Non-blocking check for the current job's response.
    ///
    /// Returns `None` while the job is running or when nothing is in flight.
    /// A job past its timeout resolves to `UploadFailed`.
    pub fn poll(&mut self) -> Option<WorkerResponse> {
        self.active.as_ref()?;
        loop {
            match self.rx.try_recv() {
                Ok(envelope) => {
                    if let Some(response) = self.accept(envelope) {
                        return Some(response);
                    }
                }
                Err(TryRecvError::Empty) => {
                    let elapsed = self.active.as_ref()?.started.elapsed();
                    if elapsed >= self.config.timeout() {
                        return self.fail(HostError::Timeout { elapsed });
                    }
                    return None;
                }
                Err(TryRecvError::Disconnected) => return self.fail(HostError::Disconnected),
            }
        }
    }

    /// Block until the current job responds or times out.
    ///
    /// Returns `None` only when nothing is in flight.
    pub fn wait(&mut self) -> Option<WorkerResponse> {
        let deadline = self.active.as_ref()?.started + self.config.timeout();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(envelope) => {
                    if let Some(response) = self.accept(envelope) {
                        return Some(response);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    let elapsed = self.active.as_ref()?.started.elapsed();
                    return self.fail(HostError::Timeout { elapsed });
                }
                Err(RecvTimeoutError::Disconnected) => return self.fail(HostError::Disconnected),
            }
        }
    }

    fn accept(&mut self, envelope: Envelope) -> Option<WorkerResponse> {
        let current = self.active.as_ref().map(|job| job.ticket.generation);
        if current != Some(envelope.generation) {
            self.stale_dropped += 1;
            warn!(
                stale = envelope.generation,
                current = self.generation,
                "dropping stale parse result"
            );
            return None;
        }
        self.active = None;
        Some(envelope.response)
    }

    fn fail(&mut self, err: HostError) -> Option<WorkerResponse> {
        let job = self.active.take()?;
        job.cancelled.store(true, Ordering::Release);
        warn!(error = %err, generation = job.ticket.generation, "parse job abandoned");
        Some(WorkerResponse::failed(job.ticket.job_id, err.error_code()))
    }
}

impl Drop for WorkerHost {
    fn drop(&mut self) {
        self.cancel();
    }
}
