//! Batch worker pool.
//!
//! The coordinator queues every batch up front on a channel (dispatch order
//! is input order) and workers pull from it as they go idle. Workers report
//! per-file results back on a second channel; the coordinator buffers them
//! per batch and hands a batch over only once it finished inside its time
//! budget.
//!
//! A batch that overruns has its cancel flag raised. Its worker stops at the
//! next file boundary and everything it reported is discarded. A panic
//! inside a worker fails only the batch it was running.

use crossbeam_channel::{unbounded, RecvTimeoutError};
use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{FileError, Result};
use crate::input::FileInput;

/// Coordinator wake-up interval for deadline checks.
const TICK: Duration = Duration::from_millis(10);

/// What happened to one batch.
#[derive(Debug)]
pub enum BatchResult<T> {
    Completed {
        batch: usize,
        /// Input indices of the batch's files
        files: Vec<usize>,
        results: Vec<(usize, T)>,
        errors: Vec<FileError>,
    },
    TimedOut {
        batch: usize,
        files: Vec<usize>,
        elapsed: Duration,
    },
    Failed {
        batch: usize,
        worker: usize,
        files: Vec<usize>,
        message: String,
    },
}

struct Job {
    batch: usize,
    files: Vec<usize>,
}

enum Event<T> {
    Started { batch: usize },
    File { batch: usize, index: usize, outcome: Result<T> },
    Finished { batch: usize },
    Panicked { batch: usize, worker: usize, message: String },
}

struct InFlight<T> {
    started: Instant,
    budget: Duration,
    results: Vec<(usize, T)>,
    errors: Vec<FileError>,
}

#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    batch_size: usize,
    timeout_per_file: Duration,
}

impl WorkerPool {
    pub fn new(workers: usize, batch_size: usize, timeout_per_file: Duration) -> Self {
        Self {
            workers: workers.max(1),
            batch_size: batch_size.max(1),
            timeout_per_file,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Split `pending` (indices into `files`) into batches.
    pub fn batches(&self, pending: &[usize]) -> Vec<Vec<usize>> {
        pending.chunks(self.batch_size).map(|c| c.to_vec()).collect()
    }

    /// Run `scanner` over the pending files, reporting each batch to
    /// `on_batch` as it completes, times out or fails.
    pub fn run<T, F, C>(&self, files: &[FileInput], pending: &[usize], scanner: &F, mut on_batch: C)
    where
        T: Send,
        F: Fn(&FileInput) -> Result<T> + Sync,
        C: FnMut(BatchResult<T>),
    {
        let batches = self.batches(pending);
        if batches.is_empty() {
            return;
        }
        let cancel: Vec<AtomicBool> = batches.iter().map(|_| AtomicBool::new(false)).collect();
        let members: HashMap<usize, Vec<usize>> = batches.iter().cloned().enumerate().collect();

        let (job_tx, job_rx) = unbounded::<Job>();
        let (event_tx, event_rx) = unbounded::<Event<T>>();
        for (batch, files) in batches.into_iter().enumerate() {
            // The receiver is alive in this scope; a send cannot fail here
            let _ = job_tx.send(Job { batch, files });
        }
        drop(job_tx);

        thread::scope(|scope| {
            let mut spawned = 0;
            for worker in 0..self.workers {
                let job_rx = job_rx.clone();
                let event_tx = event_tx.clone();
                let cancel = &cancel;
                let spawn = thread::Builder::new()
                    .name(format!("meridian-scan-{}", worker))
                    .spawn_scoped(scope, move || {
                        while let Ok(job) = job_rx.recv() {
                            run_job(worker, job, files, scanner, cancel, &event_tx);
                        }
                    });
                match spawn {
                    Ok(_) => spawned += 1,
                    Err(e) => tracing::error!(worker, error = %e, "failed to spawn scan worker"),
                }
            }
            drop(event_tx);

            if spawned == 0 {
                // Nobody will drain the queue; run it on the coordinator
                tracing::warn!("no scan workers available, running batches inline");
                let (inline_tx, inline_rx) = unbounded::<Event<T>>();
                while let Ok(job) = job_rx.recv() {
                    run_job(0, job, files, scanner, &cancel, &inline_tx);
                }
                drop(inline_tx);
                self.coordinate(inline_rx, files, &members, &cancel, &mut on_batch);
            } else {
                drop(job_rx);
                self.coordinate(event_rx, files, &members, &cancel, &mut on_batch);
            }
        });
    }

    fn coordinate<T, C>(
        &self,
        events: crossbeam_channel::Receiver<Event<T>>,
        files: &[FileInput],
        members: &HashMap<usize, Vec<usize>>,
        cancel: &[AtomicBool],
        on_batch: &mut C,
    ) where
        C: FnMut(BatchResult<T>),
    {
        let mut in_flight: HashMap<usize, InFlight<T>> = HashMap::new();
        let mut abandoned: HashSet<usize> = HashSet::new();
        let files_of = |batch: usize| members.get(&batch).cloned().unwrap_or_default();

        loop {
            match events.recv_timeout(TICK) {
                Ok(Event::Started { batch }) => {
                    let len = members.get(&batch).map(|m| m.len()).unwrap_or(1) as u32;
                    in_flight.insert(
                        batch,
                        InFlight {
                            started: Instant::now(),
                            budget: self.timeout_per_file.saturating_mul(len),
                            results: Vec::new(),
                            errors: Vec::new(),
                        },
                    );
                }
                Ok(Event::File { batch, index, outcome }) => {
                    if let Some(state) = in_flight.get_mut(&batch) {
                        match outcome {
                            Ok(value) => state.results.push((index, value)),
                            Err(e) => {
                                tracing::warn!(batch, error = %e, "file failed in worker");
                                let path = files.get(index).map(|f| f.file_path.clone()).unwrap_or_default();
                                state.errors.push(FileError::from_error(path, &e));
                            }
                        }
                    }
                }
                Ok(Event::Finished { batch }) => {
                    if abandoned.contains(&batch) {
                        tracing::debug!(batch, "late finish of abandoned batch ignored");
                        continue;
                    }
                    if let Some(state) = in_flight.remove(&batch) {
                        on_batch(BatchResult::Completed {
                            batch,
                            files: files_of(batch),
                            results: state.results,
                            errors: state.errors,
                        });
                    }
                }
                Ok(Event::Panicked { batch, worker, message }) => {
                    if abandoned.contains(&batch) {
                        continue;
                    }
                    in_flight.remove(&batch);
                    tracing::error!(batch, worker, %message, "scan worker panicked");
                    on_batch(BatchResult::Failed {
                        batch,
                        worker,
                        files: files_of(batch),
                        message,
                    });
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let overdue: Vec<usize> = in_flight
                .iter()
                .filter(|(_, state)| state.started.elapsed() > state.budget)
                .map(|(batch, _)| *batch)
                .collect();
            for batch in overdue {
                if let Some(state) = in_flight.remove(&batch) {
                    if let Some(flag) = cancel.get(batch) {
                        flag.store(true, Ordering::Relaxed);
                    }
                    abandoned.insert(batch);
                    let elapsed = state.started.elapsed();
                    tracing::warn!(batch, ?elapsed, budget = ?state.budget, "batch timed out, discarding results");
                    on_batch(BatchResult::TimedOut {
                        batch,
                        files: files_of(batch),
                        elapsed,
                    });
                }
            }
        }
    }
}

fn run_job<T, F>(
    worker: usize,
    job: Job,
    files: &[FileInput],
    scanner: &F,
    cancel: &[AtomicBool],
    events: &crossbeam_channel::Sender<Event<T>>,
) where
    F: Fn(&FileInput) -> Result<T> + Sync,
{
    let batch = job.batch;
    let _ = events.send(Event::Started { batch });

    let run = catch_unwind(AssertUnwindSafe(|| {
        for &index in &job.files {
            if cancel.get(batch).map(|f| f.load(Ordering::Relaxed)).unwrap_or(false) {
                tracing::debug!(batch, worker, "batch cancelled, stopping at file boundary");
                return;
            }
            let Some(input) = files.get(index) else {
                continue;
            };
            let outcome = scanner(input);
            let _ = events.send(Event::File { batch, index, outcome });
        }
    }));

    let event = match run {
        Ok(()) => Event::Finished { batch },
        Err(payload) => Event::Panicked {
            batch,
            worker,
            message: panic_message(payload.as_ref()),
        },
    };
    let _ = events.send(event);
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
