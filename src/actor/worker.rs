//! Diff Workers: Dedicated threads for computing diffs.
//!
//! A pool of threads shares one job channel. Each worker takes the next
//! [`DiffJob`], runs the diffing engine and sends a [`DiffOutcome`] back.
//! With more than one worker, outcomes can arrive out of submission order;
//! the owner is responsible for resequencing them.

use super::messages::{DiffJob, DiffOutcome, WorkerCommand};
use crate::diff::{diff, Diffable};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// How long a worker waits for a job before re-checking the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Pool of diff worker threads.
pub struct DiffWorkerPool<T> {
    /// Handles to the worker threads.
    handles: Vec<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Job sender, shared by all workers.
    job_tx: Sender<WorkerCommand<T>>,
    /// Outcome receiver.
    outcome_rx: Receiver<DiffOutcome<T>>,
}

impl<T> DiffWorkerPool<T>
where
    T: Diffable + Send + Sync + 'static,
{
    /// Spawn `workers` threads named `{name}-{n}`.
    ///
    /// At least one thread is always spawned.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS fails to spawn a thread. Threads spawned
    /// before the failure are shut down.
    pub fn spawn(workers: usize, name: &str) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (job_tx, job_rx) = unbounded::<WorkerCommand<T>>();
        let (outcome_tx, outcome_rx) = unbounded::<DiffOutcome<T>>();

        let mut pool = Self {
            handles: Vec::with_capacity(workers.max(1)),
            shutdown,
            job_tx,
            outcome_rx,
        };

        for n in 0..workers.max(1) {
            let jobs = job_rx.clone();
            let outcomes = outcome_tx.clone();
            let shutdown = pool.shutdown.clone();
            let handle = thread::Builder::new()
                .name(format!("{name}-{n}"))
                .spawn(move || Self::run_loop(&jobs, &outcomes, &shutdown))?;
            pool.handles.push(handle);
        }

        debug!(workers = pool.handles.len(), "spawned diff workers");
        Ok(pool)
    }

    /// Queue a job.
    ///
    /// Returns the job back if every worker has exited.
    pub fn submit(&self, job: DiffJob<T>) -> Result<(), DiffJob<T>> {
        self.job_tx
            .send(WorkerCommand::Diff(job))
            .map_err(|err| match err.into_inner() {
                WorkerCommand::Diff(job) => job,
                WorkerCommand::Shutdown => unreachable!("only diff jobs are submitted"),
            })
    }

    /// Receiver for finished jobs.
    #[inline]
    pub const fn outcomes(&self) -> &Receiver<DiffOutcome<T>> {
        &self.outcome_rx
    }

    /// Number of worker threads.
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether every worker thread is still running.
    ///
    /// Workers only exit early by panicking, which loses the job they held.
    pub fn is_healthy(&self) -> bool {
        !self.handles.iter().any(JoinHandle::is_finished)
    }

    /// Whether the pool has no threads (never true after `spawn`).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Main worker loop.
    fn run_loop(
        jobs: &Receiver<WorkerCommand<T>>,
        outcomes: &Sender<DiffOutcome<T>>,
        shutdown: &Arc<AtomicBool>,
    ) {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            match jobs.recv_timeout(POLL_INTERVAL) {
                Ok(WorkerCommand::Diff(job)) => {
                    let ticket = job.ticket;
                    if outcomes.send(Self::compute(job)).is_err() {
                        error!(ticket, "diff outcome dropped: owner is gone");
                        break;
                    }
                }
                Ok(WorkerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    /// Run the diffing engine for one job.
    fn compute(job: DiffJob<T>) -> DiffOutcome<T> {
        let start = Instant::now();
        let result = diff(&job.base, &job.target);
        let elapsed = start.elapsed();

        debug!(
            ticket = job.ticket,
            old_len = job.base.len(),
            new_len = job.target.len(),
            edits = result.as_ref().map_or(0, |script| script.len()),
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "worker computed diff"
        );

        DiffOutcome {
            ticket: job.ticket,
            base_generation: job.base_generation,
            target: job.target,
            result,
            elapsed,
        }
    }
}

impl<T> Drop for DiffWorkerPool<T> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for _ in &self.handles {
            let _ = self.job_tx.send(WorkerCommand::Shutdown);
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl<T> std::fmt::Debug for DiffWorkerPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffWorkerPool")
            .field("workers", &self.handles.len())
            .field("queued", &self.job_tx.len())
            .field("finished", &self.outcome_rx.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Edit;

    fn job(ticket: u64, base: Vec<u32>, target: Vec<u32>) -> DiffJob<u32> {
        DiffJob {
            ticket,
            base: Arc::new(base),
            base_generation: ticket - 1,
            target: Arc::new(target),
        }
    }

    #[test]
    fn test_worker_computes_diff() {
        let pool = DiffWorkerPool::<u32>::spawn(1, "test-diff").unwrap();
        assert_eq!(pool.len(), 1);

        pool.submit(job(1, vec![1, 2], vec![1, 2, 3])).unwrap();
        let outcome = pool.outcomes().recv_timeout(Duration::from_secs(5)).unwrap();

        assert_eq!(outcome.ticket, 1);
        assert_eq!(outcome.base_generation, 0);
        assert!(outcome.applies_to(0));
        assert!(!outcome.applies_to(1));
        assert_eq!(
            outcome.result.unwrap().edits(),
            &[Edit::Insert { index: 2, item: 3 }]
        );
    }

    #[test]
    fn test_worker_reports_invalid_input() {
        let pool = DiffWorkerPool::<u32>::spawn(1, "test-diff").unwrap();
        pool.submit(job(1, vec![], vec![4, 4])).unwrap();
        let outcome = pool.outcomes().recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(outcome.result.is_err());
        assert!(!outcome.applies_to(0));
    }

    #[test]
    fn test_pool_processes_every_job() {
        let pool = DiffWorkerPool::<u32>::spawn(4, "test-diff").unwrap();
        assert_eq!(pool.len(), 4);

        for ticket in 1..=32 {
            let base: Vec<u32> = (0..ticket as u32).collect();
            let target: Vec<u32> = (0..=ticket as u32).rev().collect();
            pool.submit(job(ticket, base, target)).unwrap();
        }

        let mut tickets: Vec<u64> = (0..32)
            .map(|_| {
                pool.outcomes()
                    .recv_timeout(Duration::from_secs(5))
                    .unwrap()
                    .ticket
            })
            .collect();
        tickets.sort_unstable();
        assert_eq!(tickets, (1..=32).collect::<Vec<_>>());
    }

    #[test]
    fn test_pool_drop_joins_workers() {
        let pool = DiffWorkerPool::<u32>::spawn(3, "test-diff").unwrap();
        drop(pool);
    }

    /// An item whose key can never be computed.
    #[derive(Debug, Clone)]
    struct Explosive;

    impl Diffable for Explosive {
        type Key = u8;

        fn diff_key(&self) -> u8 {
            panic!("explosive key")
        }

        fn content_eq(&self, _other: &Self) -> bool {
            true
        }
    }

    #[test]
    fn test_pool_reports_dead_worker() {
        let pool = DiffWorkerPool::<Explosive>::spawn(2, "test-explosive").unwrap();
        assert!(pool.is_healthy());

        pool.submit(DiffJob {
            ticket: 1,
            base: Arc::new(Vec::new()),
            base_generation: 0,
            target: Arc::new(vec![Explosive]),
        })
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while pool.is_healthy() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!pool.is_healthy());
    }
}
