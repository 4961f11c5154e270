//! Buffer: The displayed collection and the queue of updates leading away from it.
//!
//! The buffer owns two collections:
//! - **displayed**: what the host view currently shows
//! - **tail**: the most recently requested target
//!
//! Each update is diffed against the tail at the time it was requested, which
//! is exactly the collection that will be displayed when the update's turn to
//! be applied comes. Scripts are resequenced by ticket and applied strictly in
//! submission order.
//!
//! With the default configuration a buffer has one diff worker, so at most
//! one of its diffs is being computed at any time. Raising
//! [`BufferConfig::workers`] lets several queued diffs of the same buffer run
//! concurrently; outcomes may then finish out of order, which the ticket
//! resequencing absorbs.
//!
//! If the workers die (a panicking `Diffable` impl, for instance), the jobs
//! they held are recomputed on the owner's thread and the pool is respawned on
//! the next asynchronous update.

use super::update::{AppliedUpdate, Completion, ScriptSink, UpdateHandle};
use crate::actor::{DiffJob, DiffOutcome, DiffWorkerPool, Ticket};
use crate::diff::{diff, validate_identities, DiffError, Diffable, Side};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::collections::{BTreeMap, HashMap};
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

/// Longest a blocking wait goes without checking that the workers are alive.
const WORKER_POLL: Duration = Duration::from_millis(50);

/// Configuration for a [`Buffer`].
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Number of diff worker threads for asynchronous updates.
    ///
    /// Values above `1` let several diffs of one buffer run concurrently.
    pub workers: usize,
    /// Name prefix for worker threads.
    pub thread_name: String,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            thread_name: "bufferdiff-worker".to_string(),
        }
    }
}

/// Errors reported by a [`Buffer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Index outside `[0, count)`.
    #[error("index {index} out of range for {count} displayed elements")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// Number of displayed elements.
        count: usize,
    },

    /// The supplied collection was rejected by the diffing engine.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] DiffError),
}

/// Bookkeeping for a request that has not been applied yet.
struct Request<T> {
    on_complete: Option<Completion<T>>,
    notify: Sender<AppliedUpdate<T>>,
}

/// Owner of the displayed element collection.
///
/// The displayed collection is never assigned directly: it only changes when an
/// update's script is applied, so anything mirroring it through a
/// [`ScriptSink`] stays in step.
pub struct Buffer<T> {
    /// Configuration.
    config: BufferConfig,
    /// Currently displayed collection.
    displayed: Arc<Vec<T>>,
    /// Generation of `displayed`.
    generation: u64,
    /// Most recently requested target.
    tail: Arc<Vec<T>>,
    /// Generation of `tail`.
    tail_generation: u64,
    /// Ticket for the next request.
    next_ticket: Ticket,
    /// Ticket of the next update to apply.
    next_to_apply: Ticket,
    /// Jobs submitted to workers whose outcome has not been received.
    in_flight: BTreeMap<Ticket, DiffJob<T>>,
    /// Finished outcomes waiting for their turn.
    ready: BTreeMap<Ticket, DiffOutcome<T>>,
    /// Unapplied requests.
    requests: HashMap<Ticket, Request<T>>,
    /// Diff workers, spawned on the first asynchronous update.
    workers: Option<DiffWorkerPool<T>>,
}

impl<T: Diffable> Buffer<T> {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::from_validated(BufferConfig::default(), Vec::new())
    }

    /// Create a buffer displaying `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidInput`] if `initial` repeats an identity.
    pub fn with_elements(initial: Vec<T>) -> Result<Self, BufferError> {
        Self::with_config(BufferConfig::default(), initial)
    }

    /// Create a buffer with custom configuration displaying `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidInput`] if `initial` repeats an identity.
    pub fn with_config(config: BufferConfig, initial: Vec<T>) -> Result<Self, BufferError> {
        validate_identities(&initial, Side::Old)?;
        Ok(Self::from_validated(config, initial))
    }

    fn from_validated(config: BufferConfig, initial: Vec<T>) -> Self {
        let displayed = Arc::new(initial);
        Self {
            config,
            tail: Arc::clone(&displayed),
            displayed,
            generation: 0,
            tail_generation: 0,
            next_ticket: 1,
            next_to_apply: 1,
            in_flight: BTreeMap::new(),
            ready: BTreeMap::new(),
            requests: HashMap::new(),
            workers: None,
        }
    }

    /// Get the configuration.
    #[inline]
    pub const fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Returns the displayed element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if `index >= count_displayed()`.
    pub fn displayed_element_at(&self, index: usize) -> Result<&T, BufferError> {
        self.displayed.get(index).ok_or(BufferError::OutOfRange {
            index,
            count: self.displayed.len(),
        })
    }

    /// Number of displayed elements.
    #[inline]
    pub fn count_displayed(&self) -> usize {
        self.displayed.len()
    }

    /// The displayed collection.
    #[inline]
    pub fn displayed(&self) -> &[T] {
        &self.displayed
    }

    /// A shared handle to the displayed collection.
    ///
    /// The snapshot never changes; later updates swap in a new collection.
    #[inline]
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.displayed)
    }

    /// Generation of the displayed collection (the ticket of the last applied
    /// update, or `0`).
    #[inline]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of requested updates that have not been applied.
    #[inline]
    pub fn pending_updates(&self) -> usize {
        self.requests.len()
    }

    /// Number of diffs currently being computed by workers.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether every requested update has been applied.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.requests.is_empty()
    }
}

impl<T: Diffable> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Buffer<T>
where
    T: Diffable + Send + Sync + 'static,
{
    /// Request a transition to `new_values`.
    ///
    /// `None` re-asserts the most recently requested collection: the update
    /// produces an empty script but still completes in order.
    ///
    /// With `synchronous = true` every earlier update is applied first, then
    /// this one is computed and applied before returning, and `on_complete`
    /// has run. Otherwise the diff is computed on a worker thread and applied
    /// by a later call to [`process_completed`](Self::process_completed) or
    /// [`wait_idle`](Self::wait_idle).
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidInput`] if `new_values` repeats an
    /// identity; nothing is queued in that case.
    pub fn update(
        &mut self,
        new_values: Option<Vec<T>>,
        synchronous: bool,
        on_complete: Option<Completion<T>>,
    ) -> Result<UpdateHandle<T>, BufferError> {
        self.update_into(new_values, synchronous, on_complete, &mut ())
    }

    /// Like [`update`](Self::update), passing every applied script to `sink`.
    pub fn update_into<S: ScriptSink<T>>(
        &mut self,
        new_values: Option<Vec<T>>,
        synchronous: bool,
        on_complete: Option<Completion<T>>,
        sink: &mut S,
    ) -> Result<UpdateHandle<T>, BufferError> {
        let target = match new_values {
            Some(values) => {
                validate_identities(&values, Side::New)?;
                Arc::new(values)
            }
            None => Arc::clone(&self.tail),
        };

        // Earlier updates go first; nothing of this one is staged until they have.
        if synchronous {
            self.drain_in_flight(sink)?;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let base = mem::replace(&mut self.tail, Arc::clone(&target));
        let base_generation = mem::replace(&mut self.tail_generation, ticket);

        let (notify, rx) = bounded(1);
        self.requests.insert(ticket, Request { on_complete, notify });

        let job = DiffJob {
            ticket,
            base,
            base_generation,
            target,
        };

        if synchronous {
            self.ready.insert(ticket, compute_inline(job));
        } else if let Err(job) = self.submit(job.clone()) {
            warn!(ticket, "diff workers unavailable; computing on the caller's thread");
            self.ready.insert(ticket, compute_inline(job));
        } else {
            self.in_flight.insert(ticket, job);
        }

        self.apply_ready(sink)?;
        Ok(UpdateHandle::new(ticket, rx))
    }

    /// Apply every finished update whose turn has come, without blocking.
    ///
    /// Returns the number of updates applied.
    pub fn process_completed(&mut self) -> Result<usize, BufferError> {
        self.process_completed_into(&mut ())
    }

    /// Like [`process_completed`](Self::process_completed), passing every
    /// applied script to `sink`.
    pub fn process_completed_into<S: ScriptSink<T>>(&mut self, sink: &mut S) -> Result<usize, BufferError> {
        self.collect_outcomes();
        self.apply_ready(sink)
    }

    /// Block until every requested update has been applied, for at most
    /// `timeout`.
    ///
    /// Returns `true` if the buffer is idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> Result<bool, BufferError> {
        self.wait_idle_into(timeout, &mut ())
    }

    /// Like [`wait_idle`](Self::wait_idle), passing every applied script to
    /// `sink`.
    pub fn wait_idle_into<S: ScriptSink<T>>(
        &mut self,
        timeout: Duration,
        sink: &mut S,
    ) -> Result<bool, BufferError> {
        let deadline = Instant::now() + timeout;
        self.process_completed_into(sink)?;

        while !self.in_flight.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.poll_workers(remaining.min(WORKER_POLL)) {
                Ok(outcome) => self.receive(outcome),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => self.recover_lost_jobs(),
            }
            self.apply_ready(sink)?;
        }
        self.apply_ready(sink)?;

        Ok(self.is_idle())
    }

    /// Send a job to the workers, spawning them on first use.
    fn submit(&mut self, job: DiffJob<T>) -> Result<(), DiffJob<T>> {
        if self.workers.is_none() {
            match DiffWorkerPool::spawn(self.config.workers, &self.config.thread_name) {
                Ok(pool) => self.workers = Some(pool),
                Err(err) => {
                    warn!(error = %err, "failed to spawn diff workers");
                    return Err(job);
                }
            }
        }
        match &self.workers {
            Some(workers) => workers.submit(job),
            None => Err(job),
        }
    }

    /// Block until every job sent to the workers has come back, then apply.
    fn drain_in_flight<S: ScriptSink<T>>(&mut self, sink: &mut S) -> Result<(), BufferError> {
        while !self.in_flight.is_empty() {
            match self.poll_workers(WORKER_POLL) {
                Ok(outcome) => self.receive(outcome),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => self.recover_lost_jobs(),
            }
        }
        self.apply_ready(sink)?;
        Ok(())
    }

    /// Move every outcome the workers have finished into the ready queue.
    fn collect_outcomes(&mut self) {
        while !self.in_flight.is_empty() {
            match self.poll_workers(Duration::ZERO) {
                Ok(outcome) => self.receive(outcome),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => self.recover_lost_jobs(),
            }
        }
    }

    /// Wait up to `timeout` for the next outcome.
    ///
    /// A pool that lost a worker reports `Disconnected`: the job that worker
    /// held will never come back.
    fn poll_workers(&self, timeout: Duration) -> Result<DiffOutcome<T>, RecvTimeoutError> {
        match &self.workers {
            Some(workers) if workers.is_healthy() => workers.outcomes().recv_timeout(timeout),
            _ => Err(RecvTimeoutError::Disconnected),
        }
    }

    fn receive(&mut self, outcome: DiffOutcome<T>) {
        self.in_flight.remove(&outcome.ticket);
        self.ready.insert(outcome.ticket, outcome);
    }

    /// Drop a pool that lost workers and compute every outstanding job on
    /// this thread.
    fn recover_lost_jobs(&mut self) {
        error!(
            lost = self.in_flight.len(),
            "diff workers exited; recomputing their jobs on the caller's thread"
        );
        self.workers = None;
        for (ticket, job) in mem::take(&mut self.in_flight) {
            self.ready.insert(ticket, compute_inline(job));
        }
    }

    /// Apply ready outcomes in ticket order, stopping at the first gap.
    fn apply_ready<S: ScriptSink<T>>(&mut self, sink: &mut S) -> Result<usize, BufferError> {
        let mut applied = 0;
        while let Some(outcome) = self.ready.remove(&self.next_to_apply) {
            self.apply(outcome, sink)?;
            self.next_to_apply += 1;
            applied += 1;
        }
        Ok(applied)
    }

    /// Apply one outcome and swap in its target.
    fn apply<S: ScriptSink<T>>(&mut self, outcome: DiffOutcome<T>, sink: &mut S) -> Result<(), BufferError> {
        let stale = !outcome.applies_to(self.generation);
        let DiffOutcome {
            ticket,
            base_generation,
            target,
            result,
            elapsed,
        } = outcome;

        let script = match result {
            Ok(script) if !stale => script,
            _ => {
                warn!(
                    ticket,
                    base_generation,
                    displayed_generation = self.generation,
                    "diff was not computed against the displayed collection; recomputing"
                );
                diff(&self.displayed, &target)?
            }
        };

        sink.apply_script(ticket, &script);
        self.displayed = target;
        self.generation = ticket;

        trace!(
            ticket,
            edits = script.len(),
            count = self.displayed.len(),
            "applied update"
        );

        let applied = AppliedUpdate {
            ticket,
            script: Arc::new(script),
            count: self.displayed.len(),
            elapsed,
        };
        if let Some(request) = self.requests.remove(&ticket) {
            if let Some(on_complete) = request.on_complete {
                on_complete(&applied);
            }
            let _ = request.notify.send(applied);
        }
        Ok(())
    }
}

/// Run a job on the calling thread.
fn compute_inline<T: Diffable>(job: DiffJob<T>) -> DiffOutcome<T> {
    let start = Instant::now();
    let result = diff(&job.base, &job.target);
    let elapsed = start.elapsed();
    debug!(
        ticket = job.ticket,
        old_len = job.base.len(),
        new_len = job.target.len(),
        elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        "computed diff inline"
    );
    DiffOutcome {
        ticket: job.ticket,
        base_generation: job.base_generation,
        target: job.target,
        result,
        elapsed,
    }
}

impl<T> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("count", &self.displayed.len())
            .field("generation", &self.generation)
            .field("tail_generation", &self.tail_generation)
            .field("in_flight", &self.in_flight.len())
            .field("ready", &self.ready.len())
            .field("pending", &self.requests.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{EditScript, Keyed};
    use std::cell::RefCell;
    use std::rc::Rc;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Mirrors the buffer by applying every script to its own copy.
    struct Mirror<T> {
        items: Vec<T>,
        tickets: Vec<Ticket>,
    }

    impl<T: Clone> ScriptSink<T> for Mirror<T> {
        fn apply_script(&mut self, ticket: Ticket, script: &EditScript<T>) {
            assert_eq!(script.old_len(), self.items.len());
            script.apply_to(&mut self.items);
            self.tickets.push(ticket);
        }
    }

    fn counter() -> (Rc<RefCell<Vec<Ticket>>>, impl Fn() -> Completion<u32>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let factory_log = Rc::clone(&log);
        let factory = move || -> Completion<u32> {
            let log = Rc::clone(&factory_log);
            Box::new(move |applied: &AppliedUpdate<u32>| log.borrow_mut().push(applied.ticket))
        };
        (log, factory)
    }

    #[test]
    fn test_buffer_new_is_empty() {
        let buffer: Buffer<u32> = Buffer::new();
        assert_eq!(buffer.count_displayed(), 0);
        assert_eq!(buffer.generation(), 0);
        assert!(buffer.is_idle());
    }

    #[test]
    fn test_buffer_initial_elements() {
        let buffer = Buffer::with_elements(vec![10, 20, 30]).unwrap();
        assert_eq!(buffer.count_displayed(), 3);
        assert_eq!(buffer.displayed_element_at(1), Ok(&20));
        assert_eq!(
            buffer.displayed_element_at(3),
            Err(BufferError::OutOfRange { index: 3, count: 3 })
        );
    }

    #[test]
    fn test_buffer_rejects_duplicate_initial() {
        let err = Buffer::with_elements(vec![1, 2, 1]).unwrap_err();
        assert!(matches!(err, BufferError::InvalidInput(_)));
    }

    #[test]
    fn test_buffer_sync_update_completes_before_return() {
        let mut buffer = Buffer::with_elements(vec![1, 2]).unwrap();
        let (log, completion) = counter();

        let handle = buffer.update(Some(vec![1, 2, 3]), true, Some(completion())).unwrap();

        assert_eq!(*log.borrow(), vec![handle.ticket()]);
        assert_eq!(buffer.displayed(), &[1, 2, 3]);
        let applied = handle.try_applied().unwrap();
        assert_eq!(applied.count, 3);
        assert_eq!(applied.script.counts().inserts, 1);
        assert!(buffer.is_idle());
    }

    #[test]
    fn test_buffer_none_on_empty_is_noop_but_completes() {
        let mut buffer: Buffer<u32> = Buffer::new();
        let (log, completion) = counter();

        let handle = buffer.update(None, true, Some(completion())).unwrap();

        assert_eq!(log.borrow().len(), 1);
        assert!(handle.try_applied().unwrap().script.is_empty());
        assert_eq!(buffer.count_displayed(), 0);
    }

    #[test]
    fn test_buffer_invalid_update_queues_nothing() {
        let mut buffer = Buffer::with_elements(vec![1]).unwrap();
        let err = buffer.update(Some(vec![2, 2]), true, None).unwrap_err();
        assert!(matches!(err, BufferError::InvalidInput(_)));
        assert!(buffer.is_idle());
        assert_eq!(buffer.displayed(), &[1]);
    }

    #[test]
    fn test_buffer_async_update_applies_on_wait() {
        let mut buffer = Buffer::with_elements(vec![1, 2, 3]).unwrap();
        let (log, completion) = counter();

        let handle = buffer.update(Some(vec![3, 2, 1]), false, Some(completion())).unwrap();
        assert!(buffer.wait_idle(TIMEOUT).unwrap());
        assert_eq!(buffer.in_flight(), 0);

        assert_eq!(buffer.displayed(), &[3, 2, 1]);
        assert_eq!(*log.borrow(), vec![handle.ticket()]);
        assert_eq!(handle.wait(TIMEOUT).unwrap().count, 3);
    }

    #[test]
    fn test_buffer_async_updates_apply_in_order() {
        let config = BufferConfig {
            workers: 4,
            ..BufferConfig::default()
        };
        let mut buffer = Buffer::with_config(config, vec![0u32]).unwrap();
        let mut mirror = Mirror {
            items: vec![0u32],
            tickets: Vec::new(),
        };
        let (log, completion) = counter();

        let mut expected = Vec::new();
        for round in 1..=40u32 {
            let target: Vec<u32> = if round % 2 == 0 {
                (0..round * 5).collect()
            } else {
                (0..round * 3).rev().collect()
            };
            let handle = buffer
                .update_into(Some(target), false, Some(completion()), &mut mirror)
                .unwrap();
            expected.push(handle.ticket());
            buffer.process_completed_into(&mut mirror).unwrap();
            assert_eq!(mirror.items.as_slice(), buffer.displayed());
        }

        assert!(buffer.wait_idle_into(TIMEOUT, &mut mirror).unwrap());
        assert_eq!(mirror.tickets, expected);
        assert_eq!(*log.borrow(), expected);
        assert_eq!(mirror.items, (0..200).collect::<Vec<_>>());
        assert_eq!(buffer.displayed(), mirror.items.as_slice());
    }

    #[test]
    fn test_buffer_sync_after_async_drains_first() {
        let mut buffer = Buffer::with_elements(vec![1u32]).unwrap();
        let mut mirror = Mirror {
            items: vec![1u32],
            tickets: Vec::new(),
        };

        let first = buffer.update_into(Some(vec![1, 2]), false, None, &mut mirror).unwrap();
        let second = buffer.update_into(Some(vec![2, 1, 3]), false, None, &mut mirror).unwrap();
        let third = buffer.update_into(Some(vec![3]), true, None, &mut mirror).unwrap();

        assert_eq!(mirror.tickets, vec![first.ticket(), second.ticket(), third.ticket()]);
        assert_eq!(buffer.displayed(), &[3]);
        assert_eq!(mirror.items, vec![3]);
        assert!(buffer.is_idle());
    }

    #[test]
    fn test_buffer_none_reasserts_latest_target() {
        let mut buffer = Buffer::with_elements(vec![1u32]).unwrap();
        buffer.update(Some(vec![1, 2]), false, None).unwrap();
        let reassert = buffer.update(None, false, None).unwrap();
        assert!(buffer.wait_idle(TIMEOUT).unwrap());

        assert!(reassert.try_applied().unwrap().script.is_empty());
        assert_eq!(buffer.displayed(), &[1, 2]);
    }

    #[test]
    fn test_buffer_snapshot_is_stable() {
        let mut buffer = Buffer::with_elements(vec![Keyed::new(1, "a")]).unwrap();
        let before = buffer.snapshot();
        buffer
            .update(Some(vec![Keyed::new(1, "b"), Keyed::new(2, "c")]), true, None)
            .unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(before[0].value, "a");
        assert_eq!(buffer.snapshot().len(), 2);
        assert_eq!(buffer.generation(), 1);
    }

    #[test]
    fn test_buffer_stale_outcome_is_recomputed() {
        let mut buffer = Buffer::with_elements(vec![1u32, 2]).unwrap();
        let mut mirror = Mirror {
            items: vec![1u32, 2],
            tickets: Vec::new(),
        };
        let (notify, _rx) = bounded(1);
        buffer.requests.insert(
            1,
            Request {
                on_complete: None,
                notify,
            },
        );
        buffer.next_ticket = 2;

        // Script computed against a collection that was never displayed.
        let outcome = DiffOutcome {
            ticket: 1,
            base_generation: 42,
            target: Arc::new(vec![2, 3]),
            result: diff(&[9u32], &[2, 3]),
            elapsed: Duration::ZERO,
        };
        buffer.ready.insert(1, outcome);
        buffer.apply_ready(&mut mirror).unwrap();

        assert_eq!(mirror.items, vec![2, 3]);
        assert_eq!(buffer.displayed(), &[2, 3]);
    }

    fn outcome(ticket: Ticket, base_generation: u64, base: &[u32], target: Vec<u32>) -> DiffOutcome<u32> {
        DiffOutcome {
            ticket,
            base_generation,
            result: diff(base, &target),
            target: Arc::new(target),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_buffer_resequences_out_of_order_outcomes() {
        let mut buffer = Buffer::with_elements(vec![1u32]).unwrap();
        let mut mirror = Mirror {
            items: vec![1u32],
            tickets: Vec::new(),
        };
        for ticket in 1..=2 {
            let (notify, _rx) = bounded(1);
            buffer.requests.insert(
                ticket,
                Request {
                    on_complete: None,
                    notify,
                },
            );
        }
        buffer.next_ticket = 3;

        // The second update finishes first and has to wait for the first.
        buffer.receive(outcome(2, 1, &[1, 2], vec![1, 2, 3]));
        assert_eq!(buffer.apply_ready(&mut mirror).unwrap(), 0);
        assert!(mirror.tickets.is_empty());
        assert_eq!(buffer.displayed(), &[1]);
        assert_eq!(buffer.pending_updates(), 2);

        buffer.receive(outcome(1, 0, &[1], vec![1, 2]));
        assert_eq!(buffer.apply_ready(&mut mirror).unwrap(), 2);
        assert_eq!(mirror.tickets, vec![1, 2]);
        assert_eq!(buffer.displayed(), &[1, 2, 3]);
        assert_eq!(mirror.items, buffer.displayed());
        assert_eq!(buffer.generation(), 2);
        assert!(buffer.is_idle());
    }

    /// An item whose key cannot be computed on a diff worker thread.
    #[derive(Debug, Clone, PartialEq)]
    struct Fragile(u32);

    impl Diffable for Fragile {
        type Key = u32;

        fn diff_key(&self) -> u32 {
            let on_worker = std::thread::current()
                .name()
                .is_some_and(|name| name.starts_with("fragile-worker"));
            assert!(!(on_worker && self.0 == 666), "key of {:?} requested on a worker", self);
            self.0
        }

        fn content_eq(&self, other: &Self) -> bool {
            self == other
        }
    }

    fn fragile_buffer(workers: usize) -> Buffer<Fragile> {
        let config = BufferConfig {
            workers,
            thread_name: "fragile-worker".to_string(),
        };
        Buffer::with_config(config, vec![Fragile(1)]).unwrap()
    }

    #[test]
    fn test_buffer_recovers_from_dead_workers() {
        let mut buffer = fragile_buffer(1);
        let mut mirror = Mirror {
            items: vec![Fragile(1)],
            tickets: Vec::new(),
        };

        let first = buffer
            .update_into(Some(vec![Fragile(1), Fragile(666)]), false, None, &mut mirror)
            .unwrap();
        assert!(buffer.wait_idle_into(TIMEOUT, &mut mirror).unwrap());
        assert_eq!(buffer.displayed(), &[Fragile(1), Fragile(666)]);
        assert!(first.try_applied().is_some());

        // The respawned worker dies on this one too; the sync update drains it.
        let second = buffer
            .update_into(Some(vec![Fragile(666), Fragile(2)]), false, None, &mut mirror)
            .unwrap();
        let third = buffer
            .update_into(Some(vec![Fragile(3)]), true, None, &mut mirror)
            .unwrap();

        assert_eq!(mirror.tickets, vec![first.ticket(), second.ticket(), third.ticket()]);
        assert!(second.try_applied().is_some());
        assert_eq!(buffer.displayed(), &[Fragile(3)]);
        assert_eq!(mirror.items, buffer.displayed());
        assert!(buffer.is_idle());
        assert_eq!(buffer.in_flight(), 0);

        // Later updates get fresh workers.
        buffer
            .update_into(Some(vec![Fragile(3), Fragile(4)]), false, None, &mut mirror)
            .unwrap();
        assert!(buffer.wait_idle_into(TIMEOUT, &mut mirror).unwrap());
        assert_eq!(buffer.displayed(), &[Fragile(3), Fragile(4)]);
        assert_eq!(mirror.items, buffer.displayed());
    }

    #[test]
    fn test_buffer_recovers_when_one_of_many_workers_dies() {
        let mut buffer = fragile_buffer(3);
        let handle = buffer.update(Some(vec![Fragile(666)]), false, None).unwrap();

        assert!(buffer.wait_idle(TIMEOUT).unwrap());
        assert_eq!(buffer.displayed(), &[Fragile(666)]);
        assert!(handle.try_applied().is_some());
    }
}
