use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::{sync::oneshot, time::Instant};

use crate::{
    Action, ActionLog, Recorded, TrackerConfig, WaitFor, WaitId, wait::deadline_after,
};

/// Records dispatched actions and resolves waits on them.
///
/// The tracker provides:
/// - Interception via [`intercept`](Self::intercept) or its [`Middleware`](crate::Middleware) impl
/// - Retroactive queries via [`match_recorded`](Self::match_recorded) and [`recorded_actions`](Self::recorded_actions)
/// - Prospective queries via [`wait_for`](Self::wait_for)
/// - Clean-up between test phases via [`reset`](Self::reset)
///
/// `Tracker` is a cheap handle: clones share the same log and pending
/// waits, so one clone can live in the pipeline while another is used by
/// the test. Separately constructed trackers share nothing.
///
/// # Example
///
/// ```ignore
/// let tracker = Tracker::<AppAction>::new();
/// let store = Pipeline::new(AppState::default(), reduce).with_middleware(tracker.clone());
///
/// store.dispatch(AppAction::Login(user));
/// let matched = tracker.wait_for(["Login", "SessionStarted"]).await?;
/// ```
pub struct Tracker<A: Action> {
    inner: Arc<Inner<A>>,
}

struct Inner<A: Action> {
    config: TrackerConfig,
    state: Mutex<State<A>>,
}

pub(crate) type Resolver<A> = oneshot::Sender<Vec<Recorded<A>>>;

struct PendingWait<A: Action> {
    kinds: Vec<String>,
    deadline: Instant,
    resolver: Resolver<A>,
}

struct State<A: Action> {
    log: ActionLog<A>,
    // Keyed by id, so iteration follows registration order.
    pending: BTreeMap<WaitId, PendingWait<A>>,
    next_id: u64,
    generation: u64,
}

impl<A: Action> State<A> {
    fn new() -> Self {
        Self {
            log: ActionLog::new(),
            pending: BTreeMap::new(),
            next_id: 0,
            generation: 0,
        }
    }

    fn allocate_id(&mut self) -> WaitId {
        self.next_id += 1;
        WaitId::new(self.next_id)
    }

    /// Resolve every pending wait the current log satisfies.
    ///
    /// Walks a snapshot of the ids registered when the pass starts. Each
    /// satisfied wait leaves the pending set before its resolver fires.
    /// Waits whose deadline is at or before `now` are removed unresolved:
    /// the deadline came first, even if the wait has not been polled since.
    fn resolve_satisfied(&mut self, now: Instant) -> usize {
        let ids: Vec<WaitId> = self.pending.keys().copied().collect();
        let mut resolved = 0;
        for id in ids {
            let Some(wait) = self.pending.get(&id) else {
                continue;
            };
            if wait.deadline <= now {
                if let Some(wait) = self.pending.remove(&id) {
                    tracing::trace!(wait_id = %id, kinds = ?wait.kinds, "wait expired unpolled");
                }
                continue;
            }
            let Some(matches) = self.log.match_kinds(&wait.kinds) else {
                continue;
            };
            if let Some(wait) = self.pending.remove(&id) {
                tracing::trace!(wait_id = %id, kinds = ?wait.kinds, "wait resolved");
                // The receiver may already be gone if the wait was dropped.
                let _ = wait.resolver.send(matches);
                resolved += 1;
            }
        }
        resolved
    }
}

impl<A: Action> Clone for Tracker<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: Action> Default for Tracker<A> {
    fn default() -> Self {
        Self::with_config(TrackerConfig::default())
    }
}

impl<A: Action> fmt::Debug for Tracker<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Tracker")
            .field("config", &self.inner.config)
            .field("recorded", &state.log.len())
            .field("pending", &state.pending.len())
            .field("generation", &state.generation)
            .finish()
    }
}

impl<A: Action> Tracker<A> {
    /// Create a tracker with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker with the given configuration.
    pub fn with_config(config: TrackerConfig) -> Self {
        if config.verbose() {
            tracing::info!(
                default_timeout = ?config.default_timeout(),
                "action tracker created"
            );
        }
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(State::new()),
            }),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, State<A>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Recording ====================

    /// Append an action to the log and notify pending waits.
    ///
    /// The action is fully appended before any wait is evaluated. Waits
    /// satisfied by the new log are resolved and removed; the rest stay
    /// pending.
    pub fn record(&self, action: A) {
        if self.inner.config.verbose() {
            tracing::info!(kind = %action.kind(), "received action");
        }

        let mut state = self.lock();
        state.log.push(action);
        if !state.pending.is_empty() {
            let resolved = state.resolve_satisfied(Instant::now());
            tracing::trace!(
                resolved,
                still_pending = state.pending.len(),
                "notified pending waits"
            );
        }
    }

    /// Record `action`, then pass it on to `next`.
    ///
    /// This is the pipeline hook: `next` continues the dispatch and
    /// whatever it returns is handed back unchanged. Waits resolved by
    /// `action` are resolved before `next` runs.
    pub fn intercept<R>(&self, action: A, next: impl FnOnce(A) -> R) -> R {
        self.record(action.clone());
        next(action)
    }

    // ==================== Querying ====================

    /// Match a list of kinds against the actions recorded so far.
    ///
    /// Each kind resolves to the earliest recorded action of that kind, in
    /// the order requested. Returns `None` if any kind was never recorded.
    pub fn match_recorded<K: AsRef<str>>(&self, kinds: &[K]) -> Option<Vec<Recorded<A>>> {
        self.lock().log.match_kinds(kinds)
    }

    /// Returns the current log, oldest first.
    pub fn recorded_actions(&self) -> Vec<Recorded<A>> {
        self.lock().log.snapshot()
    }

    /// Returns the number of recorded actions.
    pub fn recorded_count(&self) -> usize {
        self.lock().log.len()
    }

    /// Returns the number of registered waits whose deadline has not
    /// passed yet.
    pub fn pending_count(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .pending
            .values()
            .filter(|wait| wait.deadline > now)
            .count()
    }

    // ==================== Waiting ====================

    /// Wait for every kind in `kinds` to be recorded.
    ///
    /// The log is checked right away. If every kind is already there, the
    /// returned [`WaitFor`] completes on first poll without registering
    /// anything. Otherwise a wait is registered now and the deadline,
    /// [`TrackerConfig::default_timeout`] unless overridden with
    /// [`WaitFor::within`], counts from this call.
    ///
    /// An empty `kinds` list is satisfied immediately.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Default timeout
    /// let matched = tracker.wait_for(["Login", "Redirect"]).await?;
    /// assert_eq!(matched[0].kind(), "Login");
    ///
    /// // Custom timeout
    /// tracker.wait_for(["Saved"]).within(Duration::from_millis(100)).await?;
    /// ```
    pub fn wait_for<I, K>(&self, kinds: I) -> WaitFor<A>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let kinds: Vec<String> = kinds.into_iter().map(Into::into).collect();
        let timeout = self.inner.config.default_timeout();
        let started = Instant::now();

        let mut state = self.lock();
        let id = state.allocate_id();

        if let Some(matches) = state.log.match_kinds(&kinds) {
            tracing::trace!(wait_id = %id, kinds = ?kinds, "wait satisfied from log");
            return WaitFor::ready(id, kinds, started, timeout, matches);
        }

        let (tx, rx) = oneshot::channel();
        state.pending.insert(
            id,
            PendingWait {
                kinds: kinds.clone(),
                deadline: deadline_after(started, timeout),
                resolver: tx,
            },
        );
        let generation = state.generation;
        drop(state);

        tracing::trace!(wait_id = %id, kinds = ?kinds, "wait registered");
        WaitFor::pending(self.clone(), id, generation, kinds, started, timeout, rx)
    }

    /// Move the deadline of a pending wait. No-op once it left the pending
    /// set or belongs to an earlier generation.
    pub(crate) fn reschedule(&self, id: WaitId, generation: u64, deadline: Instant) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        if let Some(wait) = state.pending.get_mut(&id) {
            wait.deadline = deadline;
        }
    }

    /// Remove a pending wait, unless it already left the pending set.
    ///
    /// Returns `true` if this call removed it. Waits from before the last
    /// [`reset`](Self::reset) are never touched.
    pub(crate) fn withdraw(&self, id: WaitId, generation: u64) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        state.pending.remove(&id).is_some()
    }

    // ==================== Reset ====================

    /// Clear the log and drop every pending wait.
    ///
    /// Both happen under one lock, so no caller observes a half-reset
    /// tracker. Waits that were pending can no longer be resolved; they
    /// fail with [`Error::Timeout`](crate::Error::Timeout) when their
    /// deadline elapses.
    pub fn reset(&self) {
        let mut state = self.lock();
        let dropped = state.pending.len();
        state.log.clear();
        state.pending.clear();
        state.generation += 1;
        tracing::trace!(
            dropped_waits = dropped,
            generation = state.generation,
            "tracker reset"
        );
    }

    /// Alias for [`reset`](Self::reset).
    pub fn clean(&self) {
        self.reset();
    }

    // ==================== Debugging ====================

    /// Print all recorded actions to stdout for debugging.
    ///
    /// Formatting runs under the tracker's lock; a `Debug` impl must not
    /// call back into the tracker.
    pub fn dump(&self)
    where
        A: fmt::Debug,
    {
        let state = self.lock();
        if state.log.is_empty() {
            println!("(no actions recorded)");
            return;
        }
        println!("Recorded actions ({}):", state.log.len());
        for (i, action) in state.log.iter().enumerate() {
            println!("  {}: [{}] {:?}", i, action.kind(), action);
        }
        if !state.pending.is_empty() {
            println!("Pending waits ({}):", state.pending.len());
            for (id, wait) in &state.pending {
                println!("  {}: {:?}", id, wait.kinds);
            }
        }
    }
}
