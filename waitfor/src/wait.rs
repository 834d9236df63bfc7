use std::{
    fmt,
    future::{Future, IntoFuture},
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use tokio::{
    sync::oneshot,
    time::{Instant, Sleep},
};

use crate::{Action, Error, Recorded, Result, Tracker, WaitId};

/// Default deadline for [`Tracker::wait_for`].
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(2000);

// Roughly 30 years, as `tokio::time::sleep` uses for unrepresentable deadlines.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// The instant `timeout` after `start`, saturating to a far-future instant
/// when the sum does not fit.
pub(crate) fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

/// A wait issued by [`Tracker::wait_for`].
///
/// The fast path and the registration already happened when `wait_for`
/// returned; this builder only lets you adjust the deadline before
/// awaiting. The deadline counts from the `wait_for` call, not from the
/// first poll.
///
/// Resolves to the matched actions, one per requested kind in request
/// order, or fails with [`Error::Timeout`].
///
/// Dropping an unresolved `WaitFor` (or its [`Wait`]) removes the
/// registration from the tracker.
///
/// # Example
///
/// ```ignore
/// // Default 2-second deadline
/// tracker.wait_for(["FetchStarted", "FetchSucceeded"]).await?;
///
/// // Custom deadline
/// tracker.wait_for(["FetchFailed"])
///     .within(Duration::from_millis(200))
///     .await?;
/// ```
pub struct WaitFor<A: Action> {
    id: WaitId,
    kinds: Vec<String>,
    timeout: Duration,
    started: Instant,
    outcome: Outcome<A>,
}

enum Outcome<A: Action> {
    Ready(Vec<Recorded<A>>),
    Pending(Registration<A>),
}

/// A wait's membership in the tracker's pending set.
struct Registration<A: Action> {
    tracker: Tracker<A>,
    id: WaitId,
    generation: u64,
    receiver: Option<oneshot::Receiver<Vec<Recorded<A>>>>,
}

impl<A: Action> Registration<A> {
    /// Returns the matches if the tracker resolved this wait.
    fn poll_resolved(&mut self, cx: &mut Context<'_>) -> Option<Vec<Recorded<A>>> {
        let receiver = self.receiver.as_mut()?;
        match Pin::new(receiver).poll(cx) {
            Poll::Ready(Ok(matches)) => {
                self.receiver = None;
                Some(matches)
            }
            Poll::Ready(Err(_)) => {
                // Resolver dropped by a reset or by a record after the
                // deadline; only the deadline is left.
                self.receiver = None;
                None
            }
            Poll::Pending => None,
        }
    }

    fn reschedule(&self, deadline: Instant) {
        self.tracker.reschedule(self.id, self.generation, deadline);
    }

    /// Leave the pending set on deadline expiry.
    ///
    /// Resolution and removal happen under the same lock, so if the wait is
    /// already gone from the pending set its matches are already in the
    /// channel and win over the timeout.
    fn expire(&mut self) -> Option<Vec<Recorded<A>>> {
        if self.tracker.withdraw(self.id, self.generation) {
            return None;
        }
        self.receiver.take()?.try_recv().ok()
    }
}

impl<A: Action> Drop for Registration<A> {
    fn drop(&mut self) {
        if self.tracker.withdraw(self.id, self.generation) {
            tracing::trace!(wait_id = %self.id, "wait dropped before completion");
        }
    }
}

impl<A: Action> WaitFor<A> {
    pub(crate) fn ready(
        id: WaitId,
        kinds: Vec<String>,
        started: Instant,
        timeout: Duration,
        matches: Vec<Recorded<A>>,
    ) -> Self {
        Self {
            id,
            kinds,
            timeout,
            started,
            outcome: Outcome::Ready(matches),
        }
    }

    pub(crate) fn pending(
        tracker: Tracker<A>,
        id: WaitId,
        generation: u64,
        kinds: Vec<String>,
        started: Instant,
        timeout: Duration,
        receiver: oneshot::Receiver<Vec<Recorded<A>>>,
    ) -> Self {
        Self {
            id,
            kinds,
            timeout,
            started,
            outcome: Outcome::Pending(Registration {
                tracker,
                id,
                generation,
                receiver: Some(receiver),
            }),
        }
    }

    /// Override the default timeout.
    ///
    /// The new deadline still counts from the `wait_for` call and replaces
    /// the one the tracker holds for this wait.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        if let Outcome::Pending(registration) = &self.outcome {
            registration.reschedule(deadline_after(self.started, timeout));
        }
        self
    }

    pub fn id(&self) -> WaitId {
        self.id
    }

    /// The requested kinds, in request order.
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns true if the kinds were already recorded when the wait was
    /// issued. Such a wait completes on first poll.
    pub fn is_ready(&self) -> bool {
        matches!(self.outcome, Outcome::Ready(_))
    }
}

impl<A: Action> IntoFuture for WaitFor<A> {
    type Output = Result<Vec<Recorded<A>>>;
    type IntoFuture = Wait<A>;

    fn into_future(self) -> Self::IntoFuture {
        let state = match self.outcome {
            Outcome::Ready(matches) => WaitState::Ready(matches),
            Outcome::Pending(registration) => WaitState::Pending {
                registration,
                deadline: Box::pin(tokio::time::sleep_until(deadline_after(
                    self.started,
                    self.timeout,
                ))),
            },
        };
        Wait {
            id: self.id,
            kinds: self.kinds,
            timeout: self.timeout,
            state,
        }
    }
}

impl<A: Action> fmt::Debug for WaitFor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitFor")
            .field("id", &self.id)
            .field("kinds", &self.kinds)
            .field("timeout", &self.timeout)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

/// Future returned by awaiting a [`WaitFor`].
pub struct Wait<A: Action> {
    id: WaitId,
    kinds: Vec<String>,
    timeout: Duration,
    state: WaitState<A>,
}

enum WaitState<A: Action> {
    Ready(Vec<Recorded<A>>),
    Pending {
        registration: Registration<A>,
        deadline: Pin<Box<Sleep>>,
    },
    Done,
}

impl<A: Action> Future for Wait<A> {
    type Output = Result<Vec<Recorded<A>>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match std::mem::replace(&mut this.state, WaitState::Done) {
            WaitState::Ready(matches) => Poll::Ready(Ok(matches)),
            WaitState::Pending {
                mut registration,
                mut deadline,
            } => {
                if let Some(matches) = registration.poll_resolved(cx) {
                    return Poll::Ready(Ok(matches));
                }
                if deadline.as_mut().poll(cx).is_pending() {
                    this.state = WaitState::Pending {
                        registration,
                        deadline,
                    };
                    return Poll::Pending;
                }
                if let Some(matches) = registration.expire() {
                    return Poll::Ready(Ok(matches));
                }
                tracing::debug!(
                    wait_id = %this.id,
                    kinds = ?this.kinds,
                    timeout = ?this.timeout,
                    "wait timed out"
                );
                Poll::Ready(Err(Error::timeout(
                    std::mem::take(&mut this.kinds),
                    this.timeout,
                )))
            }
            WaitState::Done => panic!("`Wait` polled after completion"),
        }
    }
}

impl<A: Action> fmt::Debug for Wait<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            WaitState::Ready(_) => "ready",
            WaitState::Pending { .. } => "pending",
            WaitState::Done => "done",
        };
        f.debug_struct("Wait")
            .field("id", &self.id)
            .field("kinds", &self.kinds)
            .field("timeout", &self.timeout)
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, future::IntoFuture, time::Duration};

    use crate::{Action, Error, Tracker};

    #[derive(Clone, Debug, PartialEq)]
    struct Named(&'static str);

    impl Action for Named {
        fn kind(&self) -> Cow<'_, str> {
            Cow::Borrowed(self.0)
        }
    }

    #[test]
    fn within_overrides_timeout() {
        let tracker = Tracker::<Named>::new();
        let wait = tracker.wait_for(["Ping"]);
        assert_eq!(wait.timeout(), super::DEFAULT_WAIT_TIMEOUT);
        let wait = wait.within(Duration::from_millis(10));
        assert_eq!(wait.timeout(), Duration::from_millis(10));
        assert_eq!(wait.kinds(), ["Ping"]);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_counts_from_wait_for_call() {
        let tracker = Tracker::<Named>::new();
        let started = tokio::time::Instant::now();
        let wait = tracker.wait_for(["Ping"]).within(Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(80)).await;
        let result = wait.await;

        assert!(matches!(result, Err(Error::Timeout { .. })));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(180), "took {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn resolution_before_deadline_wins() {
        let tracker = Tracker::<Named>::new();
        let wait = tokio::spawn(
            tracker
                .wait_for(["Ping"])
                .within(Duration::from_millis(100))
                .into_future(),
        );

        tokio::time::sleep(Duration::from_millis(99)).await;
        tracker.record(Named("Ping"));

        let matched = wait.await.unwrap().unwrap();
        assert_eq!(*matched[0], Named("Ping"));
        assert_eq!(tracker.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn late_action_after_timeout_is_ignored() {
        let tracker = Tracker::<Named>::new();
        let wait = tokio::spawn(
            tracker
                .wait_for(["Ping"])
                .within(Duration::from_millis(50))
                .into_future(),
        );

        let result = wait.await.unwrap();
        assert_eq!(
            result.unwrap_err(),
            Error::Timeout {
                kinds: vec!["Ping".into()],
                timeout: Duration::from_millis(50),
            }
        );

        tracker.record(Named("Ping"));
        assert_eq!(tracker.pending_count(), 0);
        assert_eq!(tracker.recorded_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_timeout_still_waits() {
        let tracker = Tracker::<Named>::new();
        let wait = tokio::spawn(tracker.wait_for(["Ping"]).within(Duration::MAX).into_future());

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(tracker.pending_count(), 1);
        tracker.record(Named("Ping"));

        let matched = wait.await.unwrap().unwrap();
        assert_eq!(*matched[0], Named("Ping"));
    }

    #[test]
    fn deadline_saturates_instead_of_overflowing() {
        let start = tokio::time::Instant::now();
        let deadline = super::deadline_after(start, Duration::MAX);
        assert!(deadline > start + Duration::from_secs(86400 * 365));
        assert_eq!(
            super::deadline_after(start, Duration::from_millis(5)),
            start + Duration::from_millis(5)
        );
    }

    #[tokio::test]
    async fn spawned_waits_are_send() {
        let tracker = Tracker::<Named>::new();
        let waits: Vec<_> = ["A", "B", "C"]
            .into_iter()
            .map(|kind| tokio::spawn(tracker.wait_for([kind]).into_future()))
            .collect();

        for kind in ["C", "A", "B"] {
            tracker.record(Named(kind));
        }

        for (wait, kind) in waits.into_iter().zip(["A", "B", "C"]) {
            let matched = wait.await.unwrap().unwrap();
            assert_eq!(matched[0].kind(), kind);
        }
    }

    #[tokio::test]
    async fn debug_reports_state() {
        let tracker = Tracker::<Named>::new();
        let wait = tracker.wait_for(["Ping"]).into_future();
        assert!(format!("{wait:?}").contains("pending"));
    }
}
