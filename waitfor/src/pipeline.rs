use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{Action, Middleware, Next};

type Reducer<A, S> = Box<dyn Fn(&mut S, &A) + Send + Sync>;

/// A minimal store: state, a reducer and an ordered middleware chain.
///
/// [`dispatch`](Self::dispatch) runs the action through every middleware in
/// registration order; the last stage applies the reducer to the state.
/// Use it to drive a [`Tracker`](crate::Tracker) the same way an
/// application's store would.
///
/// # Example
///
/// ```rust
/// use waitfor::{Pipeline, Tracker};
///
/// let tracker = Tracker::<&'static str>::new();
/// let store = Pipeline::new(0u32, |count, action: &&'static str| {
///     if *action == "Increment" {
///         *count += 1;
///     }
/// })
/// .with_middleware(tracker.clone());
///
/// store.dispatch("Increment");
/// store.dispatch("Increment");
///
/// assert_eq!(store.state(), 2);
/// assert_eq!(tracker.recorded_count(), 2);
/// ```
pub struct Pipeline<A: Action, S> {
    state: Mutex<S>,
    reducer: Reducer<A, S>,
    middleware: Vec<Arc<dyn Middleware<A>>>,
}

impl<A: Action, S> fmt::Debug for Pipeline<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

impl<A: Action, S: Send> Pipeline<A, S> {
    /// Create a pipeline with no middleware.
    pub fn new<F>(initial: S, reducer: F) -> Self
    where
        F: Fn(&mut S, &A) + Send + Sync + 'static,
    {
        Self {
            state: Mutex::new(initial),
            reducer: Box::new(reducer),
            middleware: Vec::new(),
        }
    }

    /// Append a middleware stage. Stages run in the order they were added.
    pub fn with_middleware<M: Middleware<A> + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `action` through the middleware chain and the reducer.
    ///
    /// Returns whatever the chain returns: the action itself unless a stage
    /// replaced it.
    pub fn dispatch(&self, action: A) -> A {
        let reduce = |action: A| {
            let mut state = self.lock();
            (self.reducer)(&mut *state, &action);
            action
        };
        Next::new(&self.middleware, &reduce).run(action)
    }

    /// Returns a clone of the current state.
    pub fn state(&self) -> S
    where
        S: Clone,
    {
        self.lock().clone()
    }

    /// Inspect the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock())
    }
}
