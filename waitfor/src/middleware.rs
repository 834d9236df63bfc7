use std::{fmt, sync::Arc};

use crate::{Action, Tracker};

/// A stage in a dispatch pipeline.
///
/// Each stage receives the action and the rest of the chain as [`Next`].
/// A stage may inspect the action, replace it, or skip the rest of the
/// chain entirely by not calling [`Next::run`].
///
/// # Example
///
/// ```rust
/// # use waitfor::{Action, Middleware, Next};
/// struct Logger;
///
/// impl<A: Action> Middleware<A> for Logger {
///     fn handle(&self, action: A, next: Next<'_, A>) -> A {
///         println!("dispatching {}", action.kind());
///         next.run(action)
///     }
/// }
/// ```
pub trait Middleware<A: Action>: Send + Sync {
    fn handle(&self, action: A, next: Next<'_, A>) -> A;
}

/// The remainder of a middleware chain.
pub struct Next<'a, A: Action> {
    chain: &'a [Arc<dyn Middleware<A>>],
    terminal: &'a dyn Fn(A) -> A,
}

impl<'a, A: Action> Next<'a, A> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware<A>>], terminal: &'a dyn Fn(A) -> A) -> Self {
        Self { chain, terminal }
    }

    /// Continue the dispatch with the next stage.
    pub fn run(self, action: A) -> A {
        match self.chain.split_first() {
            Some((stage, rest)) => stage.handle(action, Next::new(rest, self.terminal)),
            None => (self.terminal)(action),
        }
    }
}

impl<A: Action> fmt::Debug for Next<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.chain.len())
            .finish_non_exhaustive()
    }
}

impl<A: Action> Middleware<A> for Tracker<A> {
    fn handle(&self, action: A, next: Next<'_, A>) -> A {
        self.intercept(action, |action| next.run(action))
    }
}
