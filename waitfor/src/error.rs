use std::time::Duration;

/// The single error type for waitfor operations.
///
/// Recording, matching and resetting never fail. The only fallible
/// operation is awaiting a [`WaitFor`](crate::WaitFor), which reports
/// [`Error::Timeout`] when its deadline elapses first.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(
        "one of the following actions was not dispatched within {timeout:?}: [{}]",
        .kinds.join(", ")
    )]
    Timeout {
        /// The kinds originally requested, in request order.
        kinds: Vec<String>,
        timeout: Duration,
    },
}

impl Error {
    pub(crate) fn timeout(kinds: Vec<String>, timeout: Duration) -> Self {
        Error::Timeout { kinds, timeout }
    }

    /// Returns the kinds the failed wait was asking for.
    pub fn kinds(&self) -> &[String] {
        match self {
            Error::Timeout { kinds, .. } => kinds,
        }
    }
}
