use std::time::Duration;

/// Configuration for a [`Tracker`](crate::Tracker).
///
/// Use the builder methods to customize, or [`Default`] for a quiet tracker
/// with a 2 second wait timeout.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use waitfor::TrackerConfig;
///
/// let config = TrackerConfig::default()
///     .with_verbose(true)                              // Log every received action
///     .with_default_timeout(Duration::from_millis(500)); // Fail waits sooner
/// assert!(config.verbose());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackerConfig {
    /// Emit an `info` line for every received action.
    /// Default: false
    verbose: bool,

    /// Deadline applied to waits that don't call [`WaitFor::within`](crate::WaitFor::within).
    /// Default: 2s
    default_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            verbose: false,
            default_timeout: crate::DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl TrackerConfig {
    /// Enable or disable per-action diagnostics.
    ///
    /// Purely observational: the tracker behaves the same either way.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Returns whether per-action diagnostics are enabled.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Set the timeout used by waits that don't override it.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Returns the timeout used by waits that don't override it.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}
