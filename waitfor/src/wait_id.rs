use std::fmt;

/// Identifier of a wait issued by a [`Tracker`](crate::Tracker).
///
/// Allocated from a per-tracker counter on every call to
/// [`Tracker::wait_for`](crate::Tracker::wait_for), whether or not the wait
/// had to be registered. Only uniqueness within one tracker is guaranteed;
/// [`Tracker::reset`](crate::Tracker::reset) does not rewind the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WaitId(u64);

impl WaitId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<WaitId> for u64 {
    fn from(value: WaitId) -> Self {
        value.0
    }
}

impl fmt::Display for WaitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wait-{}", self.0)
    }
}
