use std::borrow::Cow;

/// An action dispatched through a pipeline and observed by a [`Tracker`](crate::Tracker).
///
/// The tracker only ever looks at [`kind`](Action::kind): waits and matches
/// are expressed as lists of kinds, the rest of the action is payload that
/// is handed back untouched.
///
/// Actions must be `Send + Sync + Clone + 'static` because they:
/// - Are recorded as a clone while the original continues down the pipeline (Clone)
/// - Are shared as `Arc<A>` between the log and any resolved waits (Sync)
/// - May be recorded on one task and awaited on another (Send, 'static)
///
/// # Example
///
/// ```rust
/// use std::borrow::Cow;
/// use waitfor::Action;
///
/// #[derive(Clone, Debug)]
/// enum TodoAction {
///     Add(String),
///     Clear,
/// }
///
/// impl Action for TodoAction {
///     fn kind(&self) -> Cow<'_, str> {
///         Cow::Borrowed(match self {
///             TodoAction::Add(_) => "Add",
///             TodoAction::Clear => "Clear",
///         })
///     }
/// }
///
/// assert_eq!(TodoAction::Add("milk".into()).kind(), "Add");
/// ```
pub trait Action: Send + Sync + Clone + 'static {
    /// The type tag matched against by waits.
    ///
    /// Called while the tracker's lock is held, so it must not call back
    /// into the tracker.
    fn kind(&self) -> Cow<'_, str>;
}

impl Action for &'static str {
    fn kind(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Action for String {
    fn kind(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    enum TestAction {
        Load,
        Loaded(Vec<u8>),
    }

    impl Action for TestAction {
        fn kind(&self) -> Cow<'_, str> {
            match self {
                TestAction::Load => Cow::Borrowed("Load"),
                TestAction::Loaded(_) => Cow::Borrowed("Loaded"),
            }
        }
    }

    #[test]
    fn enum_kind_ignores_payload() {
        assert_eq!(TestAction::Load.kind(), "Load");
        assert_eq!(TestAction::Loaded(vec![1, 2]).kind(), "Loaded");
    }

    #[test]
    fn strings_are_their_own_kind() {
        assert_eq!("Ping".kind(), "Ping");
        assert_eq!(String::from("Pong").kind(), "Pong");
    }
}
