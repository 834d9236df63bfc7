#![cfg_attr(docsrs, feature(doc_cfg))]
//! # waitfor
//!
//! Record the actions flowing through a dispatch pipeline and await their
//! arrival from test code.
//!
//! A [`Tracker`] sits in the pipeline as a [`Middleware`]. Every action it
//! sees is appended to an in-memory log. Tests then ask, either
//! retroactively or prospectively, whether a set of action kinds has shown
//! up:
//!
//! - [`Tracker::match_recorded`] looks at what was already recorded.
//! - [`Tracker::wait_for`] resolves immediately when the kinds are already
//!   present, otherwise waits until they arrive or the deadline elapses.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::{borrow::Cow, time::Duration};
//! use waitfor::*;
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//!     Saved(u32),
//! }
//!
//! impl Action for CounterAction {
//!     fn kind(&self) -> Cow<'_, str> {
//!         Cow::Borrowed(match self {
//!             CounterAction::Increment => "Increment",
//!             CounterAction::Saved(_) => "Saved",
//!         })
//!     }
//! }
//!
//! #[tokio::test]
//! async fn saves_after_increment() -> Result {
//!     let tracker = Tracker::<CounterAction>::new();
//!     let store = Pipeline::new(0u32, |count, action| {
//!         if let CounterAction::Increment = action {
//!             *count += 1;
//!         }
//!     })
//!     .with_middleware(tracker.clone());
//!
//!     store.dispatch(CounterAction::Increment);
//!     spawn_autosave(store.clone()); // dispatches `Saved` later
//!
//!     let matched = tracker
//!         .wait_for(["Increment", "Saved"])
//!         .within(Duration::from_millis(500))
//!         .await?;
//!     assert!(matches!(*matched[1], CounterAction::Saved(1)));
//!     Ok(())
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Action`] | Trait for dispatched actions, exposes the `kind` tag used for matching |
//! | [`Tracker`] | Records actions and resolves pending waits |
//! | [`WaitFor`] | Builder returned by [`Tracker::wait_for`], awaitable |
//! | [`Wait`] | The future behind a [`WaitFor`] |
//! | [`Middleware`] | A stage in a dispatch pipeline |
//! | [`Pipeline`] | Minimal store: state, reducer and middleware chain |
//! | [`TrackerConfig`] | Verbose flag and default timeout |
//!
//! ## Features
//!
//! - **`serde`** - [`RawAction`], an untyped action with a JSON payload, and
//!   serde support for [`TrackerConfig`]

mod action;
mod action_log;
mod config;
mod error;
mod middleware;
mod pipeline;
mod tracker;
mod wait;
mod wait_id;

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod raw_action;

pub use action::Action;
pub use action_log::ActionLog;
pub use config::TrackerConfig;
pub use error::Error;
pub use middleware::{Middleware, Next};
pub use pipeline::Pipeline;
pub use tracker::Tracker;
pub use wait::{DEFAULT_WAIT_TIMEOUT, Wait, WaitFor};
pub use wait_id::WaitId;

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub use raw_action::RawAction;

/// Actions as stored in the log and handed back by matches.
pub type Recorded<A> = std::sync::Arc<A>;

/// Convenience alias for `Result<T, waitfor::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
