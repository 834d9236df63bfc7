//! Counter Example - Waiting on Side Effects
//!
//! A counter store with an "autosave" effect: every `Increment` is followed,
//! a little later, by a `Saved` action dispatched from a background task.
//! The tracker sits in the store's middleware chain and lets the caller
//! wait for the save instead of sleeping for a guessed duration.
//!
//! Run with `RUST_LOG=trace` to see wait registration and resolution.

use std::{
    borrow::Cow,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tracing_subscriber::EnvFilter;
use waitfor::{Action, Middleware, Next, Pipeline, Result, Tracker, TrackerConfig};

#[derive(Clone, Debug)]
enum CounterAction {
    Increment,
    Saved(u32),
}

impl Action for CounterAction {
    fn kind(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self {
            CounterAction::Increment => "Increment",
            CounterAction::Saved(_) => "Saved",
        })
    }
}

// Middleware that counts dispatches, to show a chain with more than one stage.
struct DispatchCounter(Arc<AtomicUsize>);

impl Middleware<CounterAction> for DispatchCounter {
    fn handle(&self, action: CounterAction, next: Next<'_, CounterAction>) -> CounterAction {
        self.0.fetch_add(1, Ordering::Relaxed);
        next.run(action)
    }
}

fn reduce(count: &mut u32, action: &CounterAction) {
    if let CounterAction::Increment = action {
        *count += 1;
    }
}

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let tracker = Tracker::with_config(TrackerConfig::default().with_verbose(true));
    let dispatches = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(
        Pipeline::new(0u32, reduce)
            .with_middleware(DispatchCounter(dispatches.clone()))
            .with_middleware(tracker.clone()),
    );

    store.dispatch(CounterAction::Increment);

    // Autosave effect
    let effects = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let count = effects.state();
        effects.dispatch(CounterAction::Saved(count));
    });

    let matched = tracker.wait_for(["Increment", "Saved"]).await?;
    println!("matched: {matched:?}");

    // Already recorded, resolves without waiting.
    tracker.wait_for(["Saved"]).await?;

    // Nothing dispatches a second save.
    tracker.reset();
    match tracker
        .wait_for(["Saved"])
        .within(Duration::from_millis(200))
        .await
    {
        Ok(_) => println!("unexpected save"),
        Err(e) => println!("as expected: {e}"),
    }

    println!(
        "count = {}, dispatches = {}",
        store.state(),
        dispatches.load(Ordering::Relaxed)
    );
    Ok(())
}
