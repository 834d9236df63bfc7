//! Raw Actions Example
//!
//! Drives a tracker with untyped JSON actions, as they would arrive from a
//! bridge to another process. Requires the `serde` feature:
//!
//! ```sh
//! cargo run --example raw-actions --features serde
//! ```

use std::time::Duration;

use serde_json::json;
use waitfor::{RawAction, Result, Tracker};

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let tracker = Tracker::<RawAction>::new();

    let incoming = [
        json!({ "type": "session/opened", "user": "ada" }),
        json!({ "type": "cart/itemAdded", "sku": "A-17", "qty": 2 }),
        json!({ "type": "cart/itemAdded", "sku": "B-02", "qty": 1 }),
    ];

    let bridge = tracker.clone();
    tokio::spawn(async move {
        for value in incoming {
            tokio::time::sleep(Duration::from_millis(20)).await;
            match serde_json::from_value::<RawAction>(value) {
                Ok(action) => bridge.record(action),
                Err(e) => tracing::warn!("dropping malformed action: {}", e),
            }
        }
    });

    let matched = tracker
        .wait_for(["session/opened", "cart/itemAdded"])
        .within(Duration::from_secs(1))
        .await?;

    // The earliest `cart/itemAdded` wins.
    println!("first item: {}", matched[1].get("sku").unwrap_or(&json!(null)));
    Ok(())
}
