//! # Sentinel State - Snapshot Persistence
//!
//! Stores the full market context behind every alert that passes the cooler, so a
//! notification can link back to the exact candles, order book and analysis it was
//! based on.
//!
//! ## Storage Layout
//!
//! ```text
//! <snapshot dir>/
//!   ├── 3f0c…e1.json      one self-contained DataSnapshot per id
//!   └── 3f0c…e1.json.tmp  in-flight write, renamed into place when complete
//! ```
//!
//! Retention keeps at most `max_count` files (oldest modification time removed first)
//! and drops anything older than `max_age`.

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::SnapshotStore;
