//! Core feed logic: fetch throttling, score/clock normalization, cross-provider
//! merging, and in-memory totals history.
//!
//! Everything in this crate is synchronous and side-effect free; the binary's
//! service layer owns the clients, the clock, and the locking.

pub mod history;
pub mod merge;
pub mod names;
pub mod normalize;
pub mod odds;
pub mod throttle;

pub use history::HistoryRecorder;
pub use merge::{build_clock_map, merge_clock, normalize_and_merge};
pub use normalize::normalize_event;
pub use odds::assemble_rows;
pub use throttle::{FetchDecision, ResourceGate};
