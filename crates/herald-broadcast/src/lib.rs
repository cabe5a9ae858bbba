//! # Herald Broadcast
//!
//! The scheduler/dispatcher core: fires at configured wall-clock minutes and
//! delivers one randomly chosen payload to every eligible recipient.
//!
//! ## Architecture
//! ```text
//! BroadcastEngine (one background tokio task, CancellationToken lifecycle)
//!   └── each aligned minute:
//!         trigger match (hour+minute)
//!           → list_recipients → eligibility filter (exclusion set)
//!           → pick one payload uniformly at random
//!           → sequential fan-out, 1–3s jitter before every send,
//!             per-recipient failure isolation
//!           → DispatchOutcome {sent, failed}
//! ```
//!
//! The loop is self-healing: a failed cycle is logged and retried after a
//! fixed pause instead of killing the task. Cancellation is cooperative and
//! observed at every sleep.

pub mod clock;
pub mod dispatch;
pub mod eligibility;
pub mod engine;
pub mod trigger;

pub use dispatch::{DispatchOutcome, dispatch};
pub use engine::BroadcastEngine;
pub use trigger::TriggerTime;
