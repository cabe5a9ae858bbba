//! The transport trait — what the broadcast core needs from a chat platform.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Payload, RecipientId};

/// A messaging transport that can enumerate delivery targets and send to them.
///
/// Implementations live in `herald-channels`; tests substitute mocks. The
/// dispatcher treats any `send` failure identically (count, log, continue),
/// so implementations should put the useful diagnostics in the error message.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Channel name for logging ("onebot", "mock", ...).
    fn name(&self) -> &str;

    /// Enumerate all known recipients, in a stable platform-defined order.
    async fn list_recipients(&self) -> Result<Vec<RecipientId>>;

    /// Deliver one payload to one recipient.
    async fn send(&self, to: &RecipientId, payload: &Payload) -> Result<()>;
}
