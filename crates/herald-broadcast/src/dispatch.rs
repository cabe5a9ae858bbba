//! Fan-out dispatch — one broadcast cycle.
//!
//! Sequential by design: the jitter before every send (including the first)
//! is an outbound throttle, not an artifact. A failed send is counted and
//! logged, never allowed to abort delivery to the remaining recipients.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;

use herald_core::error::Result;
use herald_core::traits::Transport;
use herald_core::types::{Payload, RecipientId};

use crate::eligibility;

/// Tally of one dispatch cycle. Ephemeral; surfaced only through logs and
/// operator replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub sent: usize,
    pub failed: usize,
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} sent, {} failed", self.sent, self.failed)
    }
}

/// Run one broadcast cycle: enumerate recipients, filter, pick one payload
/// uniformly at random, deliver sequentially with jitter.
///
/// Returns early with `{0, 0}` when there is nothing to do (no eligible
/// recipients, or an empty catalog — no payload is even selected in the
/// former case). Enumeration failure propagates to the caller. Cancellation
/// observed during a jitter sleep ends the cycle with the counts so far.
pub async fn dispatch<T, R>(
    transport: &T,
    payloads: &[Payload],
    excluded: &HashSet<RecipientId>,
    rng: &mut R,
    jitter_secs: RangeInclusive<u64>,
    token: &CancellationToken,
) -> Result<DispatchOutcome>
where
    T: Transport + ?Sized,
    R: Rng,
{
    let all = transport.list_recipients().await?;
    let targets = eligibility::eligible(&all, excluded);
    if targets.is_empty() {
        tracing::debug!("No eligible recipients, skipping cycle");
        return Ok(DispatchOutcome::default());
    }

    let Some(payload) = payloads.choose(rng) else {
        tracing::debug!("Catalog is empty, skipping cycle");
        return Ok(DispatchOutcome::default());
    };

    let mut outcome = DispatchOutcome::default();
    for target in &targets {
        let pause = rng.gen_range(jitter_secs.clone());
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::info!("Dispatch cancelled mid-cycle ({outcome})");
                return Ok(outcome);
            }
            _ = tokio::time::sleep(Duration::from_secs(pause)) => {}
        }

        match transport.send(target, payload).await {
            Ok(()) => outcome.sent += 1,
            Err(e) => {
                outcome.failed += 1;
                tracing::warn!("Failed to deliver payload {} to {target}: {e}", payload.id);
            }
        }
    }
    Ok(outcome)
}
