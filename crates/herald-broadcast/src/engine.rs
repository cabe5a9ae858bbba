//! Broadcast engine — owns the trigger set and the lifecycle of the single
//! background loop.
//!
//! Invariant: at most one loop is ever running. Installing a new schedule
//! cancels the old loop and awaits its termination before spawning the
//! replacement, so two dispatch cycles can never race on the same minute.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use herald_catalog::Catalog;
use herald_core::error::Result;
use herald_core::traits::Transport;
use herald_core::types::RecipientId;

use crate::clock;
use crate::dispatch::{DispatchOutcome, dispatch};
use crate::trigger::{self, TriggerTime, format_schedule};

/// Pause after a failed dispatch cycle before the loop realigns and retries.
const CYCLE_RETRY_SECS: u64 = 60;

struct RunningLoop {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct EngineState {
    triggers: Vec<TriggerTime>,
    running: Option<RunningLoop>,
}

/// The scheduler controller. Shared state (catalog, exclusion set) is read by
/// the background loop and written by the operator command surface; reads are
/// eventually consistent, which is fine for a best-effort broadcast.
pub struct BroadcastEngine {
    transport: Arc<dyn Transport>,
    catalog: Arc<RwLock<Catalog>>,
    excluded: Arc<RwLock<HashSet<RecipientId>>>,
    jitter_secs: RangeInclusive<u64>,
    state: Mutex<EngineState>,
}

impl BroadcastEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        catalog: Arc<RwLock<Catalog>>,
        excluded: Arc<RwLock<HashSet<RecipientId>>>,
        jitter_secs: RangeInclusive<u64>,
    ) -> Self {
        Self {
            transport,
            catalog,
            excluded,
            jitter_secs,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Install a new schedule from a comma-separated `HH:MM` batch.
    ///
    /// Parsing is atomic: any malformed token rejects the whole batch and
    /// leaves the previous schedule (and its loop) untouched. A valid
    /// non-empty batch replaces the running loop; an empty one disarms.
    /// Returns the installed (deduplicated, sorted) trigger set.
    pub async fn set_triggers(&self, spec: &str) -> Result<Vec<TriggerTime>> {
        let triggers = trigger::parse_batch(spec)?;

        let mut state = self.state.lock().await;
        Self::halt(&mut state).await;
        state.triggers = triggers.clone();
        if triggers.is_empty() {
            tracing::info!("Schedule cleared, broadcast loop idle");
        } else {
            tracing::info!("Schedule armed: {}", format_schedule(&triggers));
            state.running = Some(self.spawn_loop(triggers.clone()));
        }
        Ok(triggers)
    }

    /// Stop the background loop and clear the schedule. Returns false when
    /// there was nothing to stop.
    pub async fn stop(&self) -> bool {
        let mut state = self.state.lock().await;
        state.triggers.clear();
        if state.running.is_some() {
            Self::halt(&mut state).await;
            tracing::info!("Broadcast schedule stopped");
            true
        } else {
            false
        }
    }

    /// Read-only snapshot of the current trigger set.
    pub async fn schedule(&self) -> Vec<TriggerTime> {
        self.state.lock().await.triggers.clone()
    }

    /// Whether a background loop is currently running.
    pub async fn is_armed(&self) -> bool {
        self.state.lock().await.running.is_some()
    }

    /// Run one dispatch cycle immediately, outside the schedule.
    pub async fn broadcast_once(&self) -> Result<DispatchOutcome> {
        let payloads = self.catalog.read().await.payloads().to_vec();
        let excluded = self.excluded.read().await.clone();
        let mut rng = StdRng::from_entropy();
        dispatch(
            self.transport.as_ref(),
            &payloads,
            &excluded,
            &mut rng,
            self.jitter_secs.clone(),
            &CancellationToken::new(),
        )
        .await
    }

    /// Stop the loop without clearing triggers; used at process shutdown.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        Self::halt(&mut state).await;
    }

    /// Cancel the running loop, if any, and wait for it to acknowledge.
    async fn halt(state: &mut EngineState) {
        if let Some(running) = state.running.take() {
            running.token.cancel();
            let _ = running.handle.await;
        }
    }

    fn spawn_loop(&self, triggers: Vec<TriggerTime>) -> RunningLoop {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let transport = self.transport.clone();
        let catalog = self.catalog.clone();
        let excluded = self.excluded.clone();
        let jitter_secs = self.jitter_secs.clone();
        let handle = tokio::spawn(async move {
            run_loop(transport, catalog, excluded, jitter_secs, triggers, loop_token).await;
        });
        RunningLoop { token, handle }
    }
}

/// The background loop: check the wall clock, dispatch when a trigger
/// matches, then sleep to the next minute boundary. Long-running and
/// self-healing; exits only on cancellation.
async fn run_loop(
    transport: Arc<dyn Transport>,
    catalog: Arc<RwLock<Catalog>>,
    excluded: Arc<RwLock<HashSet<RecipientId>>>,
    jitter_secs: RangeInclusive<u64>,
    triggers: Vec<TriggerTime>,
    token: CancellationToken,
) {
    tracing::info!(
        "Broadcast loop started ({} via {})",
        format_schedule(&triggers),
        transport.name()
    );
    let mut rng = StdRng::from_entropy();

    loop {
        let now = Local::now();
        if trigger::due(&triggers, &now) {
            // Snapshot shared state, then release the locks before the slow
            // jittered fan-out.
            let payloads = catalog.read().await.payloads().to_vec();
            let excluded_now = excluded.read().await.clone();

            match dispatch(
                transport.as_ref(),
                &payloads,
                &excluded_now,
                &mut rng,
                jitter_secs.clone(),
                &token,
            )
            .await
            {
                Ok(outcome) => {
                    tracing::info!("Broadcast cycle complete: {outcome}");
                }
                Err(e) => {
                    tracing::warn!(
                        "Broadcast cycle failed ({e}), retrying in {CYCLE_RETRY_SECS}s"
                    );
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(CYCLE_RETRY_SECS)) => {}
                    }
                }
            }
        }

        // Realign from the post-dispatch clock so a long cycle cannot refire
        // within the same minute.
        let wait = clock::until_next_minute(&Local::now());
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }
    tracing::info!("Broadcast loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use herald_core::types::Payload;

    struct IdleTransport;

    #[async_trait]
    impl Transport for IdleTransport {
        fn name(&self) -> &str {
            "idle"
        }
        async fn list_recipients(&self) -> Result<Vec<RecipientId>> {
            Ok(Vec::new())
        }
        async fn send(&self, _to: &RecipientId, _payload: &Payload) -> Result<()> {
            Ok(())
        }
    }

    fn engine() -> BroadcastEngine {
        BroadcastEngine::new(
            Arc::new(IdleTransport),
            Arc::new(RwLock::new(Catalog::new())),
            Arc::new(RwLock::new(HashSet::new())),
            0..=0,
        )
    }

    #[tokio::test]
    async fn test_set_triggers_dedupes_and_arms() {
        let engine = engine();
        let installed = engine.set_triggers("14:30,09:00,09:00").await.unwrap();
        assert_eq!(format_schedule(&installed), "09:00, 14:30");
        assert_eq!(engine.schedule().await, installed);
        assert!(engine.is_armed().await);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_batch_leaves_schedule_untouched() {
        let engine = engine();
        engine.set_triggers("09:00").await.unwrap();

        let err = engine.set_triggers("10:00,25:61").await.unwrap_err();
        assert!(err.to_string().contains("25:61"));
        assert_eq!(format_schedule(&engine.schedule().await), "09:00");
        assert!(engine.is_armed().await);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_reschedule_replaces_loop() {
        let engine = engine();
        engine.set_triggers("09:00").await.unwrap();
        engine.set_triggers("10:00,11:00").await.unwrap();
        assert_eq!(format_schedule(&engine.schedule().await), "10:00, 11:00");
        assert!(engine.is_armed().await);

        // Empty batch disarms.
        engine.set_triggers("").await.unwrap();
        assert!(engine.schedule().await.is_empty());
        assert!(!engine.is_armed().await);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let engine = engine();
        assert!(!engine.stop().await, "stop on an idle engine is a no-op");

        engine.set_triggers("09:00").await.unwrap();
        assert!(engine.stop().await);
        assert!(engine.schedule().await.is_empty());
        assert!(!engine.is_armed().await);
        assert!(!engine.stop().await);
    }

    #[tokio::test]
    async fn test_broadcast_once_with_nothing_to_do() {
        let engine = engine();
        let outcome = engine.broadcast_once().await.unwrap();
        assert_eq!(outcome, DispatchOutcome::default());
    }
}
