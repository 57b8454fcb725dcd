//! Bounded periodic scheduler driving the deposit pipeline.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{sync::Semaphore, task::JoinSet, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use zkbridge_client::SubmitOutcome;
use zkbridge_types::{DepositId, DepositRecord};

use crate::{
    feed::DepositFeed,
    metrics::{record_dispatch, set_in_flight},
    pipeline::DepositPipeline,
};

/// Deposit ids with a submission in flight.
#[derive(Debug, Clone, Default)]
struct InFlight {
    ids: Arc<Mutex<HashSet<DepositId>>>,
}

impl InFlight {
    fn ids(&self) -> MutexGuard<'_, HashSet<DepositId>> {
        // The set stays consistent even if a holder panicked.
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `deposit_id`; `None` if it is already in flight.
    fn claim(&self, deposit_id: &DepositId) -> Option<Claim> {
        let mut ids = self.ids();
        if !ids.insert(deposit_id.clone()) {
            return None;
        }
        set_in_flight(ids.len());
        Some(Claim {
            in_flight: self.clone(),
            deposit_id: deposit_id.clone(),
        })
    }
}

/// Releases the deposit id when the submission task ends, including on abort.
struct Claim {
    in_flight: InFlight,
    deposit_id: DepositId,
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut ids = self.in_flight.ids();
        ids.remove(&self.deposit_id);
        set_in_flight(ids.len());
    }
}

/// Pulls one deposit per tick and relays it in its own task.
///
/// At most `max_in_flight` submissions run at once; while saturated, ticks are skipped
/// without pulling from the feed. A deposit already in flight is not dispatched again.
/// Cancelling the shutdown token stops the loop and aborts in-flight submissions.
pub struct RelayerService {
    pipeline: Arc<DepositPipeline>,
    feed: Box<dyn DepositFeed>,
    interval_ms: u64,
    max_in_flight: usize,
}

impl RelayerService {
    /// Creates the service.
    pub fn new(
        pipeline: Arc<DepositPipeline>,
        feed: Box<dyn DepositFeed>,
        interval_ms: u64,
        max_in_flight: usize,
    ) -> Self {
        Self {
            pipeline,
            feed,
            interval_ms: interval_ms.max(1),
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Runs until `shutdown_token` is cancelled.
    pub async fn run(mut self, shutdown_token: CancellationToken) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let in_flight = InFlight::default();
        let mut tasks = JoinSet::new();

        info!(
            interval_ms = self.interval_ms,
            max_in_flight = self.max_in_flight,
            "RelayerService started"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown_token.cancelled() => {
                    info!("RelayerService received shutdown signal");
                    break;
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined
                        && e.is_panic()
                    {
                        error!(error = %e, "Submission task panicked");
                    }
                }

                _ = interval.tick() => {
                    let Ok(permit) = permits.clone().try_acquire_owned() else {
                        debug!("All submission slots busy, skipping tick");
                        record_dispatch("saturated");
                        continue;
                    };
                    let Some(record) = self.feed.next_deposit() else {
                        continue;
                    };
                    let Some(claim) = in_flight.claim(&record.deposit_id) else {
                        debug!(deposit_id = %record.deposit_id, "Deposit already in flight, skipping");
                        record_dispatch("duplicate");
                        continue;
                    };

                    let pipeline = self.pipeline.clone();
                    tasks.spawn(async move {
                        dispatch(&pipeline, record).await;
                        drop((claim, permit));
                    });
                }
            }
        }

        let aborted = tasks.len();
        tasks.shutdown().await;
        info!(aborted, "RelayerService stopped");
    }
}

async fn dispatch(pipeline: &DepositPipeline, record: DepositRecord) {
    let deposit_id = &record.deposit_id;
    match pipeline.relay(&record).await {
        Ok(SubmitOutcome::Admitted(admission)) => {
            info!(
                %deposit_id,
                credited_to = %admission.credited_to,
                "Deposit admitted"
            );
            record_dispatch("admitted");
        }
        Ok(SubmitOutcome::AlreadyProcessed(_)) => {
            info!(%deposit_id, "Deposit already processed");
            record_dispatch("already_processed");
        }
        Ok(SubmitOutcome::Rejected { reason, detail }) => {
            warn!(%deposit_id, %reason, %detail, "Deposit rejected by verifier");
            record_dispatch(reason.as_str());
        }
        Err(e) => {
            warn!(%deposit_id, error = %e, "Failed to relay deposit");
            record_dispatch("error");
        }
    }
}
