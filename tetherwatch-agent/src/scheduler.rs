//! Fixed-interval driver for the pipeline.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

use tetherwatch_agent_framework::ShutdownSignal;

use crate::pipeline::{CycleReport, Pipeline};

/// Runs one cycle per period until shutdown.
///
/// Cycles never overlap. The first cycle starts one full period after
/// [`Scheduler::run`] is called.
#[derive(Debug)]
pub struct Scheduler {
    pipeline: Pipeline,
    period: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Pipeline, period: Duration) -> Self {
        Self { pipeline, period }
    }

    /// Loop until `shutdown` fires. Returns the number of completed cycles.
    ///
    /// A cycle still in progress when shutdown fires is abandoned. A zero
    /// period, or one too large to schedule, runs no cycles.
    pub async fn run(&self, mut shutdown: ShutdownSignal) -> u64 {
        let start = match Instant::now().checked_add(self.period) {
            Some(start) if !self.period.is_zero() => start,
            _ => {
                error!(period = ?self.period, "Push interval cannot be scheduled");
                return 0;
            }
        };

        let mut ticker = interval_at(start, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_secs = self.period.as_secs(), "Scheduler started");

        let mut cycles = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = ticker.tick() => {}
            }

            match self.run_once(&mut shutdown).await {
                Some(_) => cycles += 1,
                None => {
                    info!("Shutdown during cycle, abandoning it");
                    break;
                }
            }
        }

        info!(cycles, "Scheduler stopped");
        cycles
    }

    /// Run a single cycle unless shutdown fires first.
    pub async fn run_once(&self, shutdown: &mut ShutdownSignal) -> Option<CycleReport> {
        tokio::select! {
            biased;
            _ = shutdown.wait() => None,
            report = self.pipeline.run_cycle() => {
                debug!(?report, "Cycle finished");
                Some(report)
            }
        }
    }
}
