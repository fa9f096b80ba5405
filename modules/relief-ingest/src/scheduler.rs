use std::time::Duration;

use tracing::{error, info};

use crate::pipeline::IngestPipeline;

/// Runs the pipeline, then sleeps, forever or for `max_runs` runs.
///
/// Runs never overlap. A failed run is logged and the next one starts after
/// the same delay.
pub struct Scheduler {
    interval: Duration,
    max_runs: Option<u64>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_runs: None,
        }
    }

    pub fn with_max_runs(mut self, max_runs: u64) -> Self {
        self.max_runs = Some(max_runs);
        self
    }

    /// Returns the number of runs completed, successful or not.
    pub async fn run(&self, pipeline: &IngestPipeline) -> u64 {
        let mut runs = 0u64;
        loop {
            match pipeline.run_once().await {
                Ok(stats) => info!("Ingestion run complete. {stats}"),
                Err(e) => error!("Ingestion run failed: {e:#}"),
            }
            runs += 1;

            if self.max_runs.is_some_and(|max| runs >= max) {
                return runs;
            }
            info!(secs = self.interval.as_secs(), "Sleeping before next run");
            tokio::time::sleep(self.interval).await;
        }
    }
}
