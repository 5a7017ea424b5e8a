use std::time::Duration;

use async_trait::async_trait;
use booking::Planner;
use eyre::{Context as _, Error, Result};
use log::error;
use process::completion::CompletionBg;

pub mod process;

/// A periodically executed reconciliation job. Failures are logged and
/// retried on the next tick, never fatal.
#[async_trait]
pub trait Task {
    const NAME: &'static str;

    async fn process(&mut self) -> Result<(), Error>;
}

pub struct BgProcessor {
    completion: CompletionBg,
}

impl BgProcessor {
    pub fn new(planner: Planner) -> BgProcessor {
        BgProcessor {
            completion: CompletionBg::new(planner),
        }
    }

    pub async fn process(&mut self) {
        if let Err(err) = self
            .completion
            .process()
            .await
            .context(CompletionBg::NAME)
        {
            error!("Background task failed: {:#}", err);
        }
    }
}

/// Spawns the background loop. `interval_min` is the sweep cadence; the
/// first tick fires immediately.
pub fn start(planner: Planner, interval_min: u64) {
    tokio::spawn(async move {
        let mut processor = BgProcessor::new(planner);
        let mut interval = tokio::time::interval(Duration::from_secs(interval_min * 60));
        loop {
            interval.tick().await;
            processor.process().await;
        }
    });
}
