use std::time::Duration;

use chrono::Utc;
use eyre::Result;
use ledger::channel::{ChannelManager, SweepReport};
use log::{error, info};
use tokio::time;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const RECOVERY_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Spawns the expiry sweeper. It runs until the process exits.
pub fn start(manager: ChannelManager) {
    tokio::spawn(async move {
        info!("Subscription sweeper started");
        loop {
            let result = manager.try_sweep(Utc::now()).await;
            if let Err(err) = &result {
                error!("Error in background process: {:#}", err);
            }
            time::sleep(next_delay(&result)).await;
        }
    });
}

fn next_delay(result: &Result<SweepReport>) -> Duration {
    match result {
        Ok(_) => SWEEP_INTERVAL,
        Err(_) => RECOVERY_INTERVAL,
    }
}
