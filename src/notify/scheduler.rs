// Poll scheduler - drives the change notifier on a fixed interval.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::notify::poller::ChangeNotifier;

pub struct PollScheduler {
    change_notifier: Arc<ChangeNotifier>,
    poll_interval: Duration,
}

impl PollScheduler {
    pub fn new(change_notifier: Arc<ChangeNotifier>, poll_interval_secs: u64) -> Self {
        Self {
            change_notifier,
            poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
        }
    }

    /// Start the polling loop (runs in background).
    pub fn start(&self) -> JoinHandle<()> {
        let change_notifier = self.change_notifier.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                match change_notifier.run_cycle().await {
                    Ok(0) => debug!("Poll cycle completed, nothing new"),
                    Ok(n) => info!("✓ Poll cycle completed, {} notification(s)", n),
                    // Retryable by construction; the next tick tries again
                    Err(e) => error!("❌ Poll cycle failed: {}", e),
                }
            }
        })
    }
}
