//! Fixed-interval refresh loop.

use std::{future::Future, time::Duration};

use tokio::{
    task::{JoinHandle, JoinSet},
    time::{interval_at, Instant, MissedTickBehavior},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Running poll loop. Dropping the handle stops it, along with any tick
/// still in flight.
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Calls `tick` every `period`, starting one period from now.
///
/// Each tick runs as its own task, so a tick that hangs does not hold back
/// the ones after it. Overlapping ticks are not deduplicated.
pub fn spawn_poll<F, Fut>(period: Duration, mut tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Owned by the loop: aborting the loop drops the set, which aborts
        // every tick still running.
        let mut in_flight = JoinSet::new();
        loop {
            ticker.tick().await;
            while in_flight.try_join_next().is_some() {}
            in_flight.spawn(tick());
        }
    });
    PollHandle { task }
}
