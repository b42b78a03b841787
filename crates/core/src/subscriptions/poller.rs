//! Background poll loop.
//!
//! One recurring timer drives every cycle. A cycle only spawns the per-symbol
//! fetches into a `JoinSet` owned by the loop and returns, so slow fetches
//! never delay the next tick. Aborting the loop drops the set, which aborts
//! whatever is still in flight.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};

/// Spawn the poll loop.
///
/// `cycle` is called on every tick after the first full interval. It spawns
/// its fetches into the supplied set and returns `false` once its owner is
/// gone, which ends the loop.
pub(crate) fn spawn_poller<F>(period: Duration, mut cycle: F) -> JoinHandle<()>
where
    F: FnMut(&mut JoinSet<()>) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        info!("Quote poller started ({}s interval)", period.as_secs());

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; the first cycle runs one period in.
        ticker.tick().await;

        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !cycle(&mut in_flight) {
                        debug!("Quote poller owner dropped, stopping");
                        break;
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!("Poll task panicked: {}", e);
                        }
                    }
                }
            }
        }
    })
}
