//! Events emitted by the market data service.

use std::sync::RwLock;

use serde::Serialize;
use tokio::sync::broadcast;

use marketpulse_market_data::Quote;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A caller-initiated quote fetch reached a provider and completed.
    Quote { symbol: String, quote: Quote },

    /// The poller refreshed a subscribed symbol.
    Update { symbol: String, quote: Quote },

    /// The poller could not refresh a subscribed symbol.
    UpdateFailed { symbol: String, error: String },

    /// Something went wrong while setting the service up.
    Error { message: String },
}

impl MarketEvent {
    pub fn symbol(&self) -> Option<&str> {
        match self {
            MarketEvent::Quote { symbol, .. }
            | MarketEvent::Update { symbol, .. }
            | MarketEvent::UpdateFailed { symbol, .. } => Some(symbol),
            MarketEvent::Error { .. } => None,
        }
    }
}

/// Broadcast bus that fans events out to every listener.
///
/// The sender can be swapped out with [`EventBus::reset`], which closes every
/// receiver handed out before the swap.
pub struct EventBus {
    sender: RwLock<broadcast::Sender<MarketEvent>>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self {
            sender: RwLock::new(sender),
            capacity,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .subscribe()
    }

    pub fn publish(&self, event: MarketEvent) {
        // No listeners or lagging listeners must not block producers.
        let _ = self
            .sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .send(event);
    }

    pub fn receiver_count(&self) -> usize {
        self.sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .receiver_count()
    }

    /// Replace the channel. Existing receivers see `RecvError::Closed` once
    /// they drain what was already sent.
    pub fn reset(&self) {
        let (sender, _receiver) = broadcast::channel(self.capacity);
        *self
            .sender
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = sender;
    }
}
