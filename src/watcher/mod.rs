//! # Watcher Module
//!
//! Timer-driven payment-channel expiry watcher. Independently of the
//! submission pipeline, it polls the ledger for the state of watched channels
//! and emits a close event as soon as a channel has an expiration or
//! cancel-after scheduled, so the host can settle outstanding claims before
//! the channel closes.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::ledger::LedgerClient;
use crate::models::{ChannelCloseEvent, ChannelId, LedgerError, PaymentChannel, WatcherError};

/// Watches payment channels for scheduled closes.
///
/// Close notifications arrive on the receiver returned by [`ChannelWatcher::new`];
/// a channel is dropped from the watch set once its close has been emitted.
pub struct ChannelWatcher<C: LedgerClient> {
    client: Arc<C>,
    poll_interval: Duration,
    watched: Arc<Mutex<HashSet<ChannelId>>>,
    closes: mpsc::UnboundedSender<ChannelCloseEvent>,
    poller_handle: JoinHandle<()>,
}

impl<C: LedgerClient + 'static> ChannelWatcher<C> {
    /// Creates the watcher and spawns its polling task.
    ///
    /// [`crate::constants::DEFAULT_WATCH_INTERVAL_SECONDS`] is a reasonable
    /// `poll_interval` for hosts without their own cadence.
    pub fn new(
        poll_interval: Duration,
        client: Arc<C>,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelCloseEvent>) {
        let (closes, close_events) = mpsc::unbounded_channel();
        let watched: Arc<Mutex<HashSet<ChannelId>>> = Arc::new(Mutex::new(HashSet::new()));

        let poller_handle = tokio::spawn(Self::poll_loop(
            poll_interval,
            client.clone(),
            watched.clone(),
            closes.clone(),
        ));

        (
            Self {
                client,
                poll_interval,
                watched,
                closes,
                poller_handle,
            },
            close_events,
        )
    }

    /// Starts watching a channel.
    ///
    /// Looks the channel up immediately: a channel that already has a close
    /// scheduled triggers an event right away instead of entering the watch
    /// set, and a channel whose settle delay is shorter than the poll
    /// interval is rejected (its close could slip between two polls).
    pub async fn watch(&self, channel_id: &str) -> Result<(), WatcherError> {
        let channel_id = ChannelId::new(channel_id)
            .map_err(|_| WatcherError::InvalidChannel(channel_id.to_string()))?;
        if self.watched.lock().contains(&channel_id) {
            return Ok(());
        }

        let channel = lookup_channel(self.client.as_ref(), &channel_id).await?;
        if channel.closes_at().is_some() {
            emit_close(&self.closes, &channel_id, &channel);
            return Ok(());
        }

        if u64::from(channel.settle_delay) < self.poll_interval.as_secs() {
            return Err(WatcherError::SettleDelayTooShort {
                channel: channel_id,
            });
        }

        debug!(channel_id = %channel_id, "watching payment channel");
        self.watched.lock().insert(channel_id);
        Ok(())
    }

    /// Channels currently in the watch set.
    pub fn watched_count(&self) -> usize {
        self.watched.lock().len()
    }

    async fn poll_loop(
        poll_interval: Duration,
        client: Arc<C>,
        watched: Arc<Mutex<HashSet<ChannelId>>>,
        closes: mpsc::UnboundedSender<ChannelCloseEvent>,
    ) {
        let mut ticker = tokio::time::interval(poll_interval);
        // The immediate first tick would race `watch` lookups; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let channel_ids: Vec<ChannelId> = watched.lock().iter().cloned().collect();
            debug!(count = channel_ids.len(), "checking channels for expiry");
            for channel_id in channel_ids {
                match lookup_channel(client.as_ref(), &channel_id).await {
                    Ok(channel) => {
                        if channel.closes_at().is_some() {
                            emit_close(&closes, &channel_id, &channel);
                            watched.lock().remove(&channel_id);
                        }
                    }
                    Err(err) => {
                        // Rechecked on the next tick.
                        warn!(
                            channel_id = %channel_id,
                            error = %err,
                            "failed to check channel for expiry"
                        );
                    }
                }
            }
        }
    }
}

impl<C: LedgerClient> Drop for ChannelWatcher<C> {
    fn drop(&mut self) {
        self.poller_handle.abort();
    }
}

async fn lookup_channel<C: LedgerClient>(
    client: &C,
    channel_id: &ChannelId,
) -> Result<PaymentChannel, WatcherError> {
    if !client.is_connected() {
        client.connect().await?;
    }
    match client.get_payment_channel(channel_id).await {
        Err(LedgerError::NotFound(_)) => Err(WatcherError::ChannelNotFound(channel_id.clone())),
        other => other.map_err(WatcherError::from),
    }
}

fn emit_close(
    closes: &mpsc::UnboundedSender<ChannelCloseEvent>,
    channel_id: &ChannelId,
    channel: &PaymentChannel,
) {
    let Some(closes_at) = channel.closes_at() else {
        return;
    };
    debug!(channel_id = %channel_id, closes_at = %closes_at, "channel close scheduled");
    let _ = closes.send(ChannelCloseEvent {
        channel_id: channel_id.clone(),
        closes_at,
    });
}
