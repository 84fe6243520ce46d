//! Periodic guild and member gauges.
//!
//! The gateway does not publish count deltas, so both monitors sample the state
//! cache on a timer and act only when the sampled value changes. Each monitor
//! serializes its own sampling behind a dedicated lock.

use crate::{ListingClient, wait_for_shutdown};
use async_trait::async_trait;
use ephemeral_core::StateCache;
use ephemeral_error::MetricsError;
use prometheus::{IntGauge, Registry, register_int_gauge_with_registry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Gauges maintained by the monitors.
#[derive(Debug, Clone)]
pub struct MonitorMetrics {
    guilds: IntGauge,
    members: IntGauge,
}

impl MonitorMetrics {
    /// Creates the gauges and registers them with the given registry.
    pub fn new(registry: &Registry) -> Result<Self, MetricsError> {
        let guilds = register_int_gauge_with_registry!(
            "ephemeral_roles_guilds",
            "Guilds the bot is a member of",
            registry
        )
        .map_err(|e| MetricsError::new(e.to_string()))?;

        let members = register_int_gauge_with_registry!(
            "ephemeral_roles_members",
            "Members across all guilds the bot is a member of",
            registry
        )
        .map_err(|e| MetricsError::new(e.to_string()))?;

        Ok(Self { guilds, members })
    }

    /// Gauges on a private registry.
    pub fn detached() -> Self {
        match Self::new(&Registry::new()) {
            Ok(metrics) => metrics,
            Err(err) => unreachable!("fresh registry rejected gauges: {err}"),
        }
    }

    /// Current guild gauge value.
    pub fn guilds(&self) -> i64 {
        self.guilds.get()
    }

    /// Current member gauge value.
    pub fn members(&self) -> i64 {
        self.members.get()
    }
}

/// A task sampled on a fixed period.
#[async_trait]
pub trait Monitor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Takes one sample.
    async fn sample(&self);
}

#[derive(Debug, Default)]
struct GuildSample {
    observed: Option<usize>,
    posted: Option<usize>,
}

/// Tracks the number of guilds, logging joins and leaves and reporting the count
/// to the listing service when one is configured.
pub struct GuildsMonitor {
    cache: Arc<StateCache>,
    metrics: MonitorMetrics,
    listing: Option<ListingClient>,
    // Held across the listing POST so ticks cannot interleave.
    last: tokio::sync::Mutex<GuildSample>,
}

impl GuildsMonitor {
    /// Creates the monitor.
    pub fn new(
        cache: Arc<StateCache>,
        metrics: MonitorMetrics,
        listing: Option<ListingClient>,
    ) -> Self {
        Self {
            cache,
            metrics,
            listing,
            last: tokio::sync::Mutex::new(GuildSample::default()),
        }
    }

    /// Last sampled guild count.
    pub async fn last_count(&self) -> Option<usize> {
        self.last.lock().await.observed
    }
}

#[async_trait]
impl Monitor for GuildsMonitor {
    fn name(&self) -> &'static str {
        "guilds"
    }

    async fn sample(&self) {
        let mut last = self.last.lock().await;
        let count = self.cache.guild_count();

        if last.observed != Some(count) {
            match last.observed {
                Some(previous) if count > previous => {
                    info!(joined = count - previous, guilds = count, "Joined guilds");
                }
                Some(previous) => {
                    info!(left = previous - count, guilds = count, "Left guilds");
                }
                None => info!(guilds = count, "Guild count sampled"),
            }
            self.metrics.guilds.set(count as i64);
            last.observed = Some(count);
        }

        // A failed post is retried on the next tick.
        if let Some(listing) = &self.listing
            && last.posted != Some(count)
        {
            match listing.post_server_count(count).await {
                Ok(()) => last.posted = Some(count),
                Err(e) => warn!(error = %e, guilds = count, "Failed to update listing service"),
            }
        }
    }
}

/// Tracks the total member count across guilds.
pub struct MembersMonitor {
    cache: Arc<StateCache>,
    metrics: MonitorMetrics,
    last: parking_lot::Mutex<Option<u64>>,
}

impl MembersMonitor {
    /// Creates the monitor.
    pub fn new(cache: Arc<StateCache>, metrics: MonitorMetrics) -> Self {
        Self {
            cache,
            metrics,
            last: parking_lot::Mutex::new(None),
        }
    }

    /// Last sampled member count.
    pub fn last_count(&self) -> Option<u64> {
        *self.last.lock()
    }
}

#[async_trait]
impl Monitor for MembersMonitor {
    fn name(&self) -> &'static str {
        "members"
    }

    async fn sample(&self) {
        let mut last = self.last.lock();
        let count = self.cache.member_count_total();
        if *last != Some(count) {
            debug!(members = count, "Member count changed");
            self.metrics.members.set(count as i64);
            *last = Some(count);
        }
    }
}

/// Samples `monitor` every `period` until shutdown is requested.
///
/// The first sample is taken immediately.
pub fn spawn_monitor(
    monitor: Arc<dyn Monitor>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                _ = ticker.tick() => monitor.sample().await,
            }
        }
        debug!(monitor = monitor.name(), "Monitor stopped");
    })
}
