use std::time::Duration;

use anyhow::{Context as _, Result};
use chrono::{DateTime, TimeDelta, Utc};

use crate::am7p::decode_packet;
use crate::clock::Clock;
use crate::device::{AddressBook, DeviceRegistry, Liveness, evaluate_liveness};
use crate::mqtt::{Bus, PAYLOAD_OFF, PAYLOAD_ON, TopicScheme, discovery_messages};
use crate::shutdown::ShutdownSignal;
use crate::udp::{Datagram, DatagramSource};

/// Upper bound on a single receive, and therefore on how late a sweep can fire.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub address_book: AddressBook,
    pub topics: TopicScheme,
    pub online_timeout_s: u64,
    pub sweep_interval: Duration,
    pub recv_timeout: Duration,
}

/// Relays AM7P datagrams to MQTT and reports per-device liveness.
///
/// The bridge owns the datagram source and the bus. Both are released when
/// [`Bridge::run`] returns, whichever way the loop ended. Before that every
/// known device is published as offline.
pub struct Bridge<S, B, C> {
    source: S,
    bus: B,
    clock: C,
    address_book: AddressBook,
    topics: TopicScheme,
    online_timeout_s: u64,
    sweep_interval: TimeDelta,
    recv_timeout: Duration,
    registry: DeviceRegistry,
    shutdown: ShutdownSignal,
    rejected: u64,
}

impl<S, B, C> Bridge<S, B, C>
where
    S: DatagramSource,
    B: Bus,
    C: Clock,
{
    pub fn new(
        source: S,
        bus: B,
        clock: C,
        config: BridgeConfig,
        shutdown: ShutdownSignal,
    ) -> Result<Self> {
        let sweep_interval = TimeDelta::from_std(config.sweep_interval)
            .context("sweep interval out of range")?;

        Ok(Self {
            source,
            bus,
            clock,
            address_book: config.address_book,
            topics: config.topics,
            online_timeout_s: config.online_timeout_s,
            sweep_interval,
            recv_timeout: config.recv_timeout,
            registry: DeviceRegistry::new(),
            shutdown,
            rejected: 0,
        })
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Runs until shutdown is requested or a fault occurs.
    ///
    /// While running, the bridge alternates between a bounded receive and the
    /// liveness sweep. Shutting down marks every known device offline and then
    /// releases the source and the bus; the bridge is consumed afterwards.
    /// A fault is returned only once shutting down has finished.
    pub async fn run(mut self) -> Result<()> {
        let result = self.run_until_stopped().await;
        if let Err(err) = &result {
            log::error!("bridge loop failed: {err:?}");
        }

        log::info!("marking {} devices offline", self.registry.len());
        self.announce_offline().await;
        if self.rejected > 0 {
            log::info!("dropped {} malformed datagrams", self.rejected);
        }
        self.release().await;

        result
    }

    async fn run_until_stopped(&mut self) -> Result<()> {
        let mut next_sweep_at = self.clock.now() + self.sweep_interval;

        while !self.shutdown.is_requested() {
            if let Some(datagram) = self.source.recv(self.recv_timeout).await? {
                self.ingest(datagram).await?;
            }

            let now = self.clock.now();
            if now >= next_sweep_at {
                self.sweep(now).await?;
                // Measured from the end of the sweep, not from when it was due.
                next_sweep_at = self.clock.now() + self.sweep_interval;
            }
        }

        log::info!("shutdown requested");
        Ok(())
    }

    async fn ingest(&mut self, datagram: Datagram) -> Result<()> {
        let name = self.address_book.resolve(datagram.source.ip()).to_owned();

        let measurement = match decode_packet(&datagram.payload) {
            Ok(m) => m,
            Err(err) => {
                self.rejected += 1;
                log::debug!("dropping datagram from {}: {err:#}", datagram.source);
                return Ok(());
            }
        };

        if self.registry.record_packet(&name, self.clock.now()) {
            log::info!("new device {name} at {}", datagram.source);
            self.announce(&name).await?;
            self.registry.mark_announced(&name);
        }

        let payload = serde_json::to_string(&measurement)
            .with_context(|| format!("failed to serialize measurement for {name}"))?;
        self.bus.publish(&self.topics.state(&name), payload, false).await
    }

    async fn announce(&mut self, name: &str) -> Result<()> {
        for message in discovery_messages(&self.topics, name)? {
            self.bus.publish(&message.topic, message.payload, true).await?;
        }
        Ok(())
    }

    async fn sweep(&mut self, now: DateTime<Utc>) -> Result<()> {
        for name in self.registry.names() {
            let liveness =
                evaluate_liveness(self.registry.last_seen(&name), now, self.online_timeout_s);
            for (topic, payload) in self.liveness_messages(&name, liveness) {
                self.bus.publish(&topic, payload, true).await?;
            }
        }
        Ok(())
    }

    // Best effort: one failing publish must not keep other devices from going offline.
    async fn announce_offline(&mut self) {
        let now = self.clock.now();
        for name in self.registry.names() {
            let liveness =
                evaluate_liveness(self.registry.last_seen(&name), now, self.online_timeout_s)
                    .offline();
            for (topic, payload) in self.liveness_messages(&name, liveness) {
                if let Err(err) = self.bus.publish(&topic, payload, true).await {
                    log::warn!("failed to mark {name} offline: {err:#}");
                }
            }
        }
    }

    fn liveness_messages(&self, name: &str, liveness: Liveness) -> [(String, String); 2] {
        let online = if liveness.online {
            PAYLOAD_ON
        } else {
            PAYLOAD_OFF
        };
        [
            (self.topics.age(name), liveness.age_seconds.to_string()),
            (self.topics.online(name), online.to_string()),
        ]
    }

    async fn release(self) {
        let Self { source, bus, .. } = self;

        if let Err(err) = source.close().await {
            log::warn!("failed to close datagram source: {err:#}");
        }
        if let Err(err) = bus.close().await {
            log::warn!("failed to close MQTT connection: {err:#}");
        }

        log::info!("bridge stopped");
    }
}
