use std::time::Duration;

use anyhow::{Context as _, Result, anyhow, bail};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

/// Fire-and-forget publishing. Delivery and reconnection belong to the implementation.
///
/// Neither method may block indefinitely on the broker.
#[allow(async_fn_in_trait)]
pub trait Bus {
    async fn publish(&mut self, topic: &str, payload: String, retain: bool) -> Result<()>;

    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

const REQUEST_CAPACITY: usize = 64;
const KEEP_ALIVE: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub client_id: String,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct MqttBus {
    client: AsyncClient,
    event_loop: JoinHandle<()>,
}

impl MqttBus {
    /// Starts the client. The broker connection is established in the background.
    pub fn connect(settings: &MqttSettings) -> Self {
        let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
        options.set_keep_alive(KEEP_ALIVE);
        if let Some(user) = &settings.user {
            options.set_credentials(user, settings.password.as_deref().unwrap_or_default());
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let event_loop = tokio::spawn(drive_event_loop(event_loop));

        Self { client, event_loop }
    }
}

impl Bus for MqttBus {
    /// Queues the message for the event loop.
    ///
    /// While the broker is unreachable the request queue fills up; further
    /// messages are dropped with a warning instead of stalling the caller.
    async fn publish(&mut self, topic: &str, payload: String, retain: bool) -> Result<()> {
        if self.event_loop.is_finished() {
            bail!("MQTT event loop has stopped, cannot publish to {topic}");
        }

        if let Err(err) = self
            .client
            .try_publish(topic, QoS::AtLeastOnce, retain, payload)
        {
            log::warn!("dropping MQTT message for {topic}: {err}");
        }
        Ok(())
    }

    async fn close(self) -> Result<()> {
        let Self {
            client,
            mut event_loop,
        } = self;

        if let Err(err) = client.try_disconnect() {
            event_loop.abort();
            return Err(anyhow::Error::new(err).context("failed to request MQTT disconnect"));
        }

        match timeout(CLOSE_TIMEOUT, &mut event_loop).await {
            Ok(joined) => joined.context("MQTT event loop task failed"),
            Err(_) => {
                event_loop.abort();
                Err(anyhow!(
                    "MQTT event loop did not finish within {}s",
                    CLOSE_TIMEOUT.as_secs()
                ))
            }
        }
    }
}

async fn drive_event_loop(mut event_loop: EventLoop) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                log::info!("connected to MQTT broker: {:?}", ack.code);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                log::debug!("MQTT disconnect sent");
                return;
            }
            Ok(_) => {}
            Err(err) => {
                log::warn!("MQTT connection error: {err}");
                sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
