//! Broker link for the simulated unit.
//!
//! Two threads share one MQTT session: the event loop drives the socket
//! and turns inbound control payloads into emergency-stop requests, and
//! the publisher mirrors tick snapshots onto the telemetry topic.
//! The simulation thread never touches the network.

use crate::metrics::{CONTROL_IGNORED, MQTT_CONNECTED, TELEMETRY_PUBLISHED};
use crate::protocol::{ControlCommand, TelemetryRecord, CONTROL_CLEAR_PAYLOAD};
use genset_core::StateExchange;
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub telemetry_topic: String,
    pub control_topic: String,
    pub keep_alive: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "genset-sim".to_string(),
            telemetry_topic: "factory/generator/telemetry".to_string(),
            control_topic: "factory/generator/control".to_string(),
            keep_alive: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("mqtt request failed: {0}")]
    Client(#[from] rumqttc::ClientError),
    #[error("broker connection failed: {0}")]
    Connection(#[from] rumqttc::ConnectionError),
    #[error("telemetry encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Handle for the telemetry side of the link. Cheap to clone off the
/// session; publishes are queued into the shared event loop.
pub struct TelemetryPublisher {
    client: Client,
    topic: String,
}

impl TelemetryPublisher {
    /// Publish one record at QoS 0: no retry, no retained flag. A stale
    /// reading is worthless, so telemetry is fire-and-forget.
    pub fn publish(&self, record: &TelemetryRecord) -> Result<(), LinkError> {
        let payload = serde_json::to_string(record)?;
        self.client
            .publish(&self.topic, QoS::AtMostOnce, false, payload)?;
        TELEMETRY_PUBLISHED.inc();
        Ok(())
    }
}

/// One MQTT session: subscription to the control topic plus the telemetry
/// publisher handle.
pub struct MqttLink {
    client: Client,
    connection: Connection,
    config: LinkConfig,
}

impl MqttLink {
    /// Open the broker session, subscribe to the control topic and queue
    /// the retained clear payload. The requests are flushed once
    /// [`run`](Self::run) starts driving the connection.
    pub fn open(config: LinkConfig) -> Result<Self, LinkError> {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(config.keep_alive);

        let (client, connection) = Client::new(options, 64);
        client.subscribe(&config.control_topic, QoS::AtLeastOnce)?;
        client.publish(
            &config.control_topic,
            QoS::AtLeastOnce,
            true,
            CONTROL_CLEAR_PAYLOAD,
        )?;

        Ok(Self {
            client,
            connection,
            config,
        })
    }

    pub fn publisher(&self) -> TelemetryPublisher {
        TelemetryPublisher {
            client: self.client.clone(),
            topic: self.config.telemetry_topic.clone(),
        }
    }

    /// Drive the broker session until `stop` is set.
    ///
    /// A failure before the first ConnAck is returned to the caller and
    /// treated as fatal; once a session existed, errors are logged and
    /// the connection retries so a broker restart does not take the
    /// simulation down with it.
    pub fn run(mut self, exchange: Arc<StateExchange>, stop: Arc<AtomicBool>) -> Result<(), LinkError> {
        let mut connected_once = false;

        while !stop.load(Ordering::Relaxed) {
            match self.connection.recv_timeout(Duration::from_millis(250)) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(_)))) => {
                    connected_once = true;
                    MQTT_CONNECTED.set(1.0);
                    info!(
                        host = %self.config.broker_host,
                        port = self.config.broker_port,
                        "broker session established"
                    );
                }
                Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                    if publish.topic != self.config.control_topic {
                        continue;
                    }
                    match ControlCommand::parse(&publish.payload) {
                        Some(ControlCommand::EmergencyStop) => {
                            warn!("emergency stop received on control topic");
                            exchange.request_emergency_stop();
                        }
                        None => {
                            CONTROL_IGNORED.inc();
                            debug!(bytes = publish.payload.len(), "ignoring control payload");
                        }
                    }
                }
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    MQTT_CONNECTED.set(0.0);
                    if !connected_once {
                        return Err(err.into());
                    }
                    warn!(error = %err, "broker session error, reconnecting");
                    thread::sleep(Duration::from_secs(1));
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let _ = self.client.disconnect();
        MQTT_CONNECTED.set(0.0);
        Ok(())
    }
}

/// Mirror snapshots onto the telemetry topic, at most one record per
/// tick.
///
/// Polls the exchange faster than the tick period and publishes when the
/// tick counter advances, so a tick is never emitted twice. Emission is
/// best-effort: if this thread falls behind the simulation, intermediate
/// ticks are skipped and only the latest snapshot goes out. Publish
/// failures are logged and dropped; there is no retry for telemetry.
pub fn run_publisher(
    exchange: Arc<StateExchange>,
    publisher: TelemetryPublisher,
    tick_period: Duration,
    stop: Arc<AtomicBool>,
) {
    let poll = (tick_period / 5).max(Duration::from_millis(5));
    let mut last_tick = 0u64;

    while !stop.load(Ordering::Relaxed) {
        let snapshot = exchange.latest();
        if snapshot.tick > last_tick {
            last_tick = snapshot.tick;
            let record = TelemetryRecord::from_snapshot(&snapshot);
            if let Err(err) = publisher.publish(&record) {
                warn!(error = %err, "telemetry publish dropped");
            }
        }
        thread::sleep(poll);
    }
}
