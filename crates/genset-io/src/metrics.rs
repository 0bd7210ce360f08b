//! Prometheus metrics for the generator simulation.
//!
//! Gauges mirror the latest snapshot; counters track tick scheduling and
//! control-channel activity.

use genset_core::tags;
use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Tick scheduling
// ============================================================================

/// Total simulation ticks executed
pub static TICKS_EXECUTED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "genset_ticks_executed_total",
        "Total simulation ticks executed",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Ticks whose deadline was missed
pub static TICKS_MISSED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "genset_ticks_missed_total",
        "Simulation ticks that missed their deadline",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Tick jitter distribution in microseconds
pub static TICK_JITTER_US: LazyLock<Histogram> = LazyLock::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            tags::TICK_JITTER_US.metric,
            "Tick jitter distribution in microseconds",
        )
        .buckets(vec![
            50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0,
        ]),
    )
    .unwrap();
    REGISTRY.register(Box::new(histogram.clone())).unwrap();
    histogram
});

// ============================================================================
// Control channel
// ============================================================================

/// Emergency stops applied to the model
pub static EMERGENCY_STOPS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "genset_emergency_stops_total",
        "Emergency stop commands applied to the model",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Control payloads ignored as malformed or unrecognized
pub static CONTROL_IGNORED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "genset_control_payloads_ignored_total",
        "Control payloads ignored as malformed or unrecognized",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Telemetry records handed to the broker
pub static TELEMETRY_PUBLISHED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "genset_telemetry_published_total",
        "Telemetry records handed to the broker",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Broker session status (1 = connected, 0 = disconnected)
pub static MQTT_CONNECTED: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(
        "genset_mqtt_connected",
        "Broker session status (1=connected, 0=disconnected)",
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Unit state
// ============================================================================

fn state_gauge(tag: tags::Tag, help: &str) -> Gauge {
    let gauge = Gauge::new(tag.metric, help).unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
}

/// Current shaft speed in rpm
pub static RPM: LazyLock<Gauge> =
    LazyLock::new(|| state_gauge(tags::RPM, "Current shaft speed in rpm"));

/// Current L1 line voltage in volts
pub static VOLTAGE_V: LazyLock<Gauge> =
    LazyLock::new(|| state_gauge(tags::VOLTAGE, "Current L1 line voltage in volts"));

/// Current L1 load current in amperes
pub static CURRENT_A: LazyLock<Gauge> =
    LazyLock::new(|| state_gauge(tags::CURRENT, "Current L1 load current in amperes"));

/// Current power output in kilowatts
pub static POWER_KW: LazyLock<Gauge> =
    LazyLock::new(|| state_gauge(tags::POWER, "Current power output in kilowatts"));

/// Current oil pressure in bar
pub static OIL_PRESSURE_BAR: LazyLock<Gauge> =
    LazyLock::new(|| state_gauge(tags::OIL_PRESSURE, "Current oil pressure in bar"));

/// Current vibration in g
pub static VIBRATION_G: LazyLock<Gauge> =
    LazyLock::new(|| state_gauge(tags::VIBRATION, "Current vibration in g"));

/// Remaining health in percent
pub static HEALTH_PCT: LazyLock<Gauge> =
    LazyLock::new(|| state_gauge(tags::HEALTH, "Remaining health in percent"));

/// Unit status code (0=starting, 1=running, 2=emergency stop)
pub static STATUS_CODE: LazyLock<Gauge> = LazyLock::new(|| {
    state_gauge(
        tags::STATUS,
        "Unit status code (0=starting, 1=running, 2=emergency stop)",
    )
});

// ============================================================================
// Metrics HTTP server
// ============================================================================

/// Start the metrics HTTP server on the given address.
/// Returns a join handle for the server thread.
pub fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            match request.url() {
                "/metrics" => {
                    let encoder = TextEncoder::new();
                    let metric_families = REGISTRY.gather();
                    let mut buffer = Vec::new();

                    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
                        tracing::warn!("Failed to encode metrics: {}", e);
                        let _ = request.respond(
                            Response::from_string("Internal Server Error").with_status_code(500),
                        );
                        continue;
                    }

                    let response = Response::from_data(buffer).with_header(
                        tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/plain; version=0.0.4"[..],
                        )
                        .unwrap(),
                    );
                    let _ = request.respond(response);
                }
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                "/ready" => {
                    // Ready once the simulation has produced a tick
                    if TICKS_EXECUTED.get() > 0 {
                        let _ = request.respond(Response::from_string("Ready"));
                    } else {
                        let _ = request
                            .respond(Response::from_string("Not Ready").with_status_code(503));
                    }
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}

/// Initialize all metrics (forces lazy initialization)
pub fn init_metrics() {
    let _ = TICKS_EXECUTED.get();
    let _ = TICKS_MISSED.get();
    let _ = TICK_JITTER_US.get_sample_count();
    let _ = EMERGENCY_STOPS.get();
    let _ = CONTROL_IGNORED.get();
    let _ = TELEMETRY_PUBLISHED.get();
    let _ = MQTT_CONNECTED.get();
    let _ = RPM.get();
    let _ = VOLTAGE_V.get();
    let _ = CURRENT_A.get();
    let _ = POWER_KW.get();
    let _ = OIL_PRESSURE_BAR.get();
    let _ = VIBRATION_G.get();
    let _ = HEALTH_PCT.get();
    let _ = STATUS_CODE.get();
}
