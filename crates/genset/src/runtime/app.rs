use crate::dashboard;
use crate::runtime::config::RuntimeConfig;
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry;
use genset_core::{
    GeneratorConfig, GeneratorModel, SeededNoise, SimThread, StateExchange, TickConfig, TimeBase,
};
use genset_io::{run_publisher, LinkConfig, MqttLink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

pub fn run_from_args() {
    let config = RuntimeConfig::from_env();
    if config.show_help {
        RuntimeConfig::print_help();
        return;
    }
    if !run(config) {
        std::process::exit(1);
    }
}

/// Wire up and run the whole unit. Returns false on a fatal startup
/// failure (broker unreachable).
pub fn run(config: RuntimeConfig) -> bool {
    let _log_guard = init_tracing(config.json_logs, config.log_dir.as_deref(), config.dashboard);

    telemetry::init();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let exchange = Arc::new(StateExchange::new());
    let stop = Arc::new(AtomicBool::new(false));
    let fatal = Arc::new(AtomicBool::new(false));
    let tick_config = TickConfig {
        period: Duration::from_millis(config.tick_ms),
    };

    info!(
        tick_ms = config.tick_ms,
        seed = ?config.seed,
        mqtt = config.mqtt_enabled,
        "Starting generator simulation"
    );

    let exchange_sim = Arc::clone(&exchange);
    let stop_sim = Arc::clone(&stop);
    let seed = config.seed;
    let sim_handle = thread::spawn(move || {
        let noise = match seed {
            Some(seed) => SeededNoise::new(seed),
            None => SeededNoise::from_entropy(),
        };
        let model = GeneratorModel::new(GeneratorConfig::default());
        let mut sim = SimThread::new(model, noise, tick_config, exchange_sim, TimeBase::new());
        sim.run(&stop_sim);
        sim.stats().clone()
    });

    let _updater_handle = telemetry::start_metrics_updater(Arc::clone(&exchange), Arc::clone(&stop));

    let mut link_handles = Vec::new();
    if config.mqtt_enabled {
        let link_config = LinkConfig {
            broker_host: config.broker_host.clone(),
            broker_port: config.broker_port,
            client_id: config.client_id.clone(),
            telemetry_topic: config.telemetry_topic.clone(),
            control_topic: config.control_topic.clone(),
            ..Default::default()
        };
        info!(
            broker = %link_config.broker_host,
            port = link_config.broker_port,
            "Starting broker link"
        );

        match MqttLink::open(link_config) {
            Ok(link) => {
                let publisher = link.publisher();
                let exchange_pub = Arc::clone(&exchange);
                let stop_pub = Arc::clone(&stop);
                let period = Duration::from_millis(config.tick_ms);
                link_handles.push(thread::spawn(move || {
                    run_publisher(exchange_pub, publisher, period, stop_pub);
                }));

                let exchange_link = Arc::clone(&exchange);
                let stop_link = Arc::clone(&stop);
                let fatal_link = Arc::clone(&fatal);
                link_handles.push(thread::spawn(move || {
                    if let Err(err) = link.run(exchange_link, Arc::clone(&stop_link)) {
                        error!(error = %err, "Broker connection failed; is the broker running?");
                        fatal_link.store(true, Ordering::Relaxed);
                        stop_link.store(true, Ordering::Relaxed);
                    }
                }));
            }
            Err(err) => {
                error!(error = %err, "Failed to open broker session");
                stop.store(true, Ordering::Relaxed);
                let _ = sim_handle.join();
                return false;
            }
        }
    } else {
        info!("Broker link disabled");
    }

    if config.dashboard {
        let deadline = config.run_seconds.map(Duration::from_secs);
        if let Err(err) = dashboard::run(Arc::clone(&exchange), Arc::clone(&stop), deadline) {
            error!(error = %err, "Dashboard terminated");
        }
        stop.store(true, Ordering::Relaxed);
    } else if let Some(seconds) = config.run_seconds {
        info!(seconds, "Running for limited duration");
        thread::sleep(Duration::from_secs(seconds));
        stop.store(true, Ordering::Relaxed);
    }

    // Without a dashboard or a duration this blocks until the process is
    // terminated or the link hits a fatal error.
    let stats = sim_handle.join().unwrap_or_default();
    for handle in link_handles {
        let _ = handle.join();
    }

    info!(
        ticks_executed = stats.ticks_executed,
        ticks_missed = stats.ticks_missed,
        max_jitter_us = stats.max_jitter_us,
        emergency_stops = stats.emergency_stops,
        "Run complete"
    );

    !fatal.load(Ordering::Relaxed)
}
