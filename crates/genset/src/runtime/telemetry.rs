use genset_core::StateExchange;
use genset_core::Status;
use genset_io::metrics::{
    init_metrics, serve_metrics, CURRENT_A, EMERGENCY_STOPS, HEALTH_PCT, OIL_PRESSURE_BAR,
    POWER_KW, RPM, STATUS_CODE, TICKS_EXECUTED, TICKS_MISSED, TICK_JITTER_US, VIBRATION_G,
    VOLTAGE_V,
};
use std::sync::{atomic::AtomicBool, Arc};
use std::thread;
use std::time::Duration;
use tracing::info;

pub fn init() {
    init_metrics();
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone())
    })
}

/// Mirror the latest snapshot into the Prometheus gauges.
pub fn start_metrics_updater(
    exchange: Arc<StateExchange>,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut last_tick = 0u64;
        let mut last_missed = 0u64;
        let mut was_stopped = false;
        while !stop.load(std::sync::atomic::Ordering::Relaxed) {
            let snapshot = exchange.latest();
            RPM.set(snapshot.rpm);
            VOLTAGE_V.set(snapshot.voltage_l1_v);
            CURRENT_A.set(snapshot.current_l1_a);
            POWER_KW.set(snapshot.power_kw);
            OIL_PRESSURE_BAR.set(snapshot.oil_pressure_bar);
            VIBRATION_G.set(snapshot.vibration_g);
            HEALTH_PCT.set(snapshot.health_pct);
            STATUS_CODE.set(snapshot.status.code() as f64);

            if snapshot.tick > last_tick {
                TICKS_EXECUTED.inc_by(snapshot.tick - last_tick);
                TICK_JITTER_US.observe(snapshot.tick_jitter_us as f64);
                last_tick = snapshot.tick;
            }
            if snapshot.ticks_missed > last_missed {
                TICKS_MISSED.inc_by(snapshot.ticks_missed - last_missed);
                last_missed = snapshot.ticks_missed;
            }
            if snapshot.status == Status::EmergencyStop && !was_stopped {
                EMERGENCY_STOPS.inc();
                was_stopped = true;
            }

            thread::sleep(Duration::from_millis(200));
        }
    })
}
