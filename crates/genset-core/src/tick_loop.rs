use crate::exchange::{GeneratorSnapshot, StateExchange};
use crate::model::{GeneratorModel, Status};
use crate::noise::NoiseSource;
use crate::timebase::TimeBase;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct TickConfig {
    /// Simulation period. The reference cadence is four ticks per second.
    pub period: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(250),
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct TickStats {
    pub ticks_executed: u64,
    pub ticks_missed: u64,
    pub max_jitter_us: u64,
    pub emergency_stops: u64,
}

/// Fixed-period simulation driver.
///
/// Owns the model and the noise source; everything else talks to it
/// through the [`StateExchange`]. One instance per simulated unit.
pub struct SimThread<N: NoiseSource> {
    model: GeneratorModel,
    noise: N,
    config: TickConfig,
    exchange: Arc<StateExchange>,
    stats: TickStats,
    timebase: TimeBase,
}

impl<N: NoiseSource> SimThread<N> {
    pub fn new(
        model: GeneratorModel,
        noise: N,
        config: TickConfig,
        exchange: Arc<StateExchange>,
        timebase: TimeBase,
    ) -> Self {
        Self {
            model,
            noise,
            config,
            exchange,
            stats: TickStats::default(),
            timebase,
        }
    }

    /// Run ticks until `stop` is set.
    ///
    /// Flips the unit to `Running` before the first tick, then on every
    /// tick: drain a pending brake request, advance the model, publish a
    /// snapshot. Command draining happens before the model step so the
    /// tick computes against a settled `(target_rpm, status)` pair.
    pub fn run(&mut self, stop: &AtomicBool) {
        self.model.mark_running();

        let mut next_tick = Instant::now();
        while !stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now < next_tick {
                thread::sleep(next_tick - now);
            } else if self.stats.ticks_executed > 0 {
                self.stats.ticks_missed += 1;
                log::debug!("tick deadline missed by {:?}", now - next_tick);
                // Re-anchor rather than replaying the backlog.
                next_tick = now;
            }

            let tick_start = Instant::now();

            if self.exchange.take_emergency_stop() {
                if self.model.status() != Status::EmergencyStop {
                    self.stats.emergency_stops += 1;
                }
                self.model.emergency_brake();
            }

            self.model.update(&mut self.noise);

            let elapsed = tick_start.elapsed();
            let jitter_us = elapsed
                .saturating_sub(self.config.period)
                .as_micros() as u64;
            self.stats.max_jitter_us = self.stats.max_jitter_us.max(jitter_us);
            self.stats.ticks_executed += 1;

            self.exchange.publish(self.snapshot(jitter_us as u32));

            next_tick += self.config.period;
        }
    }

    fn snapshot(&self, tick_jitter_us: u32) -> GeneratorSnapshot {
        GeneratorSnapshot {
            timestamp_us: self.timebase.now_us(),
            tick: self.stats.ticks_executed,
            rpm: self.model.rpm(),
            target_rpm: self.model.target_rpm(),
            vibration_g: self.model.vibration_g(),
            voltage_l1_v: self.model.voltage_l1_v(),
            current_l1_a: self.model.current_l1_a(),
            power_kw: self.model.power_kw(),
            oil_pressure_bar: self.model.oil_pressure_bar(),
            health_pct: self.model.health_pct(),
            status: self.model.status(),
            tick_jitter_us,
            ticks_missed: self.stats.ticks_missed,
        }
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }
}
