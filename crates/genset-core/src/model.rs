use crate::noise::NoiseSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amplitude of the load current jitter in amperes.
const CURRENT_JITTER_A: f64 = 5.0;
/// Amplitude of the line voltage jitter in volts.
const VOLTAGE_JITTER_V: f64 = 0.5;
/// Amplitude of the oil pressure jitter in bar.
const OIL_JITTER_BAR: f64 = 0.1;
/// Upper bound of the one-sided wear vibration draw in g.
const WEAR_VIBRATION_G: f64 = 0.02;
/// Divisor mapping rpm to the baseline vibration in g.
const VIBRATION_RPM_DIVISOR: f64 = 8000.0;
/// Voltage sag per ampere of load.
const VOLTAGE_DROOP_V_PER_A: f64 = 0.01;

/// Operating state of the unit.
///
/// There is no path out of `EmergencyStop`; a braked unit coasts down and
/// stays down until the process is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "STARTING")]
    Starting,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "EMERGENCY STOP")]
    EmergencyStop,
}

impl Status {
    /// Numeric code for metrics: 0 starting, 1 running, 2 emergency stop.
    pub fn code(&self) -> u8 {
        match self {
            Status::Starting => 0,
            Status::Running => 1,
            Status::EmergencyStop => 2,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // These strings are the wire values existing consumers match on.
        let s = match self {
            Status::Starting => "STARTING",
            Status::Running => "RUNNING",
            Status::EmergencyStop => "EMERGENCY STOP",
        };
        f.write_str(s)
    }
}

/// Physical constants of the simulated unit.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Commanded speed at startup. 1800 rpm gives 60 Hz on a 4-pole set.
    pub target_rpm: f64,
    /// Fraction of the speed error closed per tick.
    pub rpm_gain: f64,
    /// Below this speed the unit carries no electrical load.
    pub excitation_rpm: f64,
    /// Nominal load current once excited, in amperes.
    pub load_current_a: f64,
    /// Open-circuit line voltage in volts.
    pub nominal_voltage_v: f64,
    /// Displacement power factor of the load. Constant in this model.
    pub power_factor: f64,
    /// Speed at which oil pressure reaches its full value.
    pub nominal_rpm: f64,
    /// Oil pressure at nominal speed, in bar.
    pub oil_pressure_full_bar: f64,
    /// A wear draw above this value costs one health step.
    pub wear_chance_threshold: f64,
    /// Health lost per qualifying tick, in percent.
    pub wear_step: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target_rpm: 1800.0,
            rpm_gain: 0.02,
            excitation_rpm: 1000.0,
            load_current_a: 150.0,
            nominal_voltage_v: 220.0,
            power_factor: 0.85,
            nominal_rpm: 1800.0,
            oil_pressure_full_bar: 5.5,
            wear_chance_threshold: 0.99,
            wear_step: 0.2,
        }
    }
}

/// The physical state of one diesel generator unit.
///
/// All state advances through [`update`](Self::update), one call per tick.
/// Derived quantities are pure functions of rpm, health and the tick's
/// noise draws; there is no hidden memory beyond the fields here.
#[derive(Debug, Clone)]
pub struct GeneratorModel {
    config: GeneratorConfig,
    rpm: f64,
    target_rpm: f64,
    vibration_g: f64,
    voltage_l1_v: f64,
    current_l1_a: f64,
    power_factor: f64,
    power_kw: f64,
    oil_pressure_bar: f64,
    health_pct: f64,
    status: Status,
}

impl GeneratorModel {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            rpm: 0.0,
            target_rpm: config.target_rpm,
            vibration_g: 0.02,
            voltage_l1_v: config.nominal_voltage_v,
            current_l1_a: 0.0,
            power_factor: config.power_factor,
            power_kw: 0.0,
            oil_pressure_bar: 0.0,
            health_pct: 100.0,
            status: Status::Starting,
            config,
        }
    }

    /// Advance all state by exactly one tick.
    ///
    /// The step order is fixed because later steps read earlier outputs
    /// within the same tick, and the noise draw order is part of the
    /// seeded-replay contract: current (only above the excitation
    /// threshold), voltage, oil, vibration, wear (only while running).
    pub fn update<N: NoiseSource + ?Sized>(&mut self, noise: &mut N) {
        // 1. Shaft inertia: close a fixed fraction of the speed error.
        self.rpm += (self.target_rpm - self.rpm) * self.config.rpm_gain;

        // 2. Electrical. Hard threshold, not a ramp: below excitation
        // speed the unit draws zero current regardless of margin.
        if self.rpm > self.config.excitation_rpm {
            self.current_l1_a = self.config.load_current_a
                + noise.uniform(-CURRENT_JITTER_A, CURRENT_JITTER_A);
        } else {
            self.current_l1_a = 0.0;
        }
        self.voltage_l1_v = self.config.nominal_voltage_v
            - self.current_l1_a * VOLTAGE_DROOP_V_PER_A
            + noise.uniform(-VOLTAGE_JITTER_V, VOLTAGE_JITTER_V);
        self.power_kw = self.voltage_l1_v * self.current_l1_a * self.power_factor / 1000.0;

        // 3. Fluids. Linear in rpm and deliberately unclamped; jitter can
        // push the reading slightly negative near standstill.
        self.oil_pressure_bar = (self.rpm / self.config.nominal_rpm)
            * self.config.oil_pressure_full_bar
            + noise.uniform(-OIL_JITTER_BAR, OIL_JITTER_BAR);

        // 4. Vibration. The wear term is one-sided: degradation only ever
        // adds vibration above the rpm baseline.
        let health_factor = (100.0 - self.health_pct) / 10.0;
        self.vibration_g = self.rpm / VIBRATION_RPM_DIVISOR
            + noise.uniform(0.0, WEAR_VIBRATION_G) * health_factor;

        // 5. Wear. Independent per-tick event, only while running. The
        // draw is skipped entirely in other states.
        if self.status == Status::Running
            && noise.uniform(0.0, 1.0) > self.config.wear_chance_threshold
        {
            self.health_pct -= self.config.wear_step;
        }
    }

    /// Engage the emergency brake: zero the setpoint and latch the status.
    ///
    /// The shaft is not stopped instantly; subsequent ticks coast it down
    /// through the normal relaxation. Idempotent.
    pub fn emergency_brake(&mut self) {
        if self.status != Status::EmergencyStop {
            log::warn!("emergency brake engaged, unit coasting to standstill");
        }
        self.target_rpm = 0.0;
        self.status = Status::EmergencyStop;
    }

    /// Flip a freshly constructed unit from `Starting` to `Running`.
    /// Called once by the scheduling driver; never leaves `EmergencyStop`.
    pub fn mark_running(&mut self) {
        if self.status == Status::Starting {
            self.status = Status::Running;
        }
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    pub fn target_rpm(&self) -> f64 {
        self.target_rpm
    }

    pub fn vibration_g(&self) -> f64 {
        self.vibration_g
    }

    pub fn voltage_l1_v(&self) -> f64 {
        self.voltage_l1_v
    }

    pub fn current_l1_a(&self) -> f64 {
        self.current_l1_a
    }

    pub fn power_factor(&self) -> f64 {
        self.power_factor
    }

    pub fn power_kw(&self) -> f64 {
        self.power_kw
    }

    pub fn oil_pressure_bar(&self) -> f64 {
        self.oil_pressure_bar
    }

    pub fn health_pct(&self) -> f64 {
        self.health_pct
    }

    pub fn status(&self) -> Status {
        self.status
    }

    #[cfg(test)]
    pub(crate) fn force_rpm(&mut self, rpm: f64) {
        self.rpm = rpm;
    }

    #[cfg(test)]
    pub(crate) fn force_health(&mut self, health: f64) {
        self.health_pct = health;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::test_support::{Script, Silent};
    use crate::noise::SeededNoise;

    fn running_model() -> GeneratorModel {
        let mut model = GeneratorModel::new(GeneratorConfig::default());
        model.mark_running();
        model
    }

    #[test]
    fn first_tick_from_standstill() {
        let mut model = running_model();
        model.update(&mut Silent);

        assert_eq!(model.rpm(), 36.0);
        assert_eq!(model.current_l1_a(), 0.0);
        assert_eq!(model.voltage_l1_v(), 220.0);
        assert_eq!(model.power_kw(), 0.0);
        assert!((model.oil_pressure_bar() - 0.11).abs() < 1e-12);
        assert!((model.vibration_g() - 36.0 / 8000.0).abs() < 1e-12);
        assert_eq!(model.health_pct(), 100.0);
    }

    #[test]
    fn rpm_approach_is_monotonic_and_never_overshoots() {
        let mut model = running_model();
        let mut previous = model.rpm();
        for _ in 0..600 {
            model.update(&mut Silent);
            assert!(model.rpm() > previous);
            assert!(model.rpm() < model.target_rpm());
            previous = model.rpm();
        }
        // 0.98^600 leaves well under a hundredth of the initial error.
        assert!(model.target_rpm() - model.rpm() < 0.02);
    }

    #[test]
    fn no_current_at_or_below_excitation_speed() {
        let mut model = running_model();
        // 900 relaxes to 918 this tick, still under the 1000 rpm threshold.
        model.force_rpm(900.0);
        model.update(&mut Silent);
        assert!(model.rpm() <= 1000.0);
        assert_eq!(model.current_l1_a(), 0.0);
        assert_eq!(model.power_kw(), 0.0);
    }

    #[test]
    fn current_band_once_excited() {
        let mut model = running_model();
        let mut noise = SeededNoise::new(7);
        let mut seen_load = false;
        for _ in 0..400 {
            model.update(&mut noise);
            if model.rpm() > 1000.0 {
                seen_load = true;
                assert!(model.current_l1_a() >= 145.0 && model.current_l1_a() <= 155.0);
                assert!(model.voltage_l1_v() > 217.0 && model.voltage_l1_v() < 221.0);
                assert!(model.power_kw() > 0.0);
            } else {
                assert_eq!(model.current_l1_a(), 0.0);
            }
        }
        assert!(seen_load);
    }

    #[test]
    fn emergency_brake_is_immediate_and_idempotent() {
        let mut model = running_model();
        for _ in 0..50 {
            model.update(&mut Silent);
        }
        let rpm_before = model.rpm();

        model.emergency_brake();
        assert_eq!(model.status(), Status::EmergencyStop);
        assert_eq!(model.target_rpm(), 0.0);
        assert_eq!(model.rpm(), rpm_before);

        model.emergency_brake();
        assert_eq!(model.status(), Status::EmergencyStop);
        assert_eq!(model.target_rpm(), 0.0);
    }

    #[test]
    fn braked_unit_coasts_down_monotonically() {
        let mut model = running_model();
        for _ in 0..100 {
            model.update(&mut Silent);
        }
        model.emergency_brake();

        let mut previous = model.rpm();
        for _ in 0..500 {
            model.update(&mut Silent);
            assert!(model.rpm() < previous);
            assert!(model.rpm() > 0.0);
            previous = model.rpm();
        }
    }

    #[test]
    fn braked_unit_cannot_return_to_running() {
        let mut model = running_model();
        model.emergency_brake();
        model.mark_running();
        assert_eq!(model.status(), Status::EmergencyStop);
    }

    #[test]
    fn wear_draw_order_below_excitation() {
        // Draws while running below excitation speed: voltage, oil,
        // vibration, wear. A draw above the threshold costs 0.2 health.
        let mut model = running_model();
        model.update(&mut Script::of(&[0.0, 0.0, 0.0, 0.995]));
        assert!((model.health_pct() - 99.8).abs() < 1e-12);

        // Exactly at the threshold is not a wear event.
        model.update(&mut Script::of(&[0.0, 0.0, 0.0, 0.99]));
        assert!((model.health_pct() - 99.8).abs() < 1e-12);
    }

    #[test]
    fn no_wear_draw_unless_running() {
        // A starting unit takes only the three sensor draws; the Script
        // stub panics if the wear draw were taken.
        let mut model = GeneratorModel::new(GeneratorConfig::default());
        model.update(&mut Script::of(&[0.0, 0.0, 0.0]));
        assert_eq!(model.health_pct(), 100.0);

        let mut model = running_model();
        model.emergency_brake();
        model.update(&mut Script::of(&[0.0, 0.0, 0.0]));
        assert_eq!(model.health_pct(), 100.0);
    }

    #[test]
    fn degraded_health_raises_vibration_floor() {
        let mut worn = running_model();
        worn.force_health(50.0);
        worn.force_rpm(1800.0);
        // Above excitation speed the draws are current, voltage, oil,
        // vibration, wear. Health 50 scales the 0.015 draw by 5.
        worn.update(&mut Script::of(&[0.0, 0.0, 0.0, 0.015, 0.5]));
        let baseline = worn.rpm() / 8000.0;
        assert!(worn.vibration_g() > baseline);
    }

    #[test]
    fn seeded_runs_replay_identically() {
        let mut a = running_model();
        let mut b = running_model();
        let mut noise_a = SeededNoise::new(1234);
        let mut noise_b = SeededNoise::new(1234);
        for _ in 0..300 {
            a.update(&mut noise_a);
            b.update(&mut noise_b);
        }
        assert_eq!(a.rpm(), b.rpm());
        assert_eq!(a.voltage_l1_v(), b.voltage_l1_v());
        assert_eq!(a.health_pct(), b.health_pct());
        assert_eq!(a.vibration_g(), b.vibration_g());
    }
}
