/// Telemetry field descriptor shared by the wire payload and metrics so
/// the two surfaces cannot drift apart.
#[derive(Debug, Clone, Copy)]
pub struct Tag {
    /// JSON payload key (wire contract).
    pub key: &'static str,
    /// Prometheus metric name.
    pub metric: &'static str,
    /// Engineering unit, for display.
    pub unit: &'static str,
}

pub const RPM: Tag = Tag {
    key: "rpm",
    metric: "genset_rpm",
    unit: "rpm",
};

pub const VIBRATION: Tag = Tag {
    key: "vibration",
    metric: "genset_vibration_g",
    unit: "g",
};

pub const VOLTAGE: Tag = Tag {
    key: "voltage",
    metric: "genset_voltage_l1_volts",
    unit: "V",
};

pub const CURRENT: Tag = Tag {
    key: "current",
    metric: "genset_current_l1_amperes",
    unit: "A",
};

pub const POWER: Tag = Tag {
    key: "power",
    metric: "genset_power_output_kilowatts",
    unit: "kW",
};

pub const OIL_PRESSURE: Tag = Tag {
    key: "oil_pressure",
    metric: "genset_oil_pressure_bar",
    unit: "bar",
};

pub const HEALTH: Tag = Tag {
    key: "health",
    metric: "genset_health_percent",
    unit: "%",
};

pub const STATUS: Tag = Tag {
    key: "status",
    metric: "genset_status_code",
    unit: "",
};

pub const TICK_JITTER_US: Tag = Tag {
    key: "tick_jitter_us",
    metric: "genset_tick_jitter_microseconds",
    unit: "us",
};
