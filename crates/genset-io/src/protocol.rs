use genset_core::GeneratorSnapshot;
use serde::Serialize;

/// Retained payload published to the control topic at startup so a stale
/// emergency signal held by the broker cannot re-trigger the brake on
/// reconnect.
pub const CONTROL_CLEAR_PAYLOAD: &str = "0";

/// One telemetry record as consumers see it on the wire.
///
/// Field names, field order and rounding are a compatibility contract
/// with existing dashboards; nothing here changes without versioning the
/// topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub rpm: i64,
    pub vibration: f64,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub oil_pressure: f64,
    pub health: f64,
    pub status: String,
}

impl TelemetryRecord {
    pub fn from_snapshot(snapshot: &GeneratorSnapshot) -> Self {
        Self {
            rpm: snapshot.rpm.trunc() as i64,
            vibration: round_to(snapshot.vibration_g, 4),
            voltage: round_to(snapshot.voltage_l1_v, 1),
            current: round_to(snapshot.current_l1_a, 1),
            power: round_to(snapshot.power_kw, 2),
            oil_pressure: round_to(snapshot.oil_pressure_bar, 2),
            health: round_to(snapshot.health_pct, 1),
            status: snapshot.status.to_string(),
        }
    }
}

/// Round half away from zero to the given number of decimal places.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Intent decoded from a raw control-topic payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    EmergencyStop,
}

impl ControlCommand {
    /// A payload whose text contains `"1"` or `"BRAKE"` engages the
    /// brake. Anything else, including undecodable bytes, is ignored;
    /// the retained clear payload `"0"` falls through here.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(payload).ok()?;
        if text.contains('1') || text.contains("BRAKE") {
            Some(Self::EmergencyStop)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genset_core::tags;
    use genset_core::Status;

    fn snapshot() -> GeneratorSnapshot {
        GeneratorSnapshot {
            rpm: 1799.6,
            vibration_g: 0.225_049_9,
            voltage_l1_v: 218.467,
            current_l1_a: 151.44,
            power_kw: 28.126_9,
            oil_pressure_bar: 5.4321,
            health_pct: 99.8,
            status: Status::Running,
            ..Default::default()
        }
    }

    #[test]
    fn rounding_contract() {
        let record = TelemetryRecord::from_snapshot(&snapshot());
        assert_eq!(record.rpm, 1799);
        assert_eq!(record.vibration, 0.225);
        assert_eq!(record.voltage, 218.5);
        assert_eq!(record.current, 151.4);
        assert_eq!(record.power, 28.13);
        assert_eq!(record.oil_pressure, 5.43);
        assert_eq!(record.health, 99.8);
        assert_eq!(record.status, "RUNNING");
    }

    #[test]
    fn rpm_is_truncated_not_rounded() {
        let mut snap = snapshot();
        snap.rpm = 1035.97;
        assert_eq!(TelemetryRecord::from_snapshot(&snap).rpm, 1035);
    }

    #[test]
    fn json_field_names_and_order() {
        let json = serde_json::to_string(&TelemetryRecord::from_snapshot(&snapshot())).unwrap();
        let keys: Vec<&str> = json
            .split('"')
            .skip(1)
            .step_by(2)
            .filter(|k| !k.is_empty())
            .collect();
        assert!(keys.starts_with(&[
            tags::RPM.key,
            tags::VIBRATION.key,
            tags::VOLTAGE.key,
            tags::CURRENT.key,
            tags::POWER.key,
            tags::OIL_PRESSURE.key,
            tags::HEALTH.key,
        ]));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "RUNNING");
        assert_eq!(value["rpm"], 1799);
    }

    #[test]
    fn emergency_stop_wire_string_uses_a_space() {
        let mut snap = snapshot();
        snap.status = Status::EmergencyStop;
        let record = TelemetryRecord::from_snapshot(&snap);
        assert_eq!(record.status, "EMERGENCY STOP");
    }

    #[test]
    fn control_payload_parsing() {
        assert_eq!(
            ControlCommand::parse(b"1"),
            Some(ControlCommand::EmergencyStop)
        );
        assert_eq!(
            ControlCommand::parse(b"BRAKE"),
            Some(ControlCommand::EmergencyStop)
        );
        assert_eq!(
            ControlCommand::parse(b"{\"value\": 1}"),
            Some(ControlCommand::EmergencyStop)
        );
        assert_eq!(ControlCommand::parse(b"0"), None);
        assert_eq!(ControlCommand::parse(b"release"), None);
        assert_eq!(ControlCommand::parse(b""), None);
        assert_eq!(ControlCommand::parse(&[0xff, 0xfe, 0x31]), None);
    }
}
