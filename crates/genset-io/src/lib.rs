pub mod metrics;
pub mod mqtt;
pub mod protocol;

pub use metrics::{init_metrics, serve_metrics};
pub use mqtt::{run_publisher, LinkConfig, LinkError, MqttLink, TelemetryPublisher};
pub use protocol::{ControlCommand, TelemetryRecord, CONTROL_CLEAR_PAYLOAD};
