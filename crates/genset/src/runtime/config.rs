use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub run_seconds: Option<u64>,
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub telemetry_topic: String,
    pub control_topic: String,
    pub tick_ms: u64,
    pub seed: Option<u64>,
    pub mqtt_enabled: bool,
    pub json_logs: bool,
    pub log_dir: Option<PathBuf>,
    pub metrics_addr: Option<String>,
    pub dashboard: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            run_seconds: None,
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "genset-sim".to_string(),
            telemetry_topic: "factory/generator/telemetry".to_string(),
            control_topic: "factory/generator/control".to_string(),
            tick_ms: 250,
            seed: None,
            mqtt_enabled: true,
            json_logs: false,
            log_dir: None,
            metrics_addr: None,
            dashboard: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--broker" => {
                    if i + 1 < args.len() {
                        cfg.broker_host = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--port" => {
                    if i + 1 < args.len() {
                        cfg.broker_port = args[i + 1].parse().unwrap_or(1883);
                        i += 1;
                    }
                }
                "--client-id" => {
                    if i + 1 < args.len() {
                        cfg.client_id = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--telemetry-topic" => {
                    if i + 1 < args.len() {
                        cfg.telemetry_topic = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--control-topic" => {
                    if i + 1 < args.len() {
                        cfg.control_topic = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--tick-ms" => {
                    if i + 1 < args.len() {
                        cfg.tick_ms = args[i + 1].parse().unwrap_or(250);
                        i += 1;
                    }
                }
                "--seed" => {
                    if i + 1 < args.len() {
                        cfg.seed = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--run-seconds" => {
                    if i + 1 < args.len() {
                        cfg.run_seconds = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--no-mqtt" => {
                    cfg.mqtt_enabled = false;
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--log-dir" => {
                    if i + 1 < args.len() {
                        cfg.log_dir = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--metrics-addr" => {
                    if i + 1 < args.len() {
                        cfg.metrics_addr = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--dashboard" => {
                    cfg.dashboard = true;
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        cfg
    }

    pub fn print_help() {
        println!(
            r#"genset - heavy generator simulator with MQTT telemetry

USAGE:
    genset [OPTIONS]

OPTIONS:
    --broker <HOST>           MQTT broker host [default: localhost]
    --port <PORT>             MQTT broker port [default: 1883]
    --client-id <ID>          MQTT client identifier [default: genset-sim]
    --telemetry-topic <T>     Telemetry topic [default: factory/generator/telemetry]
    --control-topic <T>       Control topic [default: factory/generator/control]
    --tick-ms <MS>            Simulation tick period in milliseconds [default: 250]
    --seed <U64>              Seed the sensor noise for a reproducible run
    --run-seconds <SECS>      Run for a fixed duration then exit
    --no-mqtt                 Disable the broker link (standalone simulation)
    --json-logs               Output logs in JSON format (for log aggregation)
    --log-dir <PATH>          Also write logs to a daily-rolled file in PATH
    --metrics-addr <ADDR>     Enable Prometheus metrics server (e.g., 0.0.0.0:9090)
    --dashboard               Render the live terminal dashboard (press q to quit)
    -h, --help                Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                  Set log filter (e.g., RUST_LOG=debug,genset_core=trace)

EXAMPLES:
    # Feed a local Mosquitto and watch the dashboard
    genset --dashboard

    # Headless run with metrics, against a remote broker
    genset --broker 10.0.0.5 --json-logs --metrics-addr 0.0.0.0:9090

    # Deterministic short run without a broker
    genset --no-mqtt --seed 42 --run-seconds 10
"#
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RuntimeConfig {
        let mut full = vec!["genset".to_string()];
        full.extend(args.iter().map(|s| s.to_string()));
        RuntimeConfig::from_args(&full)
    }

    #[test]
    fn defaults_match_reference_deployment() {
        let cfg = parse(&[]);
        assert_eq!(cfg.broker_host, "localhost");
        assert_eq!(cfg.broker_port, 1883);
        assert_eq!(cfg.tick_ms, 250);
        assert!(cfg.mqtt_enabled);
        assert!(!cfg.dashboard);
    }

    #[test]
    fn flags_are_parsed() {
        let cfg = parse(&[
            "--broker",
            "broker.example",
            "--port",
            "8883",
            "--tick-ms",
            "100",
            "--seed",
            "7",
            "--no-mqtt",
            "--dashboard",
            "--run-seconds",
            "30",
        ]);
        assert_eq!(cfg.broker_host, "broker.example");
        assert_eq!(cfg.broker_port, 8883);
        assert_eq!(cfg.tick_ms, 100);
        assert_eq!(cfg.seed, Some(7));
        assert!(!cfg.mqtt_enabled);
        assert!(cfg.dashboard);
        assert_eq!(cfg.run_seconds, Some(30));
    }

    #[test]
    fn help_short_circuits() {
        let cfg = parse(&["--help", "--broker", "ignored"]);
        assert!(cfg.show_help);
        assert_eq!(cfg.broker_host, "localhost");
    }
}
