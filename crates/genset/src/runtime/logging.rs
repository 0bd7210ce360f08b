use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Console output is pretty by default, JSON with `--json-logs`, and
/// suppressed entirely while the dashboard owns the terminal. With a log
/// directory, a daily-rolled file layer is added; the returned guard must
/// stay alive for the non-blocking writer to flush.
pub fn init_tracing(
    json_output: bool,
    log_dir: Option<&Path>,
    quiet_console: bool,
) -> Option<WorkerGuard> {
    // The core crate logs through the `log` facade; route those records
    // into the tracing pipeline.
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,genset=debug,genset_core=debug,genset_io=debug"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "genset.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if quiet_console {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    } else if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer().pretty())
            .init();
    }
    guard
}
