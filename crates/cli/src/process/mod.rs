pub mod utils;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initialize logging and the panic handler.
///
/// Logs go to stderr; stdout is reserved for command output (image bytes
/// for `get`). The returned guard must be kept alive for the duration of
/// the program.
pub fn init_logging(log_level: tracing::Level) -> tracing_appender::non_blocking::WorkerGuard {
    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stderr_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();

    utils::register_panic_logger();
    utils::report_build_info();

    stderr_guard
}
