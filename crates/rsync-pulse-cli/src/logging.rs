use std::env;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Console default stays quiet so the spinner is not interrupted.
pub const CONSOLE_DEFAULT_LEVEL: &str = "warn";
pub const FILE_DEFAULT_LEVEL: &str = "debug";

fn parse_filter(var: &str, directives: Option<&str>, default: &str) -> EnvFilter {
    let Some(directives) = directives else {
        return EnvFilter::new(default);
    };
    EnvFilter::try_new(directives).unwrap_or_else(|err| {
        eprintln!("Ignoring invalid {}={:?}: {}", var, directives, err);
        EnvFilter::new(default)
    })
}

fn env_filter(var: &str, default: &str) -> EnvFilter {
    parse_filter(var, env::var(var).ok().as_deref(), default)
}

/// Console (stderr) gets `TRACING_LEVEL`, the log file gets `FILE_LOG_LEVEL`.
pub fn init_logger() -> impl Drop {
    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/rsync-pulse.log".to_string());

    let file_appender = tracing_appender::rolling::never("./", log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true)
                .with_filter(env_filter("TRACING_LEVEL", CONSOLE_DEFAULT_LEVEL)),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(env_filter("FILE_LOG_LEVEL", FILE_DEFAULT_LEVEL)),
        )
        .init();

    debug!("Tracing is configured for stderr and file logging.");

    guard
}
