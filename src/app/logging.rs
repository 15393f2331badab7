use crate::app::config::AppConfig;
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process; call once
pub fn init_logging(config: &AppConfig) {
    let log_level = config.log_level();
    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|e| {
        eprintln!("Invalid log level '{log_level}' ({e}), falling back to info");
        EnvFilter::new("info")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.verbose >= 2)
        .with_thread_ids(config.verbose >= 3)
        .with_line_number(config.verbose >= 3)
        .init();

    debug!("inferbridge started with verbosity level: {}", config.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}
