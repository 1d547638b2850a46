//! Logging setup
//!
//! Console output by default; daily-rolling file output when a log
//! directory is configured. RUST_LOG overrides the configured level.

use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::core::Config;

pub fn init_logger(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = &config.log_dir {
        let log_path = Path::new(dir);
        if !log_path.exists() {
            let _ = std::fs::create_dir_all(log_path);
        }
        let file_appender = tracing_appender::rolling::daily(dir, "cortado-server");
        subscriber.with_writer(file_appender).with_ansi(false).init();
        return;
    }

    subscriber.init();
}
