use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("deskbell_core=debug,deskbell_cli=debug,info")
        } else {
            EnvFilter::new("deskbell_core=info,deskbell_cli=info,warn")
        }
    })
}

/// Install the global subscriber.
///
/// Logs go to stderr unless `DESKBELL_LOG_FILE` names a file, in which case
/// they are appended there without ANSI colours.
pub fn init_tracing(verbose: bool) {
    let file_logging = std::env::var("DESKBELL_LOG_FILE").ok();

    if let Some(log_path) = file_logging {
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => {
                let file_layer = fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_filter(default_filter(verbose));

                let _ = tracing_subscriber::registry().with(file_layer).try_init();
                return;
            }
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", log_path, e);
            }
        }
    }

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_filter(default_filter(verbose));

    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}
