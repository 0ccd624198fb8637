use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn filter_for(verbose_level: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let filter_str = match verbose_level {
            0 => "warn,skysettle=info",
            1 => "info,skysettle=debug",
            _ => "debug,skysettle=trace",
        };
        EnvFilter::new(filter_str)
    }
}

/// Log to stderr so stdout only carries rendered answers.
pub fn setup_logging(verbose_level: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose_level))
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(io::stderr)
        .init();
}

/// Log to a file so log lines do not tear the interactive prompt.
pub fn setup_logging_for_session(verbose_level: u8) -> PathBuf {
    let log_file_path = crate::config::cache_dir().join("session.log");
    if let Some(parent) = log_file_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!(
                "Warning: Could not open log file {}: {err}, logging to stderr",
                log_file_path.display()
            );
            setup_logging(verbose_level);
            return log_file_path;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose_level))
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(move || -> Box<dyn io::Write + Send> {
            match file.try_clone() {
                Ok(file) => Box::new(file),
                Err(_) => Box::new(io::sink()),
            }
        })
        .init();

    log_file_path
}
