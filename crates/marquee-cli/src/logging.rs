use anyhow::Result;
use catalog_sync_config::LoggingConfig;
use std::io;
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Build the filter directive from the verbosity flags.
///
/// 0 = configured level (info by default), 1 = debug with hyper's connection
/// chatter suppressed, 2+ = trace.
fn filter_directive(verbose_level: u8, quiet: bool, configured: Option<&str>) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose_level {
        0 => configured.unwrap_or("info").to_string(),
        1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn".to_string(),
        _ => "trace".to_string(),
    }
}

/// Split `logs/marquee.log` into the directory and the rotation prefix `marquee`.
fn rotation_parts(log_path: &Path) -> Result<(&Path, &str)> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    let log_prefix = log_filename.rsplitn(2, '.').nth(1).unwrap_or(log_filename);
    Ok((log_dir, log_prefix))
}

pub fn init_logging(verbose_level: u8, quiet: bool, config: Option<&LoggingConfig>) -> Result<()> {
    let directive = filter_directive(verbose_level, quiet, config.map(|c| c.level.as_str()));
    let filter = if quiet {
        EnvFilter::new(directive)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
    };

    // RUST_LOG_JSON wins over the config file; otherwise JSON when stdout is not a terminal
    let json = std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .ok()
        .or_else(|| config.and_then(|c| c.json))
        .unwrap_or_else(|| !io::stdout().is_terminal());

    let registry = Registry::default().with(filter);

    if let Some(log_path) = config.and_then(|c| c.file.as_ref()) {
        let (log_dir, log_prefix) = rotation_parts(log_path)?;
        std::fs::create_dir_all(log_dir)?;

        // marquee.2026-10-16, marquee.2026-10-17, ...
        let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix);

        if json {
            let json_layer = fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(file_appender);
            registry.with(json_layer).init();
        } else {
            let fmt_layer = fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(file_appender);
            registry.with(fmt_layer).init();
        }
    } else if json {
        let json_layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(fmt_layer).init();
    }

    Ok(())
}
