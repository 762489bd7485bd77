//! bundlelog demo CLI.
//!
//! Replays an error storm through the suppression engine and prints the
//! surviving stream, so the logarithmic bundling schedule can be watched
//! live:
//!
//! ```text
//! 14:44:07.001 INFO  storm: 204 errors following...
//! 14:44:07.012 ERROR storm: fail
//! 14:44:07.024 ERROR storm: fail
//! ...
//! 14:44:07.110 ERROR storm: [10 repetitions] fail
//! 14:44:07.480 ERROR storm: [20 repetitions] fail
//! 14:44:09.693 ERROR storm: [200 repetitions] fail
//! 14:44:11.700 ERROR storm: [204 repetitions] fail
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bundlelog_core::{BundleSuppressor, Record, Severity, Sink, SuppressorConfig};

#[derive(Debug, Parser)]
#[command(name = "bundlelog", version, about = "Log flood suppression demo")]
struct Args {
    /// Leading repetitions reported individually before bundling begins.
    #[arg(long)]
    min_repetitions: Option<u32>,

    /// Seconds of silence before a pending bundle is force-flushed
    /// (0 disables).
    #[arg(long)]
    max_delay: Option<f64>,

    /// Length of the first identical-message burst.
    #[arg(long, default_value_t = 204)]
    burst: u64,

    /// Length of the second burst, fired after the silence window.
    #[arg(long, default_value_t = 300)]
    second_burst: u64,

    /// Milliseconds between records within a burst.
    #[arg(long, default_value_t = 5)]
    pause_ms: u64,

    /// Optional TOML file with `min_repetitions` / `max_delay_secs` keys.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Diagnostic log level (overridden by RUST_LOG).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Sink printing surviving records to stdout, one formatted line each.
struct ConsoleSink;

impl Sink for ConsoleSink {
    fn deliver(&self, record: &Record) {
        let time = DateTime::from_timestamp_millis(record.timestamp_ms as i64)
            .map_or_else(|| "--:--:--".to_string(), |t| t.format("%H:%M:%S%.3f").to_string());
        println!(
            "{time} {:5} {}: {}",
            record.severity.to_string().to_uppercase(),
            record.logger,
            record.message
        );
    }
}

fn load_config(args: &Args) -> Result<SuppressorConfig> {
    let mut config = if let Some(path) = &args.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?
    } else {
        SuppressorConfig {
            // Demo default: flush quickly so the timer is visible.
            max_delay_secs: 2.0,
            ..Default::default()
        }
    };
    if let Some(min_repetitions) = args.min_repetitions {
        config.min_repetitions = min_repetitions;
    }
    if let Some(max_delay) = args.max_delay {
        config.max_delay_secs = max_delay;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    let silence = config.max_delay();
    tracing::info!(?config, "starting flood demo");

    let suppressor = BundleSuppressor::with_config(config, Box::new(ConsoleSink))?;
    let pause = Duration::from_millis(args.pause_ms);

    suppressor.observe(&Record::new(Severity::Info, "storm", "This is a test."));
    suppressor.observe(&Record::new(
        Severity::Info,
        "storm",
        format!("{} errors following...", args.burst + args.second_burst),
    ));
    for _ in 0..args.burst {
        suppressor.observe(&Record::new(Severity::Error, "storm", "fail"));
        std::thread::sleep(pause);
    }

    if !silence.is_zero() && args.second_burst > 0 {
        // Stay quiet long enough for the delayed flush to report the tail.
        std::thread::sleep(silence + Duration::from_millis(500));
        for _ in 0..args.second_burst {
            suppressor.observe(&Record::new(Severity::Error, "storm", "fail"));
            std::thread::sleep(pause);
        }
    }

    suppressor.observe(&Record::new(Severity::Info, "storm", "Test completed"));
    suppressor.flush_pending();

    let stats = suppressor.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
