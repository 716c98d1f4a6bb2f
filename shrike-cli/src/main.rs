//! Shrike CLI
//!
//! Command-line interface for the Shrike word detector.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shrike_core::{Detector, Match};
use shrike_dict::{DictionaryWatcher, WatcherConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "shrike")]
#[command(about = "Shrike - noise-tolerant banned-word detection", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one input against a dictionary
    Scan {
        /// Dictionary file (one pattern per line)
        #[arg(short, long)]
        dict: PathBuf,

        /// Text file to scan (reads stdin when omitted)
        #[arg(short, long)]
        text: Option<PathBuf>,

        /// Emit matches as JSON records
        #[arg(long)]
        json: bool,
    },

    /// Load and build a dictionary without scanning
    Validate {
        /// Dictionary file
        #[arg(short, long)]
        dict: PathBuf,
    },

    /// Scan stdin line by line with periodic dictionary reload
    Run {
        /// Dictionary file
        #[arg(short, long)]
        dict: PathBuf,

        /// Dictionary poll interval in seconds
        #[arg(long, default_value_t = 5)]
        reload_secs: u64,

        /// Log level
        #[arg(short, long, default_value = "info")]
        log_level: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { dict, text, json } => {
            setup_logging("warn")?;
            scan_once(dict, text, json)?;
        }
        Commands::Validate { dict } => {
            setup_logging("info")?;
            validate_dictionary(dict)?;
        }
        Commands::Run {
            dict,
            reload_secs,
            log_level,
        } => {
            setup_logging(&log_level)?;
            run_stream(dict, reload_secs).await?;
        }
    }

    Ok(())
}

fn setup_logging(level: &str) -> Result<()> {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(())
}

fn scan_once(dict: PathBuf, text: Option<PathBuf>, json: bool) -> Result<()> {
    let words = shrike_dict::load_dictionary(&dict)?;
    let detector = Detector::new();
    detector.build(&words)?;

    let input = match text {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let matches = detector.process(&input);
    print_matches(&input, &matches, json)?;

    Ok(())
}

fn validate_dictionary(dict: PathBuf) -> Result<()> {
    let (words, stats) = shrike_dict::load_dictionary_with_stats(&dict)?;
    let detector = Detector::new();
    detector.build(&words)?;

    info!(
        loaded = stats.loaded,
        skipped = stats.skipped,
        patterns = detector.pattern_count(),
        "dictionary OK"
    );
    println!(
        "{}: {} patterns ({} lines skipped)",
        dict.display(),
        detector.pattern_count(),
        stats.skipped
    );

    Ok(())
}

async fn run_stream(dict: PathBuf, reload_secs: u64) -> Result<()> {
    let detector = Arc::new(Detector::new());
    let config = WatcherConfig::new(&dict)
        .with_poll_interval(Duration::from_secs(reload_secs.max(1)));
    let mut watcher = DictionaryWatcher::new(Arc::clone(&detector), config);

    let loaded = watcher.load_initial().await?;
    info!(patterns = loaded, "initial dictionary installed");
    watcher.start();

    info!("Scanning stdin. Press Ctrl+C to stop.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        let matches = detector.process(&line);
                        print_matches(&line, &matches, true)?;
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    watcher.stop();
    Ok(())
}

fn print_matches(text: &str, matches: &[Match], json: bool) -> Result<()> {
    for m in matches {
        if json {
            println!("{}", serde_json::to_string(m)?);
        } else {
            println!("{} {} {}", matched_span(text, m), m.head, m.tail);
        }
    }
    Ok(())
}

/// Slice the matched span out of `text` by inclusive char offsets
fn matched_span(text: &str, m: &Match) -> String {
    text.chars()
        .skip(m.head)
        .take(m.tail - m.head + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matched_span_char_offsets() {
        let text = "然后法.轮.功 我们";
        let m = Match { head: 2, tail: 6, pattern_id: 0 };
        assert_eq!(matched_span(text, &m), "法.轮.功");
    }
}
