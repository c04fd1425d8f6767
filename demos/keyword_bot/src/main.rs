//! Keyword Bot Example
//!
//! Loads a rule set from `parley.toml`, binds the rules' actions to a few
//! callbacks, and replays a transcript of widget events through the engine.
//!
//! # Transcript Format
//!
//! One JSON object per line:
//!
//! ```text
//! {"event":"open"}
//! {"event":"message","payload":{"type":"USER","text":"hello"}}
//! {"event":"close"}
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package keyword-bot -- \
//!     --config demos/keyword_bot/parley.toml \
//!     --transcript demos/keyword_bot/transcript.jsonl
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use parley::prelude::*;
use parley::runtime::{BoundHostSettings, validate_config};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "keyword-bot", about = "Replay widget events through a Parley rule set")]
struct Args {
    /// Configuration file. Without it the usual search paths are used.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-lines transcript, or `-` for stdin.
    #[arg(short, long, default_value = "-")]
    transcript: String,
}

/// One line of the transcript.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum HostEvent {
    Open,
    Close,
    Message { payload: RawPayload },
}

// ============================================================================
// Actions
// ============================================================================

fn greet(event: &MessageEvent<'_>) -> CallbackResult {
    println!("  -> greet: hello to you too (you said {:?})", event.text);
    Ok(())
}

fn shout(event: &MessageEvent<'_>) -> CallbackResult {
    println!("  -> shout: {}", event.text.to_uppercase());
    Ok(())
}

fn log_meta(event: &MessageEvent<'_>) -> CallbackResult {
    let metadata = serde_json::to_string(event.metadata)?;
    println!("  -> log_meta [{}]: {metadata}", event.direction);
    Ok(())
}

fn actions() -> ActionRegistry {
    ActionRegistry::new()
        .with("greet", greet)
        .with("shout", shout)
        .with("log_meta", log_meta)
}

// ============================================================================
// Widget loader
// ============================================================================

/// Stands in for the browser: there is no widget to inject here.
fn print_loader(url: &str, host: &BoundHostSettings) -> Result<(), CallbackError> {
    info!(url, settings = %host.to_value(), "Widget would be loaded");
    Ok(())
}

fn open_transcript(path: &str) -> Result<Box<dyn BufRead>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).with_context(|| format!("opening transcript {path}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let config = loader.load()?;
    validate_config(&config)?;
    init_from_config(&config.logging);

    let engine = config.engine_config(&actions())?;
    let hooks = HostHooks::new()
        .on_open(|| info!("Widget opened"))
        .on_close(|| info!("Widget closed"));
    let bot = InteractiveBot::create(engine, hooks, &print_loader)?;

    for (index, line) in open_transcript(&args.transcript)?.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let event: HostEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping unreadable transcript line");
                continue;
            }
        };

        match event {
            HostEvent::Open => {
                bot.host().on_open();
                println!("{line_no:>3}: open");
            }
            HostEvent::Close => {
                bot.host().on_close();
                println!("{line_no:>3}: close");
            }
            HostEvent::Message { payload } => {
                println!(
                    "{line_no:>3}: {} {:?}",
                    payload.direction,
                    payload.text.as_deref().unwrap_or_default()
                );
                let outcome = bot
                    .host()
                    .on_message(&payload)
                    .map_err(|e| anyhow!("callback failed on line {line_no}: {e}"))?;
                println!("     {outcome:?}");
            }
        }
    }

    Ok(())
}
