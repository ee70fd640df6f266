//! Fingerspelling Recognizer (fsr-rec) - Main entry point
//!
//! Runs recorded or synthetic landmark streams through the recognition
//! pipeline and prints the resulting sentence.
//!
//! Commands:
//! - `replay`: feed a JSON Lines replay file through the pipeline
//! - `demo`: spell a text with synthetic hand poses

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fsr_common::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use fsr_common::events::{EventBus, SpellEvent};
use fsr_rec::classifier::RecordedClassifier;
use fsr_rec::config::RecognizerConfig;
use fsr_rec::landmarks::LandmarkFrame;
use fsr_rec::replay::{load_replay, write_replay, Replay};
use fsr_rec::session::RecognitionSession;
use fsr_rec::source::{latest_frame_channel, run_session, stop_signal, FrameQueue, RunSummary};
use fsr_rec::synthetic::{ScriptOptions, SpellingScript};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for fsr-rec
#[derive(Parser, Debug)]
#[command(name = "fsr-rec")]
#[command(about = "Fingerspelling recognizer")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Log level (overrides the configuration file; RUST_LOG overrides both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded landmark stream
    Replay {
        /// JSON Lines replay file
        #[arg(short, long)]
        input: PathBuf,

        /// Publish frames in real time at this rate through the latest-frame slot
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Spell a text with synthetic hand poses
    Demo {
        /// Text to spell (letters and spaces)
        #[arg(short, long)]
        text: String,

        /// Also write the synthetic stream as a replay file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Publish frames in real time at this rate through the latest-frame slot
        #[arg(long)]
        fps: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let toml_config =
        TomlConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml_config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("fsr_rec={level},fsr_common={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    let config = RecognizerConfig::from_toml(&toml_config).context("Invalid configuration")?;

    let (replay, fps) = match args.command {
        Command::Replay { input, fps } => {
            let replay = load_replay(&input)
                .with_context(|| format!("Failed to load replay {}", input.display()))?;
            (replay, fps)
        }
        Command::Demo { text, export, fps } => {
            let script =
                SpellingScript::new(&text, &config.groups, &ScriptOptions::for_config(&config))
                    .context("Failed to build spelling script")?;
            info!(
                "Spelling {:?} with {} synthetic frames",
                text,
                script.records().len()
            );
            if let Some(path) = export {
                write_replay(&path, script.records())
                    .with_context(|| format!("Failed to export {}", path.display()))?;
            }
            (
                Replay {
                    records: script.into_records(),
                },
                fps,
            )
        }
    };

    let (frames, classifier) = replay.into_parts();
    let (sentence, summary) = recognize(&config, frames, classifier, fps).await?;

    println!("{}", sentence);
    info!(
        "{} frames, {} skipped, {} commits, {} dropped{}",
        summary.frames,
        summary.skipped,
        summary.commits.len(),
        summary.dropped_frames,
        if summary.stopped { " (stopped)" } else { "" }
    );
    Ok(())
}

/// Run frames through a fresh session; returns the final sentence
async fn recognize(
    config: &RecognizerConfig,
    frames: Vec<LandmarkFrame>,
    classifier: RecordedClassifier,
    fps: Option<u32>,
) -> Result<(String, RunSummary)> {
    let events = EventBus::new(config.event_capacity);
    let logger = tokio::spawn(log_events(events.subscribe()));

    let mut session = RecognitionSession::new(config, classifier, events.clone());
    let sentence = session.sentence_handle();

    let (stop, mut stop_rx) = stop_signal();
    let watcher = tokio::spawn(async move {
        shutdown_signal().await;
        stop.stop();
    });

    let summary = match fps {
        Some(fps) => {
            let (publisher, mut receiver) = latest_frame_channel();
            let interval = fsr_common::time::frame_interval(fps);
            let capture = tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                for frame in frames {
                    ticker.tick().await;
                    if publisher.is_closed() {
                        break;
                    }
                    publisher.publish(frame);
                }
            });
            let summary = run_session(&mut session, &mut receiver, &mut stop_rx).await;
            capture.abort();
            summary
        }
        None => {
            let mut queue = FrameQueue::new(frames);
            run_session(&mut session, &mut queue, &mut stop_rx).await
        }
    };
    watcher.abort();

    let text = sentence.snapshot();

    // Every bus clone must go before the logger sees the channel close
    drop(sentence);
    drop(session);
    drop(events);
    if let Err(e) = logger.await {
        warn!("Event logger ended abnormally: {}", e);
    }

    let summary = summary.context("Recognition failed")?;
    Ok((text, summary))
}

/// Log every broadcast event until the bus closes
async fn log_events(mut rx: tokio::sync::broadcast::Receiver<SpellEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match &event {
                SpellEvent::CharacterCommitted {
                    character,
                    sentence,
                    ..
                } => info!("Committed {} -> {:?}", character, sentence),
                SpellEvent::ControlActionCommitted {
                    action, sentence, ..
                } => info!("Committed {} -> {:?}", action, sentence),
                SpellEvent::WordFinalized { word, .. } => info!("Word finalized: {:?}", word),
                SpellEvent::RecognitionUnavailable { reason, .. } => {
                    warn!("Recognition unavailable: {}", reason)
                }
                other => debug!("Event: {}", other.event_type()),
            },
            Err(RecvError::Lagged(missed)) => {
                warn!("Event logger lagged; missed {} events", missed)
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping recognition");
        },
        _ = terminate => {
            info!("Received terminate signal, stopping recognition");
        },
    }
}
