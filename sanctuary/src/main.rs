#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sanctuary::{
    assets::media_urls,
    config::Settings,
    entitlement::{check_entitlement, HttpPlanVerifier},
    link::estimate_encoded_len,
    model::SanctuaryConfig,
    payload::{open, seal, OpenedSanctuary, SealOptions},
    render::RevealView,
    schedule::{parse_utc_offset, Clock, DebugOverride, FixedClock, RevealGate, RevealSchedule, SystemClock},
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sanctuary", version, about = "Seal and open zero-knowledge gift links")]
struct Cli {
    /// YAML settings file (environment variables with SANCTUARY_ prefix override it)
    #[arg(long, global = true, default_value = "sanctuary.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate and encrypt a configuration JSON file into a share link
    Seal {
        file: PathBuf,
        /// Print the link and its size report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Estimate the link length a configuration will produce
    Estimate { file: PathBuf },
    /// Decrypt a share link and print its configuration
    Open {
        url: String,
        #[arg(long)]
        passcode: Option<String>,
    },
    /// Show which days of a share link are revealed
    Schedule {
        url: String,
        #[arg(long)]
        passcode: Option<String>,
        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long, value_parser = parse_at)]
        at: Option<DateTime<Utc>>,
        /// Reveal every day regardless of date (preview only)
        #[arg(long)]
        debug_unlock_all: bool,
    },
    /// List media URLs referenced by a share link
    Assets {
        url: String,
        #[arg(long)]
        passcode: Option<String>,
    },
    /// Check a share link's plan signature against the configured verifier
    Verify { url: String },
}

fn parse_at(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

async fn open_link(url: &str, passcode: Option<&str>) -> anyhow::Result<OpenedSanctuary> {
    let mut opened = open(url).await?;
    match passcode {
        Some(code) if !opened.is_unlocked() => opened.unlock_with(code).await?,
        Some(_) => tracing::info!("link has no passcode lock; --passcode ignored"),
        None if !opened.is_unlocked() => {
            tracing::warn!("link is passcode-locked; notes and video stay hidden without --passcode");
        }
        None => {}
    }
    Ok(opened)
}

fn read_config(path: &Path) -> anyhow::Result<SanctuaryConfig> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Load and validate configuration first (fail-fast)
    let settings = Settings::load_from(&cli.config.to_string_lossy()).map_err(|e| anyhow::anyhow!("{e}"))?;

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&settings.logging.level)?)
        .with_writer(std::io::stderr)
        .init();

    // Init banner
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sanctuary starting up");

    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Seal { file, json } => {
            let config = read_config(&file)?;
            let sealed = seal(&config, &SealOptions::from(&settings)).await?;
            if json {
                let body = serde_json::json!({ "url": sealed.url.as_str(), "report": sealed.report });
                writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
            } else {
                writeln!(out, "{}", sealed.url)?;
            }
        }
        Command::Estimate { file } => {
            let config = read_config(&file)?;
            let estimate = settings.link.origin.len() + "/?#".len() + estimate_encoded_len(&config)?;
            let soft_limit = settings.link.soft_limit_bytes;
            writeln!(
                out,
                "~{estimate} bytes (soft limit {soft_limit}), {} bytes of note text",
                config.notes_content_len()
            )?;
            if estimate > soft_limit {
                tracing::warn!(estimate, soft_limit, "link will likely exceed the soft length limit");
            }
        }
        Command::Open { url, passcode } => {
            let opened = open_link(&url, passcode.as_deref()).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(opened.config())?)?;
        }
        Command::Schedule {
            url,
            passcode,
            at,
            debug_unlock_all,
        } => {
            let opened = open_link(&url, passcode.as_deref()).await?;
            let tz = parse_utc_offset(&settings.schedule.utc_offset)?;
            let schedule = RevealSchedule::from_config(opened.config(), tz)?;
            let clock: Arc<dyn Clock> = match at {
                Some(at) => Arc::new(FixedClock::new(at)),
                None => Arc::new(SystemClock),
            };
            let debug = DebugOverride::from_flag(debug_unlock_all || settings.debug.unlock_all);
            if debug == DebugOverride::UnlockAll {
                tracing::warn!("debug override active: every day is shown unlocked");
            }
            let gate = RevealGate::new(schedule, clock).with_debug(debug);
            let view = RevealView::build(opened.config(), &gate);
            writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
        }
        Command::Assets { url, passcode } => {
            let opened = open_link(&url, passcode.as_deref()).await?;
            for media in media_urls(opened.config())? {
                writeln!(out, "{media}")?;
            }
        }
        Command::Verify { url } => {
            let opened = open_link(&url, None).await?;
            let verifier = HttpPlanVerifier::new(settings.verifier.base_url.clone());
            let entitlement = check_entitlement(opened.config(), &verifier).await;
            writeln!(out, "{}", serde_json::to_string(&entitlement)?)?;
        }
    }

    Ok(())
}
