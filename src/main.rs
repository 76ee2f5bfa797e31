use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod engines;
mod error;
mod preprocessing;
mod solver;
mod vote;

use error::CaptchaError;
use preprocessing::Preset;
use solver::{Captcha, Solver};

#[derive(Parser, Debug)]
#[command(name = "captcha-digits")]
#[command(about = "Read a 6-digit numeric captcha by voting over OCR passes")]
#[command(version)]
pub struct Args {
    /// Captcha image to read
    pub image: PathBuf,

    /// Pipeline preset ("voting" or "legacy")
    #[arg(long, env = "CAPTCHA_PRESET", default_value = "voting")]
    pub preset: String,

    /// OCR engine to use (defaults to the first compiled-in engine)
    #[arg(long, env = "CAPTCHA_ENGINE")]
    pub engine: Option<String>,

    /// Tesseract trained data language
    #[arg(long, env = "CAPTCHA_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Path to tessdata directory (downloaded to the cache dir if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Write every preprocessed variant that produced no code into this directory
    #[arg(long, env = "CAPTCHA_SAVE_MISSES")]
    pub save_misses: Option<PathBuf>,

    /// Print a JSON report instead of the bare code
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries only the answer
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::Config::from(args);

    tracing::info!("Starting captcha-digits v{}", env!("CARGO_PKG_VERSION"));

    let result = run(config);
    if let Err(e) = &result {
        if let Some(err) = e.downcast_ref::<CaptchaError>() {
            tracing::error!(code = err.code(), "{}", err);
        }
    }
    result
}

fn run(config: config::Config) -> anyhow::Result<()> {
    let preset = Preset::from_str(&config.preset).ok_or_else(|| {
        CaptchaError::Config(format!(
            "Unknown preset '{}' (expected \"voting\" or \"legacy\")",
            config.preset
        ))
    })?;

    // Read the image before starting an engine, which may download models
    let captcha = Captcha::open(&config.image)?;

    let registry = engines::EngineRegistry::new(&config)?;
    let engine = registry.default().ok_or_else(|| {
        CaptchaError::Initialization(format!(
            "OCR engine '{}' is not available",
            registry.default_name()
        ))
    })?;
    tracing::info!(
        "Using {} engine ({}), preset {}",
        engine.name(),
        engine.description(),
        preset.as_str()
    );

    let mut solver = Solver::new(engine, preset);
    if let Some(dir) = &config.save_misses {
        solver = solver.with_miss_dir(dir);
    }

    let outcome = solver.solve(captcha)?;

    if config.json {
        let report =
            serde_json::to_string(&outcome.report()).context("Failed to serialize report")?;
        println!("{}", report);
    } else if let Some(winner) = outcome.winner() {
        println!("{}", winner.code);
    }

    Ok(())
}
