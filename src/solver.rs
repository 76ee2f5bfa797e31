use crate::engine::{OcrEngine, RecognitionConfig};
use crate::error::CaptchaError;
use crate::preprocessing::{Pipeline, Preset, StepTiming, Variant};
use crate::vote::{Code, TallyEntry, VoteTally};
use image::DynamicImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// What happened to one variant
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub variant: String,
    pub text: String,
    /// `None` is a recognition miss
    pub code: Option<Code>,
    pub confidence: f32,
    pub preprocessing_ms: u64,
    pub recognition_ms: u64,
    pub steps: Vec<StepTiming>,
}

/// Result of solving one captcha
#[derive(Debug, Clone)]
pub struct Outcome {
    pub preset: Preset,
    pub tally: VoteTally,
    pub attempts: Vec<Attempt>,
}

impl Outcome {
    /// Winning code and its votes; `None` when no variant produced a code
    pub fn winner(&self) -> Option<&TallyEntry> {
        self.tally.winner()
    }

    pub fn misses(&self) -> usize {
        self.attempts.iter().filter(|a| a.code.is_none()).count()
    }

    pub fn report(&self) -> Report<'_> {
        let winner = self.winner();
        Report {
            code: winner.map(|w| &w.code),
            votes: winner.map_or(0, |w| w.votes),
            variants: self.attempts.len(),
            preset: self.preset.as_str(),
            tally: &self.tally,
            attempts: &self.attempts,
        }
    }
}

/// JSON shape of an outcome
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub code: Option<&'a Code>,
    pub votes: u32,
    pub variants: usize,
    pub preset: &'static str,
    pub tally: &'a VoteTally,
    pub attempts: &'a [Attempt],
}

/// A decoded captcha and the name used for miss dumps
pub struct Captcha {
    pub image: DynamicImage,
    pub name: String,
}

impl Captcha {
    /// Load a captcha from disk
    pub fn open(path: &Path) -> Result<Self, CaptchaError> {
        let image = image::open(path)
            .map_err(|e| CaptchaError::Input(format!("{}: {}", path.display(), e)))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "captcha".to_string());

        tracing::info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Loaded captcha"
        );

        Ok(Self { image, name })
    }
}

/// Runs every variant of a preset through the OCR engine and votes
pub struct Solver {
    engine: Arc<dyn OcrEngine>,
    pipeline: Pipeline,
    recognition: RecognitionConfig,
    miss_dir: Option<PathBuf>,
}

impl Solver {
    pub fn new(engine: Arc<dyn OcrEngine>, preset: Preset) -> Self {
        Self {
            engine,
            pipeline: Pipeline::new(preset),
            recognition: RecognitionConfig::digits(),
            miss_dir: None,
        }
    }

    /// Dump every preprocessed image that did not yield a code into `dir`
    pub fn with_miss_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.miss_dir = Some(dir.into());
        self
    }

    /// Run every variant of the preset over one captcha and vote
    pub fn solve(&self, captcha: Captcha) -> Result<Outcome, CaptchaError> {
        let preset = self.pipeline.preset();
        let prepared = self.pipeline.prepare(captcha.image)?;

        if let Some(dir) = &self.miss_dir {
            std::fs::create_dir_all(dir)?;
        }

        let mut tally = VoteTally::new();
        let mut attempts = Vec::new();

        for variant in preset.variants() {
            let attempt = self.attempt(&prepared, &variant, &captcha.name, &mut tally)?;
            attempts.push(attempt);
        }

        let outcome = Outcome {
            preset,
            tally,
            attempts,
        };

        match outcome.winner() {
            Some(w) => tracing::info!(
                code = %w.code,
                votes = w.votes,
                misses = outcome.misses(),
                "Captcha solved"
            ),
            None => tracing::info!(variants = outcome.attempts.len(), "No variant produced a code"),
        }

        Ok(outcome)
    }

    fn attempt(
        &self,
        prepared: &DynamicImage,
        variant: &Variant,
        stem: &str,
        tally: &mut VoteTally,
    ) -> Result<Attempt, CaptchaError> {
        let processed = self.pipeline.process(prepared, variant)?;

        let start = Instant::now();
        let result = self.engine.recognize(&processed.image, &self.recognition)?;
        let recognition_ms = start.elapsed().as_millis() as u64;

        let code = tally.record_text(&result.text);

        tracing::debug!(
            variant = %variant,
            text = %result.text,
            matched = code.is_some(),
            confidence = result.confidence,
            "Variant recognized"
        );

        if code.is_none() {
            if let Some(dir) = &self.miss_dir {
                let path = dir.join(format!("{}.wrongmatch-{}.png", stem, variant.label()));
                processed
                    .image
                    .save(&path)
                    .map_err(|e| CaptchaError::Io(std::io::Error::other(e)))?;
                tracing::debug!(path = %path.display(), "Saved missed variant");
            }
        }

        Ok(Attempt {
            variant: processed.variant,
            text: result.text,
            code,
            confidence: result.confidence,
            preprocessing_ms: processed.total_time_ms,
            recognition_ms,
            steps: processed.steps,
        })
    }
}
