//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use.
//!
//! ocrs has no page segmentation modes and no character whitelist. Every
//! recognised word is joined into one token and characters outside the
//! whitelist are dropped afterwards.

use super::download;
use crate::config::Config;
use crate::engine::{OcrEngine, OcrResult, RecognitionConfig};
use crate::error::CaptchaError;
use image::DynamicImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::sync::Arc;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: Arc<OcrsOcrEngine>,
}

impl OcrsEngine {
    /// Create a new OCR engine, downloading models if needed
    pub fn new(_config: &Config) -> Result<Self, CaptchaError> {
        tracing::info!("Initializing ocrs OCR engine...");

        let models_dir = download::cache_dir(Some("ocrs"));
        let detection_model_path =
            download::ensure_cached(DETECTION_MODEL_URL, &models_dir, "text-detection.rten")?;
        let recognition_model_path =
            download::ensure_cached(RECOGNITION_MODEL_URL, &models_dir, "text-recognition.rten")?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            CaptchaError::Initialization(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            CaptchaError::Initialization(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            CaptchaError::Initialization(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self {
            engine: Arc::new(engine),
        })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - no system dependencies, whitelist applied after recognition"
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        config: &RecognitionConfig,
    ) -> Result<OcrResult, CaptchaError> {
        // HWC RGB is what ImageSource::from_bytes expects
        let rgb_img = image.to_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            CaptchaError::Recognition(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| CaptchaError::Recognition(format!("Failed to prepare input: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| CaptchaError::Recognition(format!("Failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| CaptchaError::Recognition(format!("Failed to recognize text: {}", e)))?;

        let raw: String = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .flat_map(|line| line.words().map(|word| word.to_string()).collect::<Vec<_>>())
            .collect();

        let text = single_word(&raw, &config.whitelist);
        let confidence = whitelist_ratio(&raw, &text);

        tracing::debug!(raw = %raw, text = %text, "ocrs recognized");

        Ok(OcrResult { text, confidence })
    }
}

/// Collapse recognised text into one token of whitelisted characters
fn single_word(raw: &str, whitelist: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| whitelist.is_empty() || whitelist.contains(*c))
        .collect()
}

/// Share of non-whitespace characters that survived the whitelist
///
/// ocrs reports no per-character confidence; a reading that needed heavy
/// filtering is treated as less trustworthy.
fn whitelist_ratio(raw: &str, kept: &str) -> f32 {
    let total = raw.chars().filter(|c| !c.is_whitespace()).count();
    if total == 0 {
        return 0.0;
    }
    kept.chars().count() as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DIGIT_WHITELIST;

    #[test]
    fn test_single_word_joins_and_filters() {
        assert_eq!(single_word("12 34\n56", DIGIT_WHITELIST), "123456");
        assert_eq!(single_word("l23456", DIGIT_WHITELIST), "23456");
        assert_eq!(single_word("ab c", ""), "abc");
    }

    #[test]
    fn test_whitelist_ratio() {
        assert_eq!(whitelist_ratio("", ""), 0.0);
        assert_eq!(whitelist_ratio("123456", "123456"), 1.0);
        assert_eq!(whitelist_ratio("12 ab", "12"), 0.5);
    }
}
