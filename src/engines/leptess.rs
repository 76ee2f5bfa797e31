//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine, configured per call with a page segmentation
//! mode and a character whitelist.
//! Uses tesseract-static crate for static linking (no system dependencies).
//! Downloads tessdata (training data) automatically on first use unless a
//! local tessdata directory is configured.

use super::download;
use crate::config::Config;
use crate::engine::{OcrEngine, OcrResult, RecognitionConfig, OEM_DEFAULT};
use crate::error::CaptchaError;
use image::DynamicImage;
use std::path::Path;
use tesseract_static::tesseract::Tesseract;

/// Tesseract OCR Engine
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: String,
    /// Trained data language
    language: String,
}

impl LeptessEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &Config) -> Result<Self, CaptchaError> {
        let language = config.language.clone();

        let tessdata_path = match &config.tessdata_path {
            Some(dir) => local_tessdata(dir, &language)?,
            None => ensure_tessdata_available(&language)?,
        };

        // Validate that tessdata is accessible by doing a test initialization
        let test_tess = Tesseract::new(Some(&tessdata_path), Some(&language)).map_err(|e| {
            CaptchaError::Initialization(format!("Failed to initialize Tesseract: {}", e))
        })?;
        drop(test_tess);

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            language
        );

        Ok(Self {
            tessdata_path,
            language,
        })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine with page segmentation and whitelist support"
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        config: &RecognitionConfig,
    ) -> Result<OcrResult, CaptchaError> {
        if config.engine_mode != OEM_DEFAULT {
            return Err(CaptchaError::Config(format!(
                "leptess only runs the default engine mode ({}), got {}",
                OEM_DEFAULT, config.engine_mode
            )));
        }

        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();

        // Convert to BMP in memory (BMP is always supported by leptonica)
        let mut bmp_data = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut bmp_data);
            gray.write_to(&mut cursor, image::ImageFormat::Bmp)
                .map_err(|e| CaptchaError::Recognition(format!("Failed to convert to BMP: {}", e)))?;
        }

        tracing::debug!(
            "Recognizing image: {}x{}, BMP size: {} bytes, psm {}",
            width,
            height,
            bmp_data.len(),
            config.page_seg_mode
        );

        let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.language)).map_err(
            |e| CaptchaError::Recognition(format!("Failed to create Tesseract: {}", e)),
        )?;

        tess = tess
            .set_variable("tessedit_pageseg_mode", &config.page_seg_mode.to_string())
            .map_err(|e| {
                CaptchaError::Recognition(format!("Failed to set page segmentation mode: {}", e))
            })?;

        tess = tess
            .set_variable("tessedit_char_whitelist", &config.whitelist)
            .map_err(|e| CaptchaError::Recognition(format!("Failed to set whitelist: {}", e)))?;

        tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            CaptchaError::Recognition(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                width,
                height,
                bmp_data.len(),
                e
            ))
        })?;

        tess = tess
            .recognize()
            .map_err(|e| CaptchaError::Recognition(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| CaptchaError::Recognition(format!("Failed to get text: {}", e)))?;

        // Get confidence score (0-100 scale, convert to 0.0-1.0)
        let confidence = tess.mean_text_conf() as f32 / 100.0;

        Ok(OcrResult {
            text: text.trim().to_string(),
            confidence,
        })
    }
}

// ============================================================================
// Tessdata helpers
// ============================================================================

/// Use a caller-provided tessdata directory as-is
fn local_tessdata(dir: &str, language: &str) -> Result<String, CaptchaError> {
    let traineddata = Path::new(dir).join(format!("{}.traineddata", language));
    if !traineddata.is_file() {
        return Err(CaptchaError::Initialization(format!(
            "No trained data for '{}' in {}",
            language, dir
        )));
    }
    tracing::info!("Using local tessdata from {}", dir);
    Ok(dir.to_string())
}

/// Ensure tessdata is available, downloading if needed
fn ensure_tessdata_available(language: &str) -> Result<String, CaptchaError> {
    let cache_dir = download::cache_dir(Some("tessdata"));
    let filename = format!("{}.traineddata", language);
    download::ensure_cached(&tessdata_url(language), &cache_dir, &filename)?;

    // Tesseract expects the directory, not the file
    cache_dir
        .to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| CaptchaError::Initialization("Invalid tessdata path".to_string()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}
