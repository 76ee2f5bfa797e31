use crate::error::CaptchaError;
use image::DynamicImage;

/// Digits allowed in a captcha code
pub const DIGIT_WHITELIST: &str = "0123456789";

/// Tesseract page segmentation mode: treat the image as a single word
pub const PSM_SINGLE_WORD: u8 = 8;

/// Tesseract engine mode: whatever the trained data supports
pub const OEM_DEFAULT: u8 = 3;

/// OCR processing result
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f32,
}

/// How the engine should read an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    pub page_seg_mode: u8,
    pub engine_mode: u8,
    pub whitelist: String,
}

impl RecognitionConfig {
    /// Single word, default engine, digits only
    pub fn digits() -> Self {
        Self {
            page_seg_mode: PSM_SINGLE_WORD,
            engine_mode: OEM_DEFAULT,
            whitelist: DIGIT_WHITELIST.to_string(),
        }
    }
}

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Read the text in one preprocessed image
    fn recognize(
        &self,
        image: &DynamicImage,
        config: &RecognitionConfig,
    ) -> Result<OcrResult, CaptchaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_config() {
        let config = RecognitionConfig::digits();
        assert_eq!(config.page_seg_mode, 8);
        assert_eq!(config.engine_mode, 3);
        assert_eq!(config.whitelist, "0123456789");
    }
}
