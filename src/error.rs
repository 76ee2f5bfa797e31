use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptchaError {
    #[error("Failed to read input image: {0}")]
    Input(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to initialize OCR engine: {0}")]
    Initialization(String),

    #[error("Preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("OCR engine failed: {0}")]
    Recognition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptchaError {
    /// Short machine-readable code, used in the JSON report and logs
    pub fn code(&self) -> &'static str {
        match self {
            CaptchaError::Input(_) => "INPUT_ERROR",
            CaptchaError::Config(_) => "CONFIG_ERROR",
            CaptchaError::Initialization(_) => "INIT_ERROR",
            CaptchaError::Preprocessing(_) => "PREPROCESSING_ERROR",
            CaptchaError::Recognition(_) => "RECOGNITION_ERROR",
            CaptchaError::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            CaptchaError::Input("x".into()),
            CaptchaError::Config("x".into()),
            CaptchaError::Initialization("x".into()),
            CaptchaError::Preprocessing("x".into()),
            CaptchaError::Recognition("x".into()),
            CaptchaError::Io(std::io::Error::other("x")),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_input_error_message() {
        let err = CaptchaError::Input("missing.png: not found".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to read input image: missing.png: not found"
        );
    }
}
