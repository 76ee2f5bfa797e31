//! OCR engine implementations
//!
//! This module contains implementations of the OcrEngine trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

#[cfg(any(feature = "engine-ocrs", feature = "engine-leptess"))]
mod download;

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::CaptchaError;
use std::sync::Arc;

/// Registry of available OCR engines
pub struct EngineRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
    default_engine: String,
}

impl EngineRegistry {
    /// Create a new engine registry with the requested engines initialized
    ///
    /// Engines download models on first use, so only the engine named in the
    /// config is started when one is named.
    #[allow(unused_variables, unused_mut)]
    pub fn new(config: &Config) -> Result<Self, CaptchaError> {
        let mut engines: Vec<Arc<dyn OcrEngine>> = Vec::new();
        let wanted = |name: &str| config.engine.as_deref().map_or(true, |e| e == name);

        #[cfg(feature = "engine-leptess")]
        if wanted("leptess") {
            engines.push(Arc::new(leptess::LeptessEngine::new(config)?));
        }

        #[cfg(feature = "engine-ocrs")]
        if wanted("ocrs") {
            engines.push(Arc::new(ocrs::OcrsEngine::new(config)?));
        }

        Self::from_engines(engines, config.engine.as_deref())
    }

    /// Build a registry from already constructed engines
    pub fn from_engines(
        engines: Vec<Arc<dyn OcrEngine>>,
        requested: Option<&str>,
    ) -> Result<Self, CaptchaError> {
        if engines.is_empty() {
            return Err(match requested {
                Some(name) => CaptchaError::Config(format!(
                    "Unknown or disabled OCR engine '{}' (compiled: {})",
                    name,
                    compiled_engines().join(", ")
                )),
                None => CaptchaError::Initialization(
                    "No OCR engines available. Build with --features engine-leptess or --features engine-ocrs".to_string(),
                ),
            });
        }

        let default_engine = match requested {
            Some(name) => name.to_string(),
            None => engines[0].name().to_string(),
        };

        let registry = Self {
            engines,
            default_engine,
        };
        if registry.default().is_none() {
            return Err(CaptchaError::Config(format!(
                "OCR engine '{}' is not available (have: {})",
                registry.default_engine,
                registry.list().join(", ")
            )));
        }
        Ok(registry)
    }

    /// Get an engine by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn OcrEngine>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    /// Get the default engine
    pub fn default(&self) -> Option<Arc<dyn OcrEngine>> {
        self.get(&self.default_engine)
    }

    /// Get the default engine name
    pub fn default_name(&self) -> &str {
        &self.default_engine
    }

    /// List all available engine names
    pub fn list(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }
}

/// Names of the engines compiled into this binary
pub fn compiled_engines() -> Vec<&'static str> {
    let mut names = Vec::new();
    if cfg!(feature = "engine-leptess") {
        names.push("leptess");
    }
    if cfg!(feature = "engine-ocrs") {
        names.push("ocrs");
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{OcrResult, RecognitionConfig};
    use image::DynamicImage;

    struct NamedEngine(&'static str);

    impl OcrEngine for NamedEngine {
        fn name(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            "test engine"
        }

        fn recognize(
            &self,
            _image: &DynamicImage,
            _config: &RecognitionConfig,
        ) -> Result<OcrResult, CaptchaError> {
            Ok(OcrResult {
                text: String::new(),
                confidence: 0.0,
            })
        }
    }

    fn engines(names: &[&'static str]) -> Vec<Arc<dyn OcrEngine>> {
        names
            .iter()
            .map(|&n| Arc::new(NamedEngine(n)) as Arc<dyn OcrEngine>)
            .collect()
    }

    #[test]
    fn test_first_engine_is_default() {
        let registry = EngineRegistry::from_engines(engines(&["a", "b"]), None).unwrap();
        assert_eq!(registry.default_name(), "a");
        assert_eq!(registry.list(), ["a", "b"]);
        assert_eq!(registry.default().unwrap().name(), "a");
    }

    #[test]
    fn test_requested_engine_becomes_default() {
        let registry = EngineRegistry::from_engines(engines(&["a", "b"]), Some("b")).unwrap();
        assert_eq!(registry.default_name(), "b");
        assert!(registry.get("a").is_some());
    }

    #[test]
    fn test_missing_requested_engine_is_config_error() {
        let err = EngineRegistry::from_engines(engines(&["a"]), Some("zzz"))
            .err()
            .unwrap();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_no_engines_is_initialization_error() {
        let err = EngineRegistry::from_engines(Vec::new(), None).err().unwrap();
        assert_eq!(err.code(), "INIT_ERROR");
    }
}
