//! Image preprocessing module for captcha OCR
//!
//! Turns one loaded captcha into a binarized image per variant of the
//! selected preset.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, Preset, StepTiming, Variant};
