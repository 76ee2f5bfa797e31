use crate::error::CaptchaError;
use image::DynamicImage;
use serde::Serialize;
use std::fmt;
use std::time::Instant;

use super::steps;
use super::steps::morphology::Kernel;

/// Preprocessing preset names
///
/// Each preset is one generation of the captcha pipeline: target size,
/// filter sizes and the list of shear variants are fixed per preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// 300x85, median 5, elliptical kernel, ten shear variants
    #[default]
    Voting,
    /// 280x70, median 3, square kernel, six shear variants
    Legacy,
}

/// Fixed parameters of a preset
#[derive(Debug, Clone, PartialEq)]
pub struct PresetSettings {
    pub width: u32,
    pub height: u32,
    pub median_kernel: u32,
    pub morph_kernel: Kernel,
    /// Sheared variants run the median filter on the colour image first
    pub denoise_before_grayscale: bool,
    pub shear_scales: &'static [f64],
}

const VOTING_SCALES: &[f64] = &[
    0.025, -0.025, 0.05, -0.05, 0.075, -0.075, 0.1, -0.1, 0.125, -0.125,
];

const LEGACY_SCALES: &[f64] = &[0.05, -0.05, 0.075, -0.075, 0.1, -0.1];

impl Preset {
    /// Parse from a CLI / env value
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "voting" => Some(Self::Voting),
            "legacy" => Some(Self::Legacy),
            _ => None,
        }
    }

    /// Get the preset name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voting => "voting",
            Self::Legacy => "legacy",
        }
    }

    pub fn settings(&self) -> PresetSettings {
        match self {
            Self::Voting => PresetSettings {
                width: 300,
                height: 85,
                median_kernel: 5,
                morph_kernel: Kernel::Ellipse,
                denoise_before_grayscale: true,
                shear_scales: VOTING_SCALES,
            },
            Self::Legacy => PresetSettings {
                width: 280,
                height: 70,
                median_kernel: 3,
                morph_kernel: Kernel::Square,
                denoise_before_grayscale: false,
                shear_scales: LEGACY_SCALES,
            },
        }
    }

    /// The ordered variant list: the plain pass, then every shear scale
    pub fn variants(&self) -> Vec<Variant> {
        std::iter::once(Variant::plain())
            .chain(self.settings().shear_scales.iter().map(|&s| Variant::sheared(s)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Plain,
    Sheared,
}

/// One entry of the variant list
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Variant {
    pub kind: VariantKind,
    /// Shear scale as a fraction of the image width; unused for `Plain`
    pub scale: f64,
}

impl Variant {
    pub fn plain() -> Self {
        Self {
            kind: VariantKind::Plain,
            scale: 0.0,
        }
    }

    pub fn sheared(scale: f64) -> Self {
        Self {
            kind: VariantKind::Sheared,
            scale,
        }
    }

    /// Stable label used in logs and miss dump file names
    pub fn label(&self) -> String {
        match self.kind {
            VariantKind::Plain => "plain".to_string(),
            VariantKind::Sheared => format!("shear{:+.3}", self.scale),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing one variant, including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Preprocessed image (not serialized)
    #[serde(skip)]
    pub image: DynamicImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Variant label
    pub variant: String,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Preprocessing pipeline that applies a preset's steps per variant
pub struct Pipeline {
    preset: Preset,
    settings: PresetSettings,
}

impl Pipeline {
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            settings: preset.settings(),
        }
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// Resize a freshly loaded image to the preset's target dimensions
    ///
    /// Done once per input; every variant starts from the prepared image.
    pub fn prepare(&self, image: DynamicImage) -> Result<DynamicImage, CaptchaError> {
        steps::resize::apply(image, self.settings.width, self.settings.height)
    }

    /// Run one variant's transform chain over a prepared image
    pub fn process(
        &self,
        prepared: &DynamicImage,
        variant: &Variant,
    ) -> Result<PreprocessingResult, CaptchaError> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();
        let median = self.settings.median_kernel;
        let kernel = self.settings.morph_kernel;

        let mut img = prepared.clone();

        let denoise_first =
            variant.kind == VariantKind::Sheared && self.settings.denoise_before_grayscale;
        if denoise_first {
            img = self.run_step("denoise", img, &mut steps_timing, |i| {
                steps::denoise::apply(i, median)
            })?;
            img = self.run_step("grayscale", img, &mut steps_timing, steps::grayscale::apply)?;
        } else {
            img = self.run_step("grayscale", img, &mut steps_timing, steps::grayscale::apply)?;
            img = self.run_step("denoise", img, &mut steps_timing, |i| {
                steps::denoise::apply(i, median)
            })?;
        }

        img = self.run_step("threshold", img, &mut steps_timing, steps::threshold::apply)?;
        img = self.run_step("opening", img, &mut steps_timing, |i| {
            steps::morphology::opening(i, kernel)
        })?;
        img = self.run_step("closing", img, &mut steps_timing, |i| {
            steps::morphology::closing(i, kernel)
        })?;

        if variant.kind == VariantKind::Sheared {
            img = self.run_step("shear", img, &mut steps_timing, |i| {
                steps::shear::apply(i, variant.scale)
            })?;
        }

        Ok(PreprocessingResult {
            image: img,
            total_time_ms: start.elapsed().as_millis() as u64,
            variant: variant.label(),
            steps: steps_timing,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: DynamicImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<DynamicImage, CaptchaError>
    where
        F: FnOnce(DynamicImage) -> Result<DynamicImage, CaptchaError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img)?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn noisy_captcha() -> DynamicImage {
        // Dark blocks standing in for digits on a speckled light background
        let img = RgbImage::from_fn(150, 40, |x, y| {
            let in_digit = (x / 12) % 2 == 1 && (10..30).contains(&y);
            if in_digit {
                Rgb([30, 30, 60])
            } else if (x * 7 + y * 13) % 29 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([230, 220, 210])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    fn step_names(result: &PreprocessingResult) -> Vec<&str> {
        result.steps.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_preset_parse_roundtrip() {
        for preset in [Preset::Voting, Preset::Legacy] {
            assert_eq!(Preset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(Preset::from_str("LEGACY"), Some(Preset::Legacy));
        assert_eq!(Preset::from_str("aggressive"), None);
        assert_eq!(Preset::default(), Preset::Voting);
    }

    #[test]
    fn test_variant_lists_start_with_plain() {
        let voting = Preset::Voting.variants();
        assert_eq!(voting.len(), 11);
        assert_eq!(voting[0], Variant::plain());
        assert_eq!(voting[1], Variant::sheared(0.025));
        assert_eq!(voting[2], Variant::sheared(-0.025));
        assert_eq!(voting[10], Variant::sheared(-0.125));

        let legacy = Preset::Legacy.variants();
        assert_eq!(legacy.len(), 7);
        assert_eq!(legacy[0].kind, VariantKind::Plain);
        assert!(legacy[1..].iter().all(|v| v.kind == VariantKind::Sheared));
    }

    #[test]
    fn test_variant_labels() {
        assert_eq!(Variant::plain().label(), "plain");
        assert_eq!(Variant::sheared(0.05).label(), "shear+0.050");
        assert_eq!(Variant::sheared(-0.125).to_string(), "shear-0.125");
    }

    #[test]
    fn test_prepare_hits_target_size() {
        for preset in [Preset::Voting, Preset::Legacy] {
            let settings = preset.settings();
            let prepared = Pipeline::new(preset).prepare(noisy_captcha()).unwrap();
            assert_eq!(prepared.dimensions(), (settings.width, settings.height));
        }
    }

    #[test]
    fn test_plain_variant_step_order() {
        let pipeline = Pipeline::new(Preset::Voting);
        let prepared = pipeline.prepare(noisy_captcha()).unwrap();
        let result = pipeline.process(&prepared, &Variant::plain()).unwrap();

        assert_eq!(
            step_names(&result),
            ["grayscale", "denoise", "threshold", "opening", "closing"]
        );
        assert_eq!(result.variant, "plain");
    }

    #[test]
    fn test_sheared_variant_step_order_follows_preset() {
        let voting = Pipeline::new(Preset::Voting);
        let prepared = voting.prepare(noisy_captcha()).unwrap();
        let result = voting.process(&prepared, &Variant::sheared(0.05)).unwrap();
        assert_eq!(
            step_names(&result),
            ["denoise", "grayscale", "threshold", "opening", "closing", "shear"]
        );

        let legacy = Pipeline::new(Preset::Legacy);
        let prepared = legacy.prepare(noisy_captcha()).unwrap();
        let result = legacy.process(&prepared, &Variant::sheared(0.05)).unwrap();
        assert_eq!(
            step_names(&result),
            ["grayscale", "denoise", "threshold", "opening", "closing", "shear"]
        );
    }

    #[test]
    fn test_every_variant_keeps_target_size() {
        let pipeline = Pipeline::new(Preset::Voting);
        let prepared = pipeline.prepare(noisy_captcha()).unwrap();

        for variant in Preset::Voting.variants() {
            let result = pipeline.process(&prepared, &variant).unwrap();
            assert_eq!(result.image.dimensions(), (300, 85), "{}", variant);
        }
    }

    #[test]
    fn test_plain_variant_is_binary() {
        let pipeline = Pipeline::new(Preset::Voting);
        let prepared = pipeline.prepare(noisy_captcha()).unwrap();
        let gray = pipeline
            .process(&prepared, &Variant::plain())
            .unwrap()
            .image
            .to_luma8();
        assert!(gray.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_processing_is_deterministic() {
        let pipeline = Pipeline::new(Preset::Legacy);
        for variant in Preset::Legacy.variants() {
            let a = pipeline
                .process(&pipeline.prepare(noisy_captcha()).unwrap(), &variant)
                .unwrap();
            let b = pipeline
                .process(&pipeline.prepare(noisy_captcha()).unwrap(), &variant)
                .unwrap();
            assert_eq!(a.image.to_luma8(), b.image.to_luma8(), "{}", variant);
        }
    }
}
