use crate::error::CaptchaError;
use image::DynamicImage;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};

/// Binarize with a global Otsu level
/// Pixels strictly above the level become 255, the rest 0.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, CaptchaError> {
    let gray = image.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return Ok(DynamicImage::ImageLuma8(gray));
    }

    let level = otsu_level(&gray);
    tracing::debug!(level, "Otsu level selected");

    Ok(DynamicImage::ImageLuma8(threshold(
        &gray,
        level,
        ThresholdType::Binary,
    )))
}
