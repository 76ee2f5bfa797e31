use crate::error::CaptchaError;
use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Resize image to the fixed captcha dimensions
/// Aspect ratio is not preserved; every variant must see the same geometry.
/// Catmull-Rom is the cubic filter.
pub fn apply(image: DynamicImage, width: u32, height: u32) -> Result<DynamicImage, CaptchaError> {
    if width == 0 || height == 0 {
        return Err(CaptchaError::Preprocessing(format!(
            "resize target must be non-empty, got {}x{}",
            width, height
        )));
    }

    if image.dimensions() == (width, height) {
        return Ok(image);
    }

    // Nothing to sample from; hand back a blank canvas of the right size
    if image.width() == 0 || image.height() == 0 {
        return Ok(DynamicImage::new_luma8(width, height));
    }

    Ok(image.resize_exact(width, height, FilterType::CatmullRom))
}
