use crate::error::CaptchaError;
use image::DynamicImage;
use imageproc::filter::median_filter;

/// Apply a square median filter of odd side `kernel`
/// Median filter preserves edges better than Gaussian blur.
/// Colour input stays colour so the filter can run before grayscale.
pub fn apply(image: DynamicImage, kernel: u32) -> Result<DynamicImage, CaptchaError> {
    if kernel == 0 || kernel % 2 == 0 {
        return Err(CaptchaError::Preprocessing(format!(
            "median kernel must be odd, got {}",
            kernel
        )));
    }

    if image.width() == 0 || image.height() == 0 {
        return Ok(image);
    }

    let radius = kernel / 2;
    let denoised = match image {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(median_filter(&gray, radius, radius)),
        other => DynamicImage::ImageRgb8(median_filter(&other.to_rgb8(), radius, radius)),
    };
    Ok(denoised)
}
