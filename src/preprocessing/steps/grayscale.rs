use crate::error::CaptchaError;
use image::{DynamicImage, GrayImage, Luma};

/// Collapse colour channels to a single Luma8 channel
///
/// Uses the Rec.601 weights (0.299, 0.587, 0.114) with rounding, not the
/// Rec.709 weights of `to_luma8`.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, CaptchaError> {
    if let DynamicImage::ImageLuma8(_) = image {
        return Ok(image);
    }

    let rgb = image.to_rgb8();
    let gray = GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([rec601(r, g, b)])
    });
    Ok(DynamicImage::ImageLuma8(gray))
}

fn rec601(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    ((weighted + 500) / 1000) as u8
}
