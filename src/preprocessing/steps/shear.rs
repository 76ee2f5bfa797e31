use crate::error::CaptchaError;
use image::{DynamicImage, Luma};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};

/// Slant the image by moving its top and bottom edges in opposite directions
///
/// The top edge shifts right by `dx = trunc(scale * width)` and the bottom edge
/// shifts left by the same amount; a negative scale slants the other way.
/// Uncovered pixels are filled white, matching the binarized background.
pub fn apply(image: DynamicImage, scale: f64) -> Result<DynamicImage, CaptchaError> {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Ok(DynamicImage::ImageLuma8(gray));
    }

    let dx = (scale * width as f64).trunc() as f32;
    if dx == 0.0 {
        return Ok(DynamicImage::ImageLuma8(gray));
    }

    let (w, h) = (width as f32, height as f32);
    let from = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let to = [(dx, 0.0), (w + dx, 0.0), (w - dx, h), (-dx, h)];

    let projection = Projection::from_control_points(from, to).ok_or_else(|| {
        CaptchaError::Preprocessing(format!("degenerate shear projection for scale {}", scale))
    })?;

    let sheared = warp(&gray, &projection, Interpolation::Bilinear, Luma([255u8]));
    Ok(DynamicImage::ImageLuma8(sheared))
}
