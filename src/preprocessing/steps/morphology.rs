use crate::error::CaptchaError;
use image::DynamicImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Structuring element used by opening and closing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// 3x3 box
    Square,
    /// 3x3 ellipse, which rasterises to a cross
    Ellipse,
}

impl Kernel {
    fn norm(self) -> Norm {
        match self {
            Kernel::Square => Norm::LInf,
            Kernel::Ellipse => Norm::L1,
        }
    }
}

/// Erosion followed by dilation: removes specks smaller than the kernel
pub fn opening(image: DynamicImage, kernel: Kernel) -> Result<DynamicImage, CaptchaError> {
    let gray = image.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return Ok(DynamicImage::ImageLuma8(gray));
    }
    Ok(DynamicImage::ImageLuma8(morphology::open(&gray, kernel.norm(), 1)))
}

/// Dilation followed by erosion: fills gaps smaller than the kernel
pub fn closing(image: DynamicImage, kernel: Kernel) -> Result<DynamicImage, CaptchaError> {
    let gray = image.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return Ok(DynamicImage::ImageLuma8(gray));
    }
    Ok(DynamicImage::ImageLuma8(morphology::close(&gray, kernel.norm(), 1)))
}
