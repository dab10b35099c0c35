use async_trait::async_trait;

use crate::analysis::traits::{FocalAnalysis, ImageAnalyzer};
use crate::error::Result;
use crate::geometry::FocalPoint;
use crate::render::SourceImage;

/// Offline analyzer that always answers the centre of the image.
///
/// Used with `--offline` and in tests; produces the same crops as an item
/// whose analysis failed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterAnalyzer;

impl CenterAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageAnalyzer for CenterAnalyzer {
    fn name(&self) -> &str {
        "center"
    }

    async fn analyze(&self, _image: &SourceImage) -> Result<FocalAnalysis> {
        Ok(FocalAnalysis::new(FocalPoint::CENTER, "Centre of the image"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    #[tokio::test]
    async fn test_always_answers_center() {
        let pixels = DynamicImage::ImageRgb8(RgbImage::from_pixel(30, 10, Rgb([0, 0, 0])));
        let image = SourceImage::from_image("wide.png", pixels).unwrap();

        let analysis = CenterAnalyzer::new().analyze(&image).await.unwrap();
        assert_eq!(analysis.focal_point, FocalPoint::CENTER);
    }
}
