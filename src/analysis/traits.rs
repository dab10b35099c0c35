use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::FocalPoint;
use crate::render::SourceImage;

/// Core trait for anything that can locate the focal region of a screenshot
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Returns the name of this analyzer, used in logs
    fn name(&self) -> &str;

    /// Inspect the image and report where its primary focal region is
    ///
    /// # Arguments
    ///
    /// * `image` - The uploaded screenshot, original bytes included
    ///
    /// # Returns
    ///
    /// The focal point as percentages of the image dimensions plus a short
    /// description, or an error if the analysis could not be completed.
    /// Errors are final for the item: callers do not retry.
    async fn analyze(&self, image: &SourceImage) -> Result<FocalAnalysis>;
}

/// Result of a successful focal-point analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocalAnalysis {
    pub focal_point: FocalPoint,

    /// Short human-readable description of the detected region
    #[serde(default)]
    pub description: String,
}

impl FocalAnalysis {
    pub fn new<S: Into<String>>(focal_point: FocalPoint, description: S) -> Self {
        Self {
            focal_point,
            description: description.into(),
        }
    }

    /// Clamp the focal point back into `[0, 100]` on both axes
    pub fn clamped(self) -> Self {
        Self {
            focal_point: FocalPoint::new(self.focal_point.x, self.focal_point.y),
            description: self.description,
        }
    }
}
