use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Fixed-size export target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputFormat {
    pub id: &'static str,
    pub display_name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl OutputFormat {
    /// Look up a catalog entry by id
    pub fn by_id(id: &str) -> Option<OutputFormat> {
        CATALOG.iter().copied().find(|format| format.id == id)
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// The export catalog, in the order every item is rendered.
pub const CATALOG: [OutputFormat; 3] = [
    OutputFormat {
        id: "youtube",
        display_name: "YouTube / Landscape (16:9)",
        width: 1280,
        height: 720,
    },
    OutputFormat {
        id: "instagram",
        display_name: "Instagram Post (1:1)",
        width: 1080,
        height: 1080,
    },
    OutputFormat {
        id: "story",
        display_name: "Story / Reels (9:16)",
        width: 1080,
        height: 1920,
    },
];

/// Branding applied uniformly to every asset of an export run
#[derive(Clone, Default)]
pub struct GlobalStyle {
    /// Watermark drawn in the bottom-right corner
    pub logo: Option<Arc<DynamicImage>>,

    /// Headline drawn near the top; empty means no headline
    pub headline: String,
}

impl GlobalStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headline<S: Into<String>>(mut self, headline: S) -> Self {
        self.headline = headline.into();
        self
    }

    pub fn with_logo(mut self, logo: DynamicImage) -> Self {
        self.logo = Some(Arc::new(logo));
        self
    }
}

impl fmt::Debug for GlobalStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalStyle")
            .field("logo", &self.logo.as_ref().map(|l| (l.width(), l.height())))
            .field("headline", &self.headline)
            .finish()
    }
}

/// Brightness/contrast filter, in percent (100 = unchanged)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    pub brightness: f32,
    pub contrast: f32,
}

impl Adjustments {
    pub const MAX_PERCENT: f32 = 300.0;

    /// Create adjustments, clamping both values into `[0, 300]`
    pub fn new(brightness: f32, contrast: f32) -> Self {
        Self {
            brightness: brightness.clamp(0.0, Self::MAX_PERCENT),
            contrast: contrast.clamp(0.0, Self::MAX_PERCENT),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 100.0 && self.contrast == 100.0
    }
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
        }
    }
}

/// An uploaded screenshot: the original bytes (sent to the vision service)
/// plus the decoded pixels (used for rendering).
#[derive(Clone)]
pub struct SourceImage {
    name: String,
    bytes: Arc<[u8]>,
    format: ImageFormat,
    pixels: Arc<DynamicImage>,
}

impl SourceImage {
    /// Decode an uploaded file. Only PNG and JPEG are accepted.
    pub fn decode<S: Into<String>>(name: S, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let format = image::guess_format(&bytes).map_err(|e| RenderError::DecodeFailed {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
            return Err(RenderError::DecodeFailed {
                name,
                reason: format!("unsupported format {:?}", format),
            }
            .into());
        }

        let pixels = image::load_from_memory_with_format(&bytes, format).map_err(|e| {
            RenderError::DecodeFailed {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;

        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(RenderError::InvalidDimensions {
                details: format!("{} is {}x{}", name, pixels.width(), pixels.height()),
            }
            .into());
        }

        Ok(Self {
            name,
            bytes: bytes.into(),
            format,
            pixels: Arc::new(pixels),
        })
    }

    /// Wrap already-decoded pixels, encoding them as PNG for the analyzer
    pub fn from_image<S: Into<String>>(name: S, pixels: DynamicImage) -> Result<Self> {
        let mut bytes = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| RenderError::EncodingFailed {
                reason: e.to_string(),
            })?;

        Ok(Self {
            name: name.into(),
            bytes: bytes.into(),
            format: ImageFormat::Png,
            pixels: Arc::new(pixels),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "image/png",
            _ => "image/jpeg",
        }
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type())
            .field("size", &(self.width(), self.height()))
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Output canvas
///
/// A thin wrapper around an RGB buffer; JPEG output carries no alpha, so
/// overlays are blended into it rather than composited on an RGBA surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    buffer: RgbImage,
}

impl Canvas {
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a canvas filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    pub fn as_image_mut(&mut self) -> &mut RgbImage {
        &mut self.buffer
    }

    /// Encode as baseline JPEG at the given quality (1-100)
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        {
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut bytes,
                quality.clamp(1, 100),
            );
            encoder
                .encode_image(&self.buffer)
                .map_err(|e| RenderError::EncodingFailed {
                    reason: e.to_string(),
                })?;
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_ratios() {
        let ids: Vec<_> = CATALOG.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["youtube", "instagram", "story"]);
        assert!((CATALOG[0].aspect() - 16.0 / 9.0).abs() < 1e-9);
        assert_eq!(CATALOG[1].aspect(), 1.0);
        assert!((CATALOG[2].aspect() - 9.0 / 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_lookup() {
        assert_eq!(OutputFormat::by_id("story").map(|f| f.height), Some(1920));
        assert!(OutputFormat::by_id("banner").is_none());
    }

    #[test]
    fn test_adjustments_clamp() {
        let adj = Adjustments::new(-5.0, 900.0);
        assert_eq!(adj.brightness, 0.0);
        assert_eq!(adj.contrast, Adjustments::MAX_PERCENT);
        assert!(Adjustments::default().is_identity());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = SourceImage::decode("notes.txt", b"definitely not an image".to_vec()).unwrap_err();
        assert!(err.to_string().contains("notes.txt"));
    }

    #[test]
    fn test_source_image_png_round_trip() {
        let pixels = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 4, Rgb([10, 20, 30])));
        let source = SourceImage::from_image("gen.png", pixels).unwrap();
        assert_eq!(source.mime_type(), "image/png");

        let decoded = SourceImage::decode("gen.png", source.bytes().to_vec()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn test_canvas_jpeg_has_soi_marker() {
        let canvas = Canvas::new_filled(16, 16, [200, 100, 50]);
        let bytes = canvas.encode_jpeg(92).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
