use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use ab_glyph::FontArc;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, warn};

use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::geometry::{compute_crop_rect, FocalPoint};
use crate::render::filters::apply_adjustments;
use crate::render::overlay::{bundled_font, draw_headline, draw_logo};
use crate::render::types::{Adjustments, Canvas, GlobalStyle, OutputFormat};

/// Renders one export asset from a source image.
///
/// Rendering is a pure function of its inputs: the same source, format, focal
/// point, style and adjustments always produce the same bytes.
///
/// The pipeline, each step drawing over the previous one:
/// 1. Crop - focal-biased rectangle with the format's aspect ratio
/// 2. Scale - Lanczos3 resample onto the full canvas
/// 3. Filter - brightness then contrast
/// 4. Headline - uppercased, shadowed, near the top
/// 5. Logo - bottom-right watermark
/// 6. Encode - JPEG at the configured quality
#[derive(Clone)]
pub struct CompositeRenderer {
    quality: u8,
    font: Option<FontArc>,
}

impl CompositeRenderer {
    pub const DEFAULT_QUALITY: u8 = 92;

    /// Headlines use the bundled DejaVu Sans Bold unless another font is set
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            font: default_font(),
        }
    }

    /// Build a renderer from configuration; `headline_font` replaces the bundled font
    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        let renderer = Self::new(config.jpeg_quality);
        match &config.headline_font {
            Some(path) => Ok(renderer.with_font(Self::load_font(path)?)),
            None => Ok(renderer),
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// Load a TTF/OTF font from disk
    pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontArc> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| RenderError::FontLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        FontArc::try_from_vec(data).map_err(|e| {
            RenderError::FontLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render and encode one asset
    pub fn render(
        &self,
        source: &DynamicImage,
        format: &OutputFormat,
        focal: FocalPoint,
        style: &GlobalStyle,
        adjustments: Adjustments,
    ) -> Result<Vec<u8>> {
        let canvas = self.compose(source, format, focal, style, adjustments)?;
        canvas.encode_jpeg(self.quality)
    }

    /// Run every drawing step without encoding
    pub fn compose(
        &self,
        source: &DynamicImage,
        format: &OutputFormat,
        focal: FocalPoint,
        style: &GlobalStyle,
        adjustments: Adjustments,
    ) -> Result<Canvas> {
        let started = Instant::now();
        let (src_w, src_h) = (source.width(), source.height());

        if src_w == 0 || src_h == 0 {
            return Err(RenderError::InvalidDimensions {
                details: format!("source is {}x{}", src_w, src_h),
            }
            .into());
        }
        if format.width == 0 || format.height == 0 {
            return Err(RenderError::InvalidDimensions {
                details: format!("format {} is {}x{}", format.id, format.width, format.height),
            }
            .into());
        }

        let rect = compute_crop_rect(src_w, src_h, format.width, format.height, focal);
        let region = rect.to_pixel_region(src_w, src_h);

        debug!(
            "Cropping {}x{} at ({}, {}) from {}x{} for {}",
            region.width, region.height, region.x, region.y, src_w, src_h, format.id
        );

        let scaled = source
            .crop_imm(region.x, region.y, region.width, region.height)
            .resize_exact(format.width, format.height, FilterType::Lanczos3)
            .to_rgb8();
        let mut canvas = Canvas::new(scaled);

        apply_adjustments(&mut canvas, adjustments);

        if !style.headline.trim().is_empty() {
            match &self.font {
                Some(font) => draw_headline(&mut canvas, &style.headline, font),
                None => debug!("No headline font available, skipping headline"),
            }
        }

        if let Some(logo) = &style.logo {
            draw_logo(&mut canvas, logo);
        }

        debug!("Composed {} in {:?}", format.id, started.elapsed());
        Ok(canvas)
    }
}

/// The bundled font, parsed once per process
fn default_font() -> Option<FontArc> {
    static FONT: OnceLock<Option<FontArc>> = OnceLock::new();
    FONT.get_or_init(|| match bundled_font() {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("{}; headlines will be skipped", e);
            None
        }
    })
    .clone()
}

impl Default for CompositeRenderer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_QUALITY)
    }
}
