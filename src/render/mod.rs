//! # Composite Rendering
//!
//! Turns a source screenshot into a finished marketing asset for one entry of
//! the output catalog: focal-biased crop, resample, brightness/contrast,
//! headline, logo watermark, JPEG.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use asset_studio::geometry::FocalPoint;
//! use asset_studio::render::{Adjustments, CompositeRenderer, GlobalStyle, CATALOG};
//!
//! # fn main() -> anyhow::Result<()> {
//! let screenshot = image::open("popup.png")?;
//! let renderer = CompositeRenderer::default();
//! let style = GlobalStyle::new().with_headline("Block trackers in one click");
//!
//! for format in CATALOG.iter() {
//!     let jpeg = renderer.render(&screenshot, format, FocalPoint::CENTER, &style, Adjustments::default())?;
//!     std::fs::write(format!("{}.jpg", format.id), jpeg)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod compositor;
pub mod filters;
pub mod overlay;
pub mod types;

pub use compositor::CompositeRenderer;
pub use types::{Adjustments, Canvas, GlobalStyle, OutputFormat, SourceImage, CATALOG};
