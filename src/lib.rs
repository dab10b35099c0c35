//! # Asset Studio
//!
//! Turn browser-extension screenshots into store-ready marketing images.
//!
//! Each uploaded screenshot is analyzed for its primary UI focal region, then
//! exported in every catalog format (16:9, 1:1, 9:16) with a crop biased
//! towards that region, optional brightness/contrast, a headline and a logo
//! watermark.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use asset_studio::{
//!     analysis::build_analyzer,
//!     batch::{Studio, UploadFile},
//!     config::Config,
//!     export::{DirectorySink, ExportSequencer},
//!     render::{Adjustments, GlobalStyle},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let analyzer = build_analyzer(&config.analysis, false)?;
//! let sequencer = ExportSequencer::from_config(&config)?;
//! let studio = Studio::new(analyzer, sequencer, config.batch.clone()).spawn();
//!
//! let screenshot = std::fs::read("popup.png")?;
//! studio.upload(vec![UploadFile::new("popup.png", screenshot)]).await?;
//!
//! let sink = Arc::new(DirectorySink::create("exports").await?);
//! let style = GlobalStyle::new().with_headline("Block trackers in one click");
//! let report = studio.export(style, Adjustments::default(), sink).await?;
//! println!("wrote {} files", report.artifacts.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`analysis`] - Focal-point detection behind the [`ImageAnalyzer`](analysis::ImageAnalyzer) trait
//! - [`geometry`] - Focal-biased crop rectangles
//! - [`render`] - Crop, scale, filter, headline, logo, JPEG
//! - [`batch`] - Batch state machine and the single-worker studio queue
//! - [`export`] - Ordered, paced artifact delivery
//! - [`config`] - Configuration management
//!
//! ## Custom Analyzers
//!
//! Any focal-point source can be plugged in by implementing
//! [`ImageAnalyzer`](analysis::ImageAnalyzer):
//!
//! ```rust,no_run
//! use asset_studio::analysis::{FocalAnalysis, ImageAnalyzer};
//! use asset_studio::geometry::FocalPoint;
//! use asset_studio::render::SourceImage;
//! use asset_studio::Result;
//! use async_trait::async_trait;
//!
//! struct TopLeftAnalyzer;
//!
//! #[async_trait]
//! impl ImageAnalyzer for TopLeftAnalyzer {
//!     fn name(&self) -> &str {
//!         "top-left"
//!     }
//!
//!     async fn analyze(&self, _image: &SourceImage) -> Result<FocalAnalysis> {
//!         Ok(FocalAnalysis::new(FocalPoint::new(25.0, 25.0), "upper left quadrant"))
//!     }
//! }
//! ```

pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod render;

// Re-export commonly used types for convenience
pub use crate::{
    analysis::{FocalAnalysis, ImageAnalyzer},
    batch::{Studio, StudioHandle},
    config::Config,
    error::{Result, StudioError},
    export::ExportSequencer,
    geometry::FocalPoint,
    render::{CompositeRenderer, OutputFormat, CATALOG},
};
