//! # Focal-Point Analysis
//!
//! Locates the primary UI region of each uploaded screenshot so crops can be
//! biased towards it. Analyzers sit behind the [`ImageAnalyzer`] trait:
//!
//! - **Gemini**: vision model over HTTP, needs an API key
//! - **Center**: offline, always answers (50, 50)

use std::sync::Arc;

use tracing::info;

use crate::config::{AnalysisConfig, AnalyzerKind};
use crate::error::Result;

pub mod center;
pub mod gemini;
pub mod traits;

pub use center::CenterAnalyzer;
pub use gemini::GeminiAnalyzer;
pub use traits::{FocalAnalysis, ImageAnalyzer};

/// Build the analyzer selected by configuration.
///
/// `offline` forces the [`CenterAnalyzer`] regardless of the configured provider.
pub fn build_analyzer(config: &AnalysisConfig, offline: bool) -> Result<Arc<dyn ImageAnalyzer>> {
    let kind = if offline { AnalyzerKind::Center } else { config.provider };

    let analyzer: Arc<dyn ImageAnalyzer> = match kind {
        AnalyzerKind::Gemini => Arc::new(GeminiAnalyzer::from_config(config)?),
        AnalyzerKind::Center => Arc::new(CenterAnalyzer::new()),
    };

    info!("Using {} analyzer", analyzer.name());
    Ok(analyzer)
}
