use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::batch::{BatchItem, CancelToken, ItemId};
use crate::config::Config;
use crate::error::{Result, StudioError};
use crate::export::progress::ProgressReporter;
use crate::export::sink::{Artifact, ArtifactSink};
use crate::geometry::FocalPoint;
use crate::render::{Adjustments, CompositeRenderer, GlobalStyle, OutputFormat};

/// File name of the artifact for one item and format
pub fn artifact_name(prefix: &str, id: &ItemId, format: &OutputFormat) -> String {
    format!("{}_{}_{}.jpg", prefix, id.prefix(), format.id)
}

/// An artifact that could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFailure {
    pub name: String,
    pub item_id: ItemId,
    pub format_id: &'static str,
    pub reason: String,
}

/// Outcome of an export run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    /// Names of delivered artifacts, in emission order
    pub artifacts: Vec<String>,
    pub failures: Vec<ExportFailure>,
    /// The run was stopped by the abort token
    pub cancelled: bool,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Exports every item in every format, one artifact at a time.
///
/// Items are visited in batch order and formats in catalog order. Each pair
/// is rendered with the item's effective focal point and handed to the sink,
/// with a fixed pause between consecutive artifacts. A failed artifact is
/// recorded and skipped; the run carries on with the next one.
pub struct ExportSequencer {
    renderer: CompositeRenderer,
    file_prefix: String,
    pacing: Duration,
    progress: ProgressReporter,
    cancel: CancelToken,
}

impl ExportSequencer {
    pub const DEFAULT_PREFIX: &'static str = "extension_asset";

    pub fn new(renderer: CompositeRenderer) -> Self {
        Self {
            renderer,
            file_prefix: Self::DEFAULT_PREFIX.to_string(),
            pacing: Duration::from_millis(300),
            progress: ProgressReporter::disabled(),
            cancel: CancelToken::new(),
        }
    }

    /// Build a sequencer from configuration, loading a headline font override if set
    pub fn from_config(config: &Config) -> Result<Self> {
        let renderer = CompositeRenderer::from_config(&config.render)?;
        Ok(Self::new(renderer)
            .with_prefix(config.export.file_prefix.clone())
            .with_pacing(config.export.pacing()))
    }

    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn renderer(&self) -> &CompositeRenderer {
        &self.renderer
    }

    pub async fn export_all(
        &self,
        items: &[BatchItem],
        formats: &[OutputFormat],
        style: &GlobalStyle,
        adjustments: Adjustments,
        sink: &dyn ArtifactSink,
    ) -> ExportReport {
        let mut report = ExportReport::default();
        if items.is_empty() || formats.is_empty() {
            info!("Nothing to export");
            return report;
        }

        if !style.headline.trim().is_empty() && !self.renderer.has_font() {
            warn!("Headline set but no headline font could be loaded; exporting without headline");
        }

        let started = Instant::now();
        let total = items.len();
        let mut attempted = 0usize;

        info!("Exporting {} items x {} formats", total, formats.len());

        'items: for (index, item) in items.iter().enumerate() {
            self.progress.begin_item(index + 1, total);
            let focal = item.effective_focal_point();
            debug!(
                "Item {} ({}) focal ({:.1}, {:.1}) from {:?}",
                item.id,
                item.status,
                focal.x,
                focal.y,
                item.focal_source()
            );

            for output in formats {
                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'items;
                }

                if attempted > 0 && !self.pacing.is_zero() {
                    tokio::select! {
                        _ = tokio::time::sleep(self.pacing) => {}
                        _ = self.cancel.cancelled() => {
                            report.cancelled = true;
                            break 'items;
                        }
                    }
                }
                attempted += 1;

                let name = artifact_name(&self.file_prefix, &item.id, output);
                let bytes = match self.render_one(item, output, focal, style, adjustments).await {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => {
                        report.cancelled = true;
                        break 'items;
                    }
                    Err(e) => {
                        warn!("Failed to render {}: {}", name, e);
                        report.failures.push(failure(name, item, output, &e));
                        continue;
                    }
                };

                let artifact = Artifact {
                    name: name.clone(),
                    item_id: item.id.clone(),
                    format_id: output.id,
                    bytes,
                };

                match sink.emit(artifact).await {
                    Ok(()) => report.artifacts.push(name),
                    Err(e) => {
                        warn!("Failed to deliver {}: {}", name, e);
                        report.failures.push(failure(name, item, output, &e));
                    }
                }
            }
        }

        self.progress.clear();

        if report.cancelled {
            warn!("Export cancelled after {} artifacts", report.artifacts.len());
        } else {
            info!(
                "Exported {} artifacts ({} failed) in {:?}",
                report.artifacts.len(),
                report.failures.len(),
                started.elapsed()
            );
        }
        report
    }

    /// Render on the blocking pool; `None` if cancelled while waiting.
    async fn render_one(
        &self,
        item: &BatchItem,
        output: &OutputFormat,
        focal: FocalPoint,
        style: &GlobalStyle,
        adjustments: Adjustments,
    ) -> Result<Option<Vec<u8>>> {
        let renderer = self.renderer.clone();
        let source = item.source.clone();
        let style = style.clone();
        let output = *output;

        let task = tokio::task::spawn_blocking(move || {
            renderer.render(source.pixels(), &output, focal, &style, adjustments)
        });

        tokio::select! {
            joined = task => match joined {
                Ok(result) => result.map(Some),
                Err(e) => Err(StudioError::generic(format!("render task failed: {}", e))),
            },
            _ = self.cancel.cancelled() => Ok(None),
        }
    }
}

fn failure(name: String, item: &BatchItem, output: &OutputFormat, error: &StudioError) -> ExportFailure {
    ExportFailure {
        name,
        item_id: item.id.clone(),
        format_id: output.id,
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ItemStatus;
    use crate::error::ExportError;
    use crate::export::progress::ExportProgress;
    use crate::export::sink::CollectingSink;
    use crate::render::{SourceImage, CATALOG};
    use async_trait::async_trait;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::sync::Mutex;
    use tokio::sync::watch;

    fn item(id: &str) -> BatchItem {
        let pixels = DynamicImage::ImageRgb8(RgbImage::from_fn(96, 54, |x, y| {
            Rgb([(x * 2) as u8, (y * 4) as u8, 90])
        }));
        let source = SourceImage::from_image(format!("{}.png", id), pixels).unwrap();
        BatchItem::new(ItemId::from(id), source)
    }

    fn sequencer() -> ExportSequencer {
        ExportSequencer::new(CompositeRenderer::default()).with_pacing(Duration::ZERO)
    }

    /// Records the progress label visible at each emission
    struct ProgressRecorder {
        rx: watch::Receiver<Option<ExportProgress>>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ArtifactSink for ProgressRecorder {
        async fn emit(&self, _artifact: Artifact) -> Result<()> {
            let label = self.rx.borrow().map(|p| p.label()).unwrap_or_default();
            self.seen.lock().unwrap().push(label);
            Ok(())
        }
    }

    /// Rejects one format, accepts the rest
    struct PickySink {
        reject: &'static str,
        inner: CollectingSink,
    }

    #[async_trait]
    impl ArtifactSink for PickySink {
        async fn emit(&self, artifact: Artifact) -> Result<()> {
            if artifact.format_id == self.reject {
                return Err(ExportError::SinkFailed {
                    name: artifact.name,
                    reason: "disk full".into(),
                }
                .into());
            }
            self.inner.emit(artifact).await
        }
    }

    /// Pulls the abort token after the first artifact
    struct CancellingSink {
        token: CancelToken,
        inner: CollectingSink,
    }

    #[async_trait]
    impl ArtifactSink for CancellingSink {
        async fn emit(&self, artifact: Artifact) -> Result<()> {
            self.token.cancel();
            self.inner.emit(artifact).await
        }
    }

    #[tokio::test]
    async fn test_item_then_format_order() {
        let items = vec![item("aaaaaa111"), item("bbbbbb222")];
        let sink = CollectingSink::new();

        let report = sequencer()
            .export_all(&items, &CATALOG, &GlobalStyle::new(), Adjustments::default(), &sink)
            .await;

        assert!(report.is_complete());
        assert_eq!(
            sink.names().await,
            vec![
                "extension_asset_aaaaaa_youtube.jpg",
                "extension_asset_aaaaaa_instagram.jpg",
                "extension_asset_aaaaaa_story.jpg",
                "extension_asset_bbbbbb_youtube.jpg",
                "extension_asset_bbbbbb_instagram.jpg",
                "extension_asset_bbbbbb_story.jpg",
            ]
        );
        assert_eq!(report.artifacts, sink.names().await);
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let items = vec![item("cccccc333")];
        let sink = CollectingSink::new();

        sequencer()
            .with_prefix("promo")
            .export_all(&items, &CATALOG[..1], &GlobalStyle::new(), Adjustments::default(), &sink)
            .await;

        assert_eq!(sink.names().await, vec!["promo_cccccc_youtube.jpg"]);
    }

    #[tokio::test]
    async fn test_progress_is_per_item_and_cleared() {
        let (tx, rx) = watch::channel(None);
        let recorder = ProgressRecorder {
            rx: rx.clone(),
            seen: Mutex::new(Vec::new()),
        };
        let items = vec![item("aaaaaa111"), item("bbbbbb222")];

        sequencer()
            .with_progress(ProgressReporter::new(tx))
            .export_all(&items, &CATALOG, &GlobalStyle::new(), Adjustments::default(), &recorder)
            .await;

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(&seen[..3], &["Processing Image 1/2"; 3]);
        assert_eq!(&seen[3..], &["Processing Image 2/2"; 3]);
        assert_eq!(*rx.borrow(), None);
    }

    #[tokio::test]
    async fn test_sink_failure_skips_only_that_artifact() {
        let items = vec![item("aaaaaa111"), item("bbbbbb222")];
        let sink = PickySink {
            reject: "instagram",
            inner: CollectingSink::new(),
        };

        let report = sequencer()
            .export_all(&items, &CATALOG, &GlobalStyle::new(), Adjustments::default(), &sink)
            .await;

        assert_eq!(report.artifacts.len(), 4);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures.iter().all(|f| f.format_id == "instagram"));
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_error_item_exports_with_center() {
        let mut failed = item("dddddd444");
        failed.status = ItemStatus::Error;
        let sink = CollectingSink::new();

        sequencer()
            .export_all(
                std::slice::from_ref(&failed),
                &CATALOG[2..],
                &GlobalStyle::new(),
                Adjustments::default(),
                &sink,
            )
            .await;

        let expected = CompositeRenderer::default()
            .render(
                failed.source.pixels(),
                &CATALOG[2],
                FocalPoint::CENTER,
                &GlobalStyle::new(),
                Adjustments::default(),
            )
            .unwrap();
        let artifacts = sink.take().await;
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].bytes, expected);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let (tx, rx) = watch::channel(None);
        let sink = CollectingSink::new();

        let report = sequencer()
            .with_progress(ProgressReporter::new(tx))
            .export_all(&[], &CATALOG, &GlobalStyle::new(), Adjustments::default(), &sink)
            .await;

        assert!(report.artifacts.is_empty());
        assert!(report.is_complete());
        assert_eq!(sink.len().await, 0);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_cancel_stops_between_artifacts() {
        let token = CancelToken::new();
        let sink = CancellingSink {
            token: token.clone(),
            inner: CollectingSink::new(),
        };
        let items = vec![item("aaaaaa111"), item("bbbbbb222")];

        let report = sequencer()
            .with_cancel_token(token)
            .export_all(&items, &CATALOG, &GlobalStyle::new(), Adjustments::default(), &sink)
            .await;

        assert!(report.cancelled);
        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(sink.inner.len().await, 1);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pacing() {
        let token = CancelToken::new();
        let sink = CollectingSink::new();
        let items = vec![item("aaaaaa111")];

        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let report = sequencer()
            .with_pacing(Duration::from_secs(30))
            .with_cancel_token(token)
            .export_all(&items, &CATALOG, &GlobalStyle::new(), Adjustments::default(), &sink)
            .await;

        assert!(report.cancelled);
        assert!(report.artifacts.len() <= 1);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_pacing_between_artifacts() {
        let items = vec![item("aaaaaa111")];
        let sink = CollectingSink::new();

        let started = Instant::now();
        sequencer()
            .with_pacing(Duration::from_millis(25))
            .export_all(&items, &CATALOG, &GlobalStyle::new(), Adjustments::default(), &sink)
            .await;

        // Three artifacts, two pauses
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(sink.len().await, 3);
    }
}
