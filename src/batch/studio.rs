//! Single-worker job queue that owns the batch.
//!
//! Every external trigger (upload, manual override, selection, clear, export)
//! becomes a job on one FIFO queue consumed by one tokio task. Uploads move
//! every accepted file straight to `analyzing` and append one analysis job per
//! file to the back of that queue, so requests run one image at a time in
//! upload order and nothing can mutate the batch while an export walks it.
//!
//! Cancellation and observation bypass the queue: the abort token, batch
//! snapshots and export progress are all `watch` channels.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::analysis::{FocalAnalysis, ImageAnalyzer};
use crate::batch::cancel::CancelToken;
use crate::batch::controller::BatchController;
use crate::batch::types::{BatchSnapshot, IdGenerator, ItemId, RejectedUpload, UploadFile, UploadReport};
use crate::config::BatchConfig;
use crate::error::{AnalysisError, BatchError, Result};
use crate::export::{ArtifactSink, ExportProgress, ExportReport, ExportSequencer, ProgressReporter};
use crate::geometry::FocalPoint;
use crate::render::{Adjustments, GlobalStyle, SourceImage, CATALOG};

const COMMAND_BUFFER: usize = 64;

enum Command {
    Upload {
        files: Vec<UploadFile>,
        reply: oneshot::Sender<UploadReport>,
    },
    SetManualFocalPoint {
        id: ItemId,
        point: FocalPoint,
        reply: oneshot::Sender<Result<()>>,
    },
    Select {
        id: ItemId,
        reply: oneshot::Sender<Result<()>>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    Export {
        style: GlobalStyle,
        adjustments: Adjustments,
        sink: Arc<dyn ArtifactSink>,
        reply: oneshot::Sender<ExportReport>,
    },
    Settle {
        reply: oneshot::Sender<()>,
    },
}

enum Job {
    Command(Command),
    Analyze(ItemId),
}

/// Builder for the studio worker
pub struct Studio {
    worker: Worker,
    snapshot_rx: watch::Receiver<BatchSnapshot>,
    progress_rx: watch::Receiver<Option<ExportProgress>>,
}

struct Worker {
    batch: BatchController,
    analyzer: Arc<dyn ImageAnalyzer>,
    sequencer: ExportSequencer,
    limits: BatchConfig,
    cancel: CancelToken,
    snapshot_tx: watch::Sender<BatchSnapshot>,
}

impl Studio {
    /// The sequencer's progress reporter and abort token are replaced by the studio's own.
    pub fn new(analyzer: Arc<dyn ImageAnalyzer>, sequencer: ExportSequencer, limits: BatchConfig) -> Self {
        let cancel = CancelToken::new();
        let (snapshot_tx, snapshot_rx) = watch::channel(BatchSnapshot::default());
        let (progress_tx, progress_rx) = watch::channel(None);

        let sequencer = sequencer
            .with_progress(ProgressReporter::new(progress_tx))
            .with_cancel_token(cancel.clone());

        Self {
            worker: Worker {
                batch: BatchController::new(),
                analyzer,
                sequencer,
                limits,
                cancel,
                snapshot_tx,
            },
            snapshot_rx,
            progress_rx,
        }
    }

    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.worker.batch = BatchController::with_id_generator(ids);
        self
    }

    /// Start the worker task. It stops once every handle is dropped.
    pub fn spawn(self) -> StudioHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let cancel = self.worker.cancel.clone();

        info!("Starting studio worker with {} analyzer", self.worker.analyzer.name());
        tokio::spawn(self.worker.run(rx));

        StudioHandle {
            tx,
            cancel,
            snapshot_rx: self.snapshot_rx,
            progress_rx: self.progress_rx,
        }
    }
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        let mut queue: VecDeque<Job> = VecDeque::new();

        loop {
            if queue.is_empty() {
                match rx.recv().await {
                    Some(command) => {
                        // Idle until now, so no running work can still be the target of a cancel
                        self.cancel.reset();
                        queue.push_back(Job::Command(command));
                    }
                    None => break,
                }
            }

            while let Ok(command) = rx.try_recv() {
                queue.push_back(Job::Command(command));
            }

            if let Some(job) = queue.pop_front() {
                match job {
                    Job::Analyze(id) => self.analyze(id).await,
                    Job::Command(command) => self.handle(command, &mut queue).await,
                }
            }
        }

        debug!("Studio worker stopped");
    }

    async fn handle(&mut self, command: Command, queue: &mut VecDeque<Job>) {
        match command {
            Command::Upload { files, reply } => {
                let report = self.upload(files).await;
                queue.extend(report.accepted.iter().cloned().map(Job::Analyze));
                let _ = reply.send(report);
            }
            Command::SetManualFocalPoint { id, point, reply } => {
                let result = self.batch.set_manual_focal_point(&id, point);
                self.publish();
                let _ = reply.send(result);
            }
            Command::Select { id, reply } => {
                let result = self.batch.select(&id);
                self.publish();
                let _ = reply.send(result);
            }
            Command::Clear { reply } => {
                self.batch.clear();
                self.publish();
                let _ = reply.send(());
            }
            Command::Export {
                style,
                adjustments,
                sink,
                reply,
            } => {
                let report = self
                    .sequencer
                    .export_all(self.batch.items(), &CATALOG, &style, adjustments, sink.as_ref())
                    .await;
                let _ = reply.send(report);
            }
            Command::Settle { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn upload(&mut self, files: Vec<UploadFile>) -> UploadReport {
        let mut report = UploadReport::default();
        let mut candidates = Vec::new();

        for (index, file) in files.into_iter().enumerate() {
            if index >= self.limits.max_upload {
                report.rejected.push(RejectedUpload {
                    index,
                    name: file.name,
                    reason: format!("at most {} files per upload", self.limits.max_upload),
                });
                continue;
            }

            if file.bytes.len() as u64 > self.limits.max_file_bytes {
                report.rejected.push(RejectedUpload {
                    index,
                    reason: format!(
                        "{} bytes exceeds the {} byte limit",
                        file.bytes.len(),
                        self.limits.max_file_bytes
                    ),
                    name: file.name,
                });
                continue;
            }

            candidates.push((index, file));
        }

        let names: Vec<(usize, String)> = candidates
            .iter()
            .map(|(index, file)| (*index, file.name.clone()))
            .collect();
        let decoded = tokio::task::spawn_blocking(move || {
            candidates
                .into_iter()
                .map(|(index, file)| {
                    let name = file.name.clone();
                    (index, name, SourceImage::decode(file.name, file.bytes))
                })
                .collect::<Vec<_>>()
        })
        .await;

        let mut accepted = Vec::new();
        match decoded {
            Ok(results) => {
                for (index, name, result) in results {
                    match result {
                        Ok(source) => accepted.push(source),
                        Err(e) => report.rejected.push(RejectedUpload {
                            index,
                            name,
                            reason: e.to_string(),
                        }),
                    }
                }
            }
            Err(e) => {
                warn!("Decoder task failed: {}", e);
                report.rejected.extend(reject_all(names, &format!("decoder failed: {}", e)));
            }
        }

        for rejected in &report.rejected {
            warn!("Rejected {}: {}", rejected.name, rejected.reason);
        }

        report.accepted = self.batch.enqueue(accepted);
        for id in &report.accepted {
            if let Err(e) = self.batch.begin_analysis(id) {
                warn!("Cannot queue analysis of {}: {}", id, e);
            }
        }
        info!(
            "Upload accepted {} files, rejected {}; batch now holds {}",
            report.accepted.len(),
            report.rejected.len(),
            self.batch.len()
        );
        self.publish();
        report
    }

    /// Run the queued request for an item already marked `analyzing` at upload
    async fn analyze(&mut self, id: ItemId) {
        let Some(source) = self.batch.item(&id).map(|item| item.source.clone()) else {
            debug!("Skipping analysis of {}: no longer in the batch", id);
            return;
        };

        let outcome: Result<FocalAnalysis> = if self.cancel.is_cancelled() {
            Err(AnalysisError::Cancelled.into())
        } else {
            let analyzer = Arc::clone(&self.analyzer);
            tokio::select! {
                result = analyzer.analyze(&source) => result,
                _ = self.cancel.cancelled() => Err(AnalysisError::Cancelled.into()),
            }
        };

        if let Err(e) = self.batch.complete_analysis(&id, outcome) {
            warn!("Could not record analysis for {}: {}", id, e);
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.batch.snapshot());
    }
}

fn reject_all(names: Vec<(usize, String)>, reason: &str) -> Vec<RejectedUpload> {
    names
        .into_iter()
        .map(|(index, name)| RejectedUpload {
            index,
            name,
            reason: reason.to_string(),
        })
        .collect()
}

/// Cloneable front end to a running studio worker
#[derive(Clone)]
pub struct StudioHandle {
    tx: mpsc::Sender<Command>,
    cancel: CancelToken,
    snapshot_rx: watch::Receiver<BatchSnapshot>,
    progress_rx: watch::Receiver<Option<ExportProgress>>,
}

impl StudioHandle {
    /// Validate, decode and enqueue files; analysis is queued behind them.
    ///
    /// Returns once the files are in the batch at `analyzing`, not once they
    /// are analyzed.
    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<UploadReport> {
        self.request(|reply| Command::Upload { files, reply }).await
    }

    pub async fn set_manual_focal_point(&self, id: &ItemId, point: FocalPoint) -> Result<()> {
        let id = id.clone();
        self.request(|reply| Command::SetManualFocalPoint { id, point, reply })
            .await?
    }

    pub async fn select(&self, id: &ItemId) -> Result<()> {
        let id = id.clone();
        self.request(|reply| Command::Select { id, reply }).await?
    }

    pub async fn clear(&self) -> Result<()> {
        self.request(|reply| Command::Clear { reply }).await
    }

    /// Export the whole batch in every catalog format.
    ///
    /// Runs after everything queued before it, including pending analyses.
    pub async fn export(
        &self,
        style: GlobalStyle,
        adjustments: Adjustments,
        sink: Arc<dyn ArtifactSink>,
    ) -> Result<ExportReport> {
        self.request(|reply| Command::Export {
            style,
            adjustments,
            sink,
            reply,
        })
        .await
    }

    /// Resolves once every job queued before this call has run
    pub async fn settle(&self) -> Result<()> {
        self.request(|reply| Command::Settle { reply }).await
    }

    /// Abort the running analysis or export; queued analyses end in `error`
    pub fn cancel(&self) {
        info!("Cancellation requested");
        self.cancel.cancel();
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<BatchSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn progress(&self) -> Option<ExportProgress> {
        *self.progress_rx.borrow()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<Option<ExportProgress>> {
        self.progress_rx.clone()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| BatchError::WorkerStopped)?;
        response.await.map_err(|_| BatchError::WorkerStopped.into())
    }
}
