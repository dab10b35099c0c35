use tracing::{debug, info, warn};

use crate::analysis::FocalAnalysis;
use crate::batch::types::{BatchItem, BatchSnapshot, IdGenerator, ItemId, ItemSnapshot, ItemStatus};
use crate::error::{BatchError, Result};
use crate::geometry::FocalPoint;
use crate::render::SourceImage;

/// Owns the batch: items in upload order, their status and the active selection.
///
/// All mutation goes through this type so that status transitions stay legal:
///
/// ```text
/// pending -> analyzing -> ready
///                      -> error
/// ```
///
/// A manual focal point may be set on any item that has left `pending`; it
/// does not change the status and wins over the AI result from then on.
#[derive(Debug)]
pub struct BatchController {
    items: Vec<BatchItem>,
    selected: Option<ItemId>,
    ids: IdGenerator,
}

impl BatchController {
    pub fn new() -> Self {
        Self::with_id_generator(IdGenerator::new())
    }

    pub fn with_id_generator(ids: IdGenerator) -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            ids,
        }
    }

    /// Append decoded images at `pending`, returning their ids in order.
    ///
    /// When nothing is selected the first new item becomes the selection.
    pub fn enqueue(&mut self, images: Vec<SourceImage>) -> Vec<ItemId> {
        let mut added = Vec::with_capacity(images.len());

        for source in images {
            let id = self.ids.next_id();
            debug!("Enqueued {} as {}", source.name(), id);
            self.items.push(BatchItem::new(id.clone(), source));
            added.push(id);
        }

        if self.selected.is_none() {
            self.selected = added.first().cloned();
        }

        added
    }

    /// `pending -> analyzing`
    pub fn begin_analysis(&mut self, id: &ItemId) -> Result<()> {
        let item = self.item_mut(id)?;
        if item.status != ItemStatus::Pending {
            return Err(invalid_transition(item, ItemStatus::Analyzing));
        }

        item.status = ItemStatus::Analyzing;
        Ok(())
    }

    /// `analyzing -> ready` on success, `analyzing -> error` on failure.
    ///
    /// Returns the new status.
    pub fn complete_analysis(&mut self, id: &ItemId, outcome: Result<FocalAnalysis>) -> Result<ItemStatus> {
        let item = self.item_mut(id)?;
        if item.status != ItemStatus::Analyzing {
            let to = if outcome.is_ok() { ItemStatus::Ready } else { ItemStatus::Error };
            return Err(invalid_transition(item, to));
        }

        match outcome {
            Ok(analysis) => {
                info!(
                    "{} ready, focal point ({:.1}, {:.1})",
                    item.source.name(),
                    analysis.focal_point.x,
                    analysis.focal_point.y
                );
                item.ai_analysis = Some(analysis.clamped());
                item.status = ItemStatus::Ready;
            }
            Err(e) => {
                warn!("Analysis failed for {}: {}", item.source.name(), e);
                item.ai_analysis = None;
                item.status = ItemStatus::Error;
            }
        }

        Ok(item.status)
    }

    /// Set the operator's focal point; it takes precedence from now on.
    pub fn set_manual_focal_point(&mut self, id: &ItemId, point: FocalPoint) -> Result<()> {
        let item = self.item_mut(id)?;
        if item.status == ItemStatus::Pending {
            return Err(BatchError::ItemPending { id: id.to_string() }.into());
        }

        item.manual_focal_point = Some(FocalPoint::new(point.x, point.y));
        debug!("Manual focal point for {}: ({:.1}, {:.1})", id, point.x, point.y);
        Ok(())
    }

    pub fn select(&mut self, id: &ItemId) -> Result<()> {
        self.item(id).ok_or_else(|| not_found(id))?;
        self.selected = Some(id.clone());
        Ok(())
    }

    pub fn selected(&self) -> Option<&BatchItem> {
        self.selected.as_ref().and_then(|id| self.item(id))
    }

    /// Manual override, then AI analysis, then the centre
    pub fn effective_focal_point(&self, id: &ItemId) -> Result<FocalPoint> {
        self.item(id)
            .map(BatchItem::effective_focal_point)
            .ok_or_else(|| not_found(id))
    }

    /// Drop every item and the selection
    pub fn clear(&mut self) {
        info!("Clearing batch of {} items", self.items.len());
        self.items.clear();
        self.selected = None;
    }

    pub fn item(&self, id: &ItemId) -> Option<&BatchItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            items: self.items.iter().map(ItemSnapshot::from).collect(),
            selected: self.selected.clone(),
        }
    }

    fn item_mut(&mut self, id: &ItemId) -> Result<&mut BatchItem> {
        self.items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| not_found(id))
    }
}

impl Default for BatchController {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: &ItemId) -> crate::error::StudioError {
    BatchError::ItemNotFound { id: id.to_string() }.into()
}

fn invalid_transition(item: &BatchItem, to: ItemStatus) -> crate::error::StudioError {
    BatchError::InvalidTransition {
        id: item.id.to_string(),
        from: item.status.to_string(),
        to: to.to_string(),
    }
    .into()
}
