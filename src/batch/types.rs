use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::analysis::FocalAnalysis;
use crate::geometry::FocalPoint;
use crate::render::SourceImage;

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// Opaque item identifier: lowercase base-36, unique within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Number of leading characters used in artifact file names
    pub const PREFIX_LEN: usize = 6;

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form used in artifact file names; unique within a session
    pub fn prefix(&self) -> &str {
        &self.0[..Self::PREFIX_LEN.min(self.0.len())]
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Random id source that never hands out the same prefix twice.
#[derive(Debug)]
pub struct IdGenerator {
    rng: SmallRng,
    issued_prefixes: HashSet<String>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::from_rng(SmallRng::from_entropy())
    }

    /// Deterministic sequence, for tests
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        Self {
            rng,
            issued_prefixes: HashSet::new(),
        }
    }

    pub fn next_id(&mut self) -> ItemId {
        loop {
            let id: String = (0..ID_LEN)
                .map(|_| ID_ALPHABET[self.rng.gen_range(0..ID_ALPHABET.len())] as char)
                .collect();
            let id = ItemId(id);

            if self.issued_prefixes.insert(id.prefix().to_string()) {
                return id;
            }
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-item analysis lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Analyzing,
    Ready,
    Error,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Analyzing => "analyzing",
            ItemStatus::Ready => "ready",
            ItemStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Where an item's effective focal point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FocalSource {
    Manual,
    Ai,
    Default,
}

/// One uploaded screenshot and its analysis state
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: ItemId,
    pub source: SourceImage,
    pub ai_analysis: Option<FocalAnalysis>,
    pub manual_focal_point: Option<FocalPoint>,
    pub status: ItemStatus,
    pub uploaded_at: DateTime<Utc>,
}

impl BatchItem {
    pub fn new(id: ItemId, source: SourceImage) -> Self {
        Self {
            id,
            source,
            ai_analysis: None,
            manual_focal_point: None,
            status: ItemStatus::Pending,
            uploaded_at: Utc::now(),
        }
    }

    /// Manual override, then AI analysis, then the centre
    pub fn effective_focal_point(&self) -> FocalPoint {
        self.resolve_focal_point().0
    }

    pub fn focal_source(&self) -> FocalSource {
        self.resolve_focal_point().1
    }

    fn resolve_focal_point(&self) -> (FocalPoint, FocalSource) {
        if let Some(point) = self.manual_focal_point {
            (point, FocalSource::Manual)
        } else if let Some(analysis) = &self.ai_analysis {
            (analysis.focal_point, FocalSource::Ai)
        } else {
            (FocalPoint::CENTER, FocalSource::Default)
        }
    }
}

/// A file handed to the studio for upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new<S: Into<String>>(name: S, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A file that was turned away at upload time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedUpload {
    /// Position of the file in the upload call
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// Outcome of one upload call
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    /// Ids of the items that entered the batch, in upload order
    pub accepted: Vec<ItemId>,
    pub rejected: Vec<RejectedUpload>,
}

impl UploadReport {
    /// Item id for each of the `uploaded` files in upload order, `None` where rejected
    pub fn ids_by_position(&self, uploaded: usize) -> Vec<Option<&ItemId>> {
        let mut accepted = self.accepted.iter();
        (0..uploaded)
            .map(|index| {
                if self.rejected.iter().any(|r| r.index == index) {
                    None
                } else {
                    accepted.next()
                }
            })
            .collect()
    }
}

/// Status-indicator view of one item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: String,
    pub status: ItemStatus,
    pub focal_point: FocalPoint,
    pub focal_source: FocalSource,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&BatchItem> for ItemSnapshot {
    fn from(item: &BatchItem) -> Self {
        let (focal_point, focal_source) = item.resolve_focal_point();
        Self {
            id: item.id.clone(),
            name: item.source.name().to_string(),
            status: item.status,
            focal_point,
            focal_source,
            description: item.ai_analysis.as_ref().map(|a| a.description.clone()),
            uploaded_at: item.uploaded_at,
        }
    }
}

/// Point-in-time view of the whole batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSnapshot {
    pub items: Vec<ItemSnapshot>,
    pub selected: Option<ItemId>,
}

impl BatchSnapshot {
    pub fn item(&self, id: &ItemId) -> Option<&ItemSnapshot> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Number of items with the given status
    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }
}
