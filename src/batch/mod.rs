//! # Batch
//!
//! The operator's working set: uploaded screenshots, their analysis status,
//! manual focal overrides and the active selection, plus the worker that
//! serialises everything done to them.

pub mod cancel;
pub mod controller;
pub mod studio;
pub mod types;

pub use cancel::CancelToken;
pub use controller::BatchController;
pub use studio::{Studio, StudioHandle};
pub use types::{
    BatchItem, BatchSnapshot, FocalSource, IdGenerator, ItemId, ItemSnapshot, ItemStatus, RejectedUpload,
    UploadFile, UploadReport,
};
