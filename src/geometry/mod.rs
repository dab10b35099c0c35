//! # Crop Geometry
//!
//! Pure functions mapping a source image, a target aspect ratio and a focal
//! point to the source-space rectangle that gets scaled onto the output canvas.
//! No I/O and no pixels: everything here is unit testable in isolation.

pub mod crop;

pub use crop::{compute_crop_rect, CropRect, FocalPoint, PixelRegion};
