use serde::{Deserialize, Serialize};

/// Normalized focal point, both coordinates in percent of the source size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: f64,
    pub y: f64,
}

impl FocalPoint {
    /// The fallback used when neither a manual nor an AI focal point exists.
    pub const CENTER: FocalPoint = FocalPoint { x: 50.0, y: 50.0 };

    /// Create a focal point, clamping both coordinates into `[0, 100]`.
    ///
    /// Non-finite input collapses to the centre on that axis.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }
}

impl Default for FocalPoint {
    fn default() -> Self {
        Self::CENTER
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        50.0
    }
}

/// Crop rectangle in source pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub sx: f64,
    pub sy: f64,
    pub sw: f64,
    pub sh: f64,
}

/// Whole-pixel region suitable for sampling a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn aspect(&self) -> f64 {
        self.sw / self.sh
    }

    /// Snap to whole pixels, staying inside `source_w × source_h` and never empty.
    pub fn to_pixel_region(&self, source_w: u32, source_h: u32) -> PixelRegion {
        let width = (self.sw.round() as u32).clamp(1, source_w.max(1));
        let height = (self.sh.round() as u32).clamp(1, source_h.max(1));
        let x = (self.sx.round() as u32).min(source_w.saturating_sub(width));
        let y = (self.sy.round() as u32).min(source_h.saturating_sub(height));
        PixelRegion { x, y, width, height }
    }
}

/// Compute the largest crop with the target aspect ratio, centred as closely
/// as the source bounds allow on `focal`.
///
/// # Arguments
/// * `source_w`, `source_h` - Source image dimensions
/// * `target_w`, `target_h` - Output canvas dimensions (only the ratio matters)
/// * `focal` - Focal point in percent of the source
///
/// # Examples
/// ```
/// use asset_studio::geometry::{compute_crop_rect, FocalPoint};
///
/// // 4:3 source into a 1:1 target, focal point hard left
/// let rect = compute_crop_rect(800, 600, 1080, 1080, FocalPoint::new(0.0, 50.0));
/// assert_eq!((rect.sx, rect.sy, rect.sw, rect.sh), (0.0, 0.0, 600.0, 600.0));
/// ```
pub fn compute_crop_rect(
    source_w: u32,
    source_h: u32,
    target_w: u32,
    target_h: u32,
    focal: FocalPoint,
) -> CropRect {
    let (src_w, src_h) = (source_w as f64, source_h as f64);
    let target_aspect = target_w as f64 / target_h as f64;
    let source_aspect = src_w / src_h;

    if source_aspect > target_aspect {
        // Source is wider: keep full height, slide horizontally
        let sw = src_h * target_aspect;
        let max_x = (src_w - sw).max(0.0);
        let sx = (focal.x / 100.0 * src_w - sw / 2.0).clamp(0.0, max_x);
        CropRect { sx, sy: 0.0, sw, sh: src_h }
    } else {
        // Source is taller or equal: keep full width, slide vertically
        let sh = src_w / target_aspect;
        // Equal aspects can leave sh a rounding error above src_h
        let max_y = (src_h - sh).max(0.0);
        let sy = (focal.y / 100.0 * src_h - sh / 2.0).clamp(0.0, max_y);
        CropRect { sx: 0.0, sy, sw: src_w, sh }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATS: [(u32, u32); 3] = [(1280, 720), (1080, 1080), (1080, 1920)];
    const EPS: f64 = 1e-9;

    fn assert_inside(rect: &CropRect, w: u32, h: u32) {
        assert!(rect.sx >= 0.0 && rect.sy >= 0.0, "negative offset: {:?}", rect);
        assert!(rect.sx + rect.sw <= w as f64 + EPS, "overflows width: {:?}", rect);
        assert!(rect.sy + rect.sh <= h as f64 + EPS, "overflows height: {:?}", rect);
    }

    // =========================================================================
    // aspect and bounds
    // =========================================================================

    #[test]
    fn test_aspect_and_bounds_across_sources() {
        let sources = [
            (1920, 1080),
            (1080, 1920),
            (800, 600),
            (600, 800),
            (1000, 1000),
            (3840, 400),
            (400, 3840),
            (1, 1),
            (1366, 768),
        ];
        let focals = [
            FocalPoint::new(0.0, 0.0),
            FocalPoint::new(100.0, 100.0),
            FocalPoint::CENTER,
            FocalPoint::new(12.5, 87.5),
        ];

        for &(sw, sh) in &sources {
            for &(tw, th) in &FORMATS {
                for &focal in &focals {
                    let rect = compute_crop_rect(sw, sh, tw, th, focal);
                    let expected = tw as f64 / th as f64;
                    assert!(
                        (rect.aspect() - expected).abs() < 1e-9,
                        "{}x{} -> {}x{}: aspect {} != {}",
                        sw, sh, tw, th, rect.aspect(), expected
                    );
                    assert_inside(&rect, sw, sh);
                }
            }
        }
    }

    #[test]
    fn test_wider_source_keeps_full_height() {
        let rect = compute_crop_rect(1920, 1080, 1080, 1080, FocalPoint::CENTER);
        assert_eq!(rect.sh, 1080.0);
        assert_eq!(rect.sw, 1080.0);
        assert_eq!(rect.sy, 0.0);
        assert_eq!(rect.sx, 420.0); // 960 - 540
    }

    #[test]
    fn test_taller_source_keeps_full_width() {
        let rect = compute_crop_rect(1080, 1920, 1280, 720, FocalPoint::new(50.0, 25.0));
        assert_eq!(rect.sw, 1080.0);
        assert!((rect.sh - 607.5).abs() < EPS);
        assert_eq!(rect.sx, 0.0);
        // 480 - 303.75
        assert!((rect.sy - 176.25).abs() < EPS);
    }

    #[test]
    fn test_equal_aspect_uses_whole_image() {
        let rect = compute_crop_rect(2560, 1440, 1280, 720, FocalPoint::new(90.0, 10.0));
        assert_eq!((rect.sx, rect.sy, rect.sw), (0.0, 0.0, 2560.0));
        assert!((rect.sh - 1440.0).abs() < EPS);
    }

    // =========================================================================
    // edge focal points
    // =========================================================================

    #[test]
    fn test_extreme_focal_points_are_clamped() {
        let left = compute_crop_rect(1920, 1080, 1080, 1920, FocalPoint::new(0.0, 0.0));
        assert_eq!(left.sx, 0.0);

        let right = compute_crop_rect(1920, 1080, 1080, 1920, FocalPoint::new(100.0, 100.0));
        assert!((right.sx + right.sw - 1920.0).abs() < EPS);

        let top = compute_crop_rect(1080, 1920, 1280, 720, FocalPoint::new(0.0, 0.0));
        assert_eq!(top.sy, 0.0);

        let bottom = compute_crop_rect(1080, 1920, 1280, 720, FocalPoint::new(100.0, 100.0));
        assert!((bottom.sy + bottom.sh - 1920.0).abs() < EPS);
    }

    #[test]
    fn test_focal_point_constructor_clamps() {
        assert_eq!(FocalPoint::new(-20.0, 140.0), FocalPoint { x: 0.0, y: 100.0 });
        assert_eq!(FocalPoint::new(f64::NAN, 10.0), FocalPoint { x: 50.0, y: 10.0 });
        assert_eq!(FocalPoint::default(), FocalPoint::CENTER);
    }

    // =========================================================================
    // pixel snapping
    // =========================================================================

    #[test]
    fn test_pixel_region_stays_inside_source() {
        let rect = compute_crop_rect(1001, 333, 1080, 1920, FocalPoint::new(100.0, 50.0));
        let region = rect.to_pixel_region(1001, 333);
        assert!(region.width >= 1 && region.height >= 1);
        assert!(region.x + region.width <= 1001);
        assert!(region.y + region.height <= 333);
    }

    #[test]
    fn test_pixel_region_never_empty_for_tiny_sources() {
        let rect = compute_crop_rect(3, 1, 1080, 1920, FocalPoint::CENTER);
        let region = rect.to_pixel_region(3, 1);
        assert_eq!(region.height, 1);
        assert_eq!(region.width, 1);
    }
}
