use rayon::prelude::*;

use crate::render::types::{Adjustments, Canvas};

/// Apply brightness then contrast with CSS filter semantics.
///
/// Each stage is clamped to `[0, 1]` before the next one, matching how a
/// filter chain composes. Both stages only depend on the input channel value,
/// so the whole chain collapses into a 256-entry lookup table.
pub fn apply_adjustments(canvas: &mut Canvas, adjustments: Adjustments) {
    if adjustments.is_identity() {
        return;
    }

    let lut = build_lut(adjustments);
    let row_len = canvas.width() as usize * 3;
    if row_len == 0 {
        return;
    }

    let buffer: &mut [u8] = canvas.as_image_mut();
    buffer.par_chunks_mut(row_len).for_each(|row| {
        for value in row.iter_mut() {
            *value = lut[*value as usize];
        }
    });
}

fn build_lut(adjustments: Adjustments) -> [u8; 256] {
    let brightness = adjustments.brightness / 100.0;
    let contrast = adjustments.contrast / 100.0;

    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let v = i as f32 / 255.0;
        let v = (v * brightness).clamp(0.0, 1.0);
        let v = ((v - 0.5) * contrast + 0.5).clamp(0.0, 1.0);
        *entry = (v * 255.0).round() as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_untouched() {
        let mut canvas = Canvas::new_filled(4, 4, [12, 130, 250]);
        apply_adjustments(&mut canvas, Adjustments::default());
        assert_eq!(canvas.get_pixel(2, 2), [12, 130, 250]);
    }

    #[test]
    fn test_brightness_scales_channels() {
        let mut canvas = Canvas::new_filled(3, 2, [200, 100, 0]);
        apply_adjustments(&mut canvas, Adjustments::new(50.0, 100.0));
        assert_eq!(canvas.get_pixel(0, 0), [100, 50, 0]);
    }

    #[test]
    fn test_brightness_saturates_before_contrast() {
        let lut = build_lut(Adjustments::new(200.0, 100.0));
        assert_eq!(lut[200], 255);
        assert_eq!(lut[64], 128);
    }

    #[test]
    fn test_zero_contrast_is_mid_grey() {
        let mut canvas = Canvas::new_filled(2, 2, [0, 255, 77]);
        apply_adjustments(&mut canvas, Adjustments::new(100.0, 0.0));
        assert_eq!(canvas.get_pixel(1, 1), [128, 128, 128]);
    }

    #[test]
    fn test_high_contrast_pushes_extremes() {
        let lut = build_lut(Adjustments::new(100.0, 200.0));
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        assert!(lut[64] < 64);
        assert!(lut[192] > 192);
    }
}
