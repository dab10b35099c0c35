use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, Rgba, RgbImage, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::error::{RenderError, Result};
use crate::render::types::Canvas;

/// DejaVu Sans Bold, embedded so headlines render without any configuration
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Headline baseline, as a fraction of canvas height from the top
pub const HEADLINE_BASELINE_RATIO: f32 = 0.15;
/// Headline font size, as a fraction of canvas height
pub const HEADLINE_SIZE_RATIO: f32 = 0.07;
/// Shadow blur sigma, as a fraction of the font size
pub const SHADOW_BLUR_RATIO: f32 = 0.18;
/// Shadow drop, as a fraction of the font size
pub const SHADOW_OFFSET_RATIO: f32 = 0.04;
pub const SHADOW_OPACITY: f32 = 0.8;

/// Logo width, as a fraction of canvas width
pub const LOGO_WIDTH_RATIO: f32 = 0.12;
/// Distance from the right and bottom edges, in pixels
pub const LOGO_INSET: u32 = 40;
pub const LOGO_OPACITY: f32 = 0.9;

/// Parse the headline font compiled into the crate
pub fn bundled_font() -> Result<FontArc> {
    FontArc::try_from_slice(BUNDLED_FONT).map_err(|e| {
        RenderError::FontLoad {
            path: "bundled DejaVuSans-Bold.ttf".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Draw `text` uppercased and centred, white over a soft black shadow.
///
/// The baseline sits at 15% of the canvas height and the font size is 7% of
/// it, so the headline scales with the format.
pub fn draw_headline(canvas: &mut Canvas, text: &str, font: &FontArc) {
    let text = text.trim().to_uppercase();
    if text.is_empty() {
        return;
    }

    let (width, height) = (canvas.width(), canvas.height());
    let px = (height as f32 * HEADLINE_SIZE_RATIO).max(1.0);
    let scale = PxScale::from(px);
    let scaled = font.as_scaled(scale);

    let (text_w, _) = text_size(scale, font, &text);
    let line_h = (scaled.ascent() - scaled.descent()).ceil().max(1.0) as u32;

    let x = (width as i64 - text_w as i64) / 2;
    let y = (height as f32 * HEADLINE_BASELINE_RATIO - scaled.ascent()).round() as i64;

    // Shadow: rasterise into a padded alpha layer, blur, then blend under the text
    let sigma = px * SHADOW_BLUR_RATIO;
    let pad = (sigma * 3.0).ceil() as u32;
    let mut layer = RgbaImage::new(text_w + 2 * pad, line_h + 2 * pad);
    draw_text_mut(
        &mut layer,
        Rgba([0, 0, 0, 255]),
        pad as i32,
        pad as i32,
        scale,
        font,
        &text,
    );
    let layer = imageops::blur(&layer, sigma);
    let drop = (px * SHADOW_OFFSET_RATIO).round() as i64;
    blend_layer(
        canvas.as_image_mut(),
        &layer,
        x - pad as i64,
        y - pad as i64 + drop,
        SHADOW_OPACITY,
    );

    draw_text_mut(
        canvas.as_image_mut(),
        Rgb([255, 255, 255]),
        x as i32,
        y as i32,
        scale,
        font,
        &text,
    );
}

/// Draw the logo in the bottom-right corner, aspect preserved.
pub fn draw_logo(canvas: &mut Canvas, logo: &DynamicImage) {
    if logo.width() == 0 || logo.height() == 0 {
        return;
    }

    let (width, height) = (canvas.width(), canvas.height());
    let (logo_w, logo_h) = logo_dimensions(width, logo.width(), logo.height());
    let scaled = imageops::resize(&logo.to_rgba8(), logo_w, logo_h, FilterType::Lanczos3);

    let x = width as i64 - logo_w as i64 - LOGO_INSET as i64;
    let y = height as i64 - logo_h as i64 - LOGO_INSET as i64;
    blend_layer(canvas.as_image_mut(), &scaled, x, y, LOGO_OPACITY);
}

/// Logo size on a canvas of `canvas_w`: 12% of the width, source aspect kept.
pub fn logo_dimensions(canvas_w: u32, logo_w: u32, logo_h: u32) -> (u32, u32) {
    let w = (canvas_w as f32 * LOGO_WIDTH_RATIO).round().max(1.0) as u32;
    let h = (w as f64 * logo_h as f64 / logo_w as f64).round().max(1.0) as u32;
    (w, h)
}

/// Alpha-blend `layer` onto `target` with its top-left at (`origin_x`, `origin_y`).
///
/// Pixels falling outside the target are dropped.
pub fn blend_layer(
    target: &mut RgbImage,
    layer: &RgbaImage,
    origin_x: i64,
    origin_y: i64,
    opacity: f32,
) {
    let (tw, th) = (target.width() as i64, target.height() as i64);

    for (lx, ly, pixel) in layer.enumerate_pixels() {
        let tx = origin_x + lx as i64;
        let ty = origin_y + ly as i64;
        if tx < 0 || ty < 0 || tx >= tw || ty >= th {
            continue;
        }

        let alpha = pixel[3] as f32 / 255.0 * opacity;
        if alpha <= 0.0 {
            continue;
        }

        let dst = target.get_pixel_mut(tx as u32, ty as u32);
        for c in 0..3 {
            let blended = dst[c] as f32 * (1.0 - alpha) + pixel[c] as f32 * alpha;
            dst[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKGROUND: [u8; 3] = [60, 60, 60];

    fn headline_canvas(text: &str) -> Canvas {
        let mut canvas = Canvas::new_filled(1280, 720, BACKGROUND);
        draw_headline(&mut canvas, text, &bundled_font().unwrap());
        canvas
    }

    /// Rows holding at least one pixel brighter than `threshold` in columns `xs`
    fn bright_rows(canvas: &Canvas, xs: std::ops::Range<u32>, threshold: u8) -> Vec<u32> {
        (0..canvas.height())
            .filter(|&y| xs.clone().any(|x| canvas.get_pixel(x, y)[0] > threshold))
            .collect()
    }

    #[test]
    fn test_bundled_font_parses() {
        let font = bundled_font().unwrap();
        assert!(font.glyph_id('W').0 != 0);
    }

    #[test]
    fn test_headline_sits_on_the_baseline() {
        let canvas = headline_canvas("LAUNCH DAY");

        // 720 * 0.15 = 108; caps of a 50.4px font stand roughly 32px tall
        let rows = bright_rows(&canvas, 440..840, 200);
        let (top, bottom) = (rows[0], rows[rows.len() - 1]);
        assert!((104..=110).contains(&bottom), "baseline at row {}", bottom);
        assert!((26..=38).contains(&(bottom - top)), "cap height {}", bottom - top);
    }

    #[test]
    fn test_headline_is_white_and_centred() {
        let canvas = headline_canvas("LAUNCH DAY");

        let brightest = (540..740)
            .flat_map(|x| (70..110).map(move |y| (x, y)))
            .map(|(x, y)| canvas.get_pixel(x, y))
            .max()
            .unwrap();
        assert!(brightest.iter().all(|&c| c >= 250), "fill {:?}", brightest);

        let columns: Vec<u32> = (0..canvas.width())
            .filter(|&x| (70..110).any(|y| canvas.get_pixel(x, y)[0] > 200))
            .collect();
        let (left, right) = (columns[0], columns[columns.len() - 1]);
        let slack = (left as i64 - (1279 - right) as i64).abs();
        assert!(slack <= 8, "text spans {}..{}", left, right);
    }

    #[test]
    fn test_headline_casts_a_shadow() {
        let canvas = headline_canvas("LAUNCH DAY");
        let shadowed = (440..840)
            .flat_map(|x| (110..140).map(move |y| (x, y)))
            .any(|(x, y)| canvas.get_pixel(x, y)[0] < BACKGROUND[0]);
        assert!(shadowed);
    }

    #[test]
    fn test_headline_leaves_the_rest_untouched() {
        let canvas = headline_canvas("LAUNCH DAY");
        for y in (0..30).chain(160..720) {
            for x in (0..1280).step_by(7) {
                assert_eq!(canvas.get_pixel(x, y), BACKGROUND, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_headline_is_uppercased() {
        let lower = headline_canvas("launch day");
        let upper = headline_canvas("LAUNCH DAY");
        assert!(lower == upper);
    }

    #[test]
    fn test_blank_headline_draws_nothing() {
        let canvas = headline_canvas("   ");
        assert_eq!(canvas.get_pixel(640, 100), BACKGROUND);
        assert!(bright_rows(&canvas, 0..1280, 61).is_empty());
    }

    #[test]
    fn test_blend_respects_opacity() {
        let mut target = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let layer = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255]));
        blend_layer(&mut target, &layer, 1, 1, 0.5);
        assert_eq!(target.get_pixel(1, 1).0, [100, 50, 25]);
        assert_eq!(target.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_blend_clips_outside_target() {
        let mut target = RgbImage::from_pixel(2, 2, Rgb([10, 10, 10]));
        let layer = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        blend_layer(&mut target, &layer, -3, -3, 1.0);
        assert_eq!(target.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(target.get_pixel(1, 1).0, [10, 10, 10]);
    }

    #[test]
    fn test_transparent_pixels_are_skipped() {
        let mut target = RgbImage::from_pixel(1, 1, Rgb([40, 40, 40]));
        let layer = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 0]));
        blend_layer(&mut target, &layer, 0, 0, 1.0);
        assert_eq!(target.get_pixel(0, 0).0, [40, 40, 40]);
    }

    #[test]
    fn test_logo_dimensions_keep_aspect() {
        // 12% of 1280 = 153.6 -> 154; 2:1 logo -> 77
        assert_eq!(logo_dimensions(1280, 200, 100), (154, 77));
        assert_eq!(logo_dimensions(1080, 50, 50), (130, 130));
    }

    #[test]
    fn test_logo_lands_bottom_right_with_inset() {
        let mut canvas = Canvas::new_filled(400, 300, [0, 0, 0]);
        let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])));
        draw_logo(&mut canvas, &logo);

        // 12% of 400 = 48px square, top-left at (312, 212)
        let inside = canvas.get_pixel(330, 230);
        assert!(inside[0] > 200, "expected logo pixel, got {:?}", inside);
        assert!(inside[0] < 255, "opacity should keep the logo translucent");

        assert_eq!(canvas.get_pixel(10, 10), [0, 0, 0]);
        assert_eq!(canvas.get_pixel(399, 299), [0, 0, 0]);
        assert_eq!(canvas.get_pixel(305, 230), [0, 0, 0]);
    }
}
