// Minimal smoke run of the render pipeline, no network and no worker

use asset_studio::{
    analysis::{CenterAnalyzer, ImageAnalyzer},
    geometry::{compute_crop_rect, FocalPoint},
    render::{Adjustments, CompositeRenderer, GlobalStyle, SourceImage, CATALOG},
};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🖼️  Testing Asset Studio Core Functionality");

    // Test 1: Synthetic screenshot
    println!("\n1. Creating synthetic screenshot...");
    let pixels = DynamicImage::ImageRgb8(RgbImage::from_fn(1600, 1000, |x, y| {
        Rgb([(x * 255 / 1600) as u8, (y * 255 / 1000) as u8, 160])
    }));
    let source = SourceImage::from_image("synthetic.png", pixels)?;
    println!("   Created source: {}x{} ({} PNG bytes)", source.width(), source.height(), source.bytes().len());

    // Test 2: Offline analysis
    println!("\n2. Testing offline analyzer...");
    let analysis = CenterAnalyzer::new().analyze(&source).await?;
    println!("   Focal point: ({}, {})", analysis.focal_point.x, analysis.focal_point.y);

    // Test 3: Crop geometry
    println!("\n3. Testing crop geometry...");
    let focal = FocalPoint::new(80.0, 30.0);
    for format in CATALOG.iter() {
        let rect = compute_crop_rect(source.width(), source.height(), format.width, format.height, focal);
        println!(
            "   {:<10} crop {:.0}x{:.0} at ({:.0}, {:.0})",
            format.id, rect.sw, rect.sh, rect.sx, rect.sy
        );
    }

    // Test 4: Render every format
    println!("\n4. Rendering every format...");
    let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(120, 60, Rgba([255, 255, 255, 220])));
    let style = GlobalStyle::new().with_headline("Smoke test").with_logo(logo);
    let renderer = CompositeRenderer::default();

    for format in CATALOG.iter() {
        let jpeg = renderer.render(source.pixels(), format, focal, &style, Adjustments::new(110.0, 120.0))?;
        let path = format!("minimal_output_{}.jpg", format.id);
        match std::fs::write(&path, &jpeg) {
            Ok(()) => println!("   📁 {} -> {} ({} bytes)", format.display_name, path, jpeg.len()),
            Err(e) => println!("   ⚠️  Could not save {}: {}", path, e),
        }
    }

    if !renderer.has_font() {
        println!("\n   ⚠️  Bundled headline font failed to load, headline was skipped");
    }

    println!("\n🎉 All steps passed! Asset Studio core is working.");
    Ok(())
}
