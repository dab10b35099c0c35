use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use asset_studio::{
    analysis::build_analyzer,
    batch::{ItemId, Studio, UploadFile},
    config::Config,
    export::{DirectorySink, ExportSequencer},
    geometry::FocalPoint,
    render::{Adjustments, GlobalStyle, CATALOG},
};

#[derive(Parser)]
#[command(
    name = "asset-studio",
    version,
    about = "Turn extension screenshots into store-ready marketing images",
    long_about = "Asset Studio finds the focal region of each screenshot, crops it into every store format around that region, and brands the result with a headline and logo."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze screenshots and export every format for each of them
    Export {
        /// Screenshots to process (PNG or JPEG)
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output directory (defaults to export.output_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Headline drawn on every asset
        #[arg(long, default_value = "")]
        headline: String,

        /// Logo watermark drawn bottom-right
        #[arg(long)]
        logo: Option<PathBuf>,

        /// Manual focal point for the N-th image (1-based), e.g. `2=30,70`
        #[arg(long = "focus", value_parser = parse_focus)]
        focus: Vec<(usize, FocalPoint)>,

        /// Brightness in percent (100 = unchanged)
        #[arg(long)]
        brightness: Option<f32>,

        /// Contrast in percent (100 = unchanged)
        #[arg(long)]
        contrast: Option<f32>,

        /// Skip the vision service and focus every image on its centre
        #[arg(long)]
        offline: bool,
    },

    /// List the output formats
    Formats,

    /// Write the default configuration
    GenConfig {
        /// Destination file; prints to stdout when omitted
        path: Option<PathBuf>,
    },
}

fn parse_focus(value: &str) -> std::result::Result<(usize, FocalPoint), String> {
    let (index, point) = value
        .split_once('=')
        .ok_or_else(|| format!("expected N=X,Y, got '{}'", value))?;
    let (x, y) = point
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y after '=', got '{}'", point))?;

    let index: usize = index.trim().parse().map_err(|_| format!("invalid image number '{}'", index))?;
    if index == 0 {
        return Err("image numbers start at 1".to_string());
    }
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid x '{}'", x))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid y '{}'", y))?;

    Ok((index, FocalPoint::new(x, y)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(|e| anyhow!(e.user_message()))?
        }
        None => Config::default(),
    };

    match cli.command {
        Command::Formats => {
            for format in CATALOG.iter() {
                println!("{:<10} {:>4}x{:<4}  {}", format.id, format.width, format.height, format.display_name);
            }
            Ok(())
        }
        Command::GenConfig { path } => match path {
            Some(path) => {
                Config::default().save_to_file(&path)?;
                info!("Default configuration written to {:?}", path);
                Ok(())
            }
            None => {
                print!("{}", Config::default().to_toml()?);
                Ok(())
            }
        },
        Command::Export {
            images,
            out_dir,
            headline,
            logo,
            focus,
            brightness,
            contrast,
            offline,
        } => {
            let mut config = config;
            if let Some(dir) = out_dir {
                config.export.output_dir = dir;
            }
            config.validate()?;

            let adjustments = Adjustments::new(
                brightness.unwrap_or(config.render.brightness),
                contrast.unwrap_or(config.render.contrast),
            );

            let mut style = GlobalStyle::new().with_headline(headline);
            if let Some(path) = logo {
                let image = image::open(&path).with_context(|| format!("Failed to open logo {:?}", path))?;
                style = style.with_logo(image);
            }

            run_export(config, images, style, adjustments, focus, offline).await
        }
    }
}

async fn run_export(
    config: Config,
    images: Vec<PathBuf>,
    style: GlobalStyle,
    adjustments: Adjustments,
    focus: Vec<(usize, FocalPoint)>,
    offline: bool,
) -> Result<()> {
    info!("🖼️  Starting Asset Studio v{}", env!("CARGO_PKG_VERSION"));
    info!("   Images: {}", images.len());
    info!("   Output: {:?}", config.export.output_dir);

    let analyzer = build_analyzer(&config.analysis, offline).map_err(|e| anyhow!(e.user_message()))?;
    let sequencer = ExportSequencer::from_config(&config).map_err(|e| anyhow!(e.user_message()))?;
    let studio = Studio::new(analyzer, sequencer, config.batch.clone()).spawn();

    // Ctrl-C aborts the running analysis or export
    {
        let studio = studio.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                studio.cancel();
            }
        });
    }

    // Echo progress as it changes
    {
        let mut progress = studio.subscribe_progress();
        tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let current = *progress.borrow_and_update();
                if let Some(current) = current {
                    info!("{}", current);
                }
            }
        });
    }

    info!("🔍 Step 1: Uploading and analyzing screenshots...");
    let mut files = Vec::with_capacity(images.len());
    for path in &images {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;
        files.push(UploadFile::new(path.display().to_string(), bytes));
    }

    let report = studio.upload(files).await?;
    for rejected in &report.rejected {
        warn!("Skipping {}: {}", rejected.name, rejected.reason);
    }
    if report.accepted.is_empty() {
        bail!("None of the {} images could be used", images.len());
    }

    // Map command-line positions to the ids of accepted images
    let positions: Vec<Option<&ItemId>> = report.ids_by_position(images.len());

    for (index, point) in focus {
        match positions.get(index - 1).copied().flatten() {
            Some(id) => studio.set_manual_focal_point(id, point).await?,
            None => warn!("--focus {}: no such accepted image", index),
        }
    }

    info!("📦 Step 2: Exporting {} formats per image...", CATALOG.len());
    let sink = Arc::new(DirectorySink::create(&config.export.output_dir).await?);
    let export = studio.export(style, adjustments, sink).await?;

    for item in studio.snapshot().items {
        info!(
            "   {} [{}] focal ({:.1}, {:.1}) from {:?}",
            item.name, item.status, item.focal_point.x, item.focal_point.y, item.focal_source
        );
    }

    if export.cancelled {
        bail!("Export cancelled after {} files", export.artifacts.len());
    }
    for failure in &export.failures {
        warn!("{}: {}", failure.name, failure.reason);
    }

    info!(
        "🎉 Export complete! Wrote {} files to {:?}",
        export.artifacts.len(),
        config.export.output_dir
    );
    Ok(())
}
