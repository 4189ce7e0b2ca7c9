//! stl-quote: price a 3D print from an STL file.
//!
//! # Logging
//!
//! Logs go to stderr. `RUST_LOG` takes precedence over `-v`:
//! - `-v` info from the quote crates
//! - `-vv` debug
//! - `-vvv` trace for everything
//!
//! # Example
//!
//! ```bash
//! stl-quote part.stl --material PETG --color "#ff3b3b" --infill 30 --qty 4
//! stl-quote part.stl --format json --preview part.svg
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use preview_render::{PreviewScene, SvgBackend};
use quote_types::{Material, Platform, PricingSelection};
use quote_worker::{QuoteConfig, QuoteSession, SessionState};
use stl_mesh::{export_binary_stl, load_stl, ComplexityLimits};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod messages;
mod report;

use report::{ErrorReport, QuoteReport};

/// stl-quote - estimate filament weight and price for an STL print.
#[derive(Parser)]
#[command(name = "stl-quote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input STL file
    input: PathBuf,

    /// Filament material (PLA, ABS, PETG, ASA)
    #[arg(long, short, default_value = "PLA")]
    material: Material,

    /// Filament color as #rrggbb
    #[arg(long, short, default_value = "#000000")]
    color: String,

    /// Infill percentage (clamped to 10-50)
    #[arg(long, short, default_value = "20")]
    infill: u32,

    /// Number of copies
    #[arg(long, short, default_value = "1")]
    qty: u32,

    /// Complexity ceiling to apply
    #[arg(long, default_value = "desktop")]
    platform: PlatformArg,

    /// JSON config overriding pricing, upload and worker settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Write an SVG preview of the model on the print bed
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Write the horizontally centered, bed-placed mesh as binary STL
    #[arg(long)]
    export_centered: Option<PathBuf>,

    /// Give up on the parse after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    Desktop,
    Mobile,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Desktop => Platform::Desktop,
            PlatformArg::Mobile => Platform::Mobile,
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "stl_mesh=info,mesh_metrics=info,pricing=info,quote_worker=info,preview_render=info",
            2 => "stl_mesh=debug,mesh_metrics=debug,pricing=debug,quote_worker=debug,preview_render=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<QuoteConfig> {
    let mut config = match &cli.config {
        Some(path) => QuoteConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => QuoteConfig::default(),
    };
    if let Some(secs) = cli.timeout_secs {
        config.worker.timeout_secs = secs.max(1);
    }
    Ok(config)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let currency = config.pricing.currency.clone();
    let platform = Platform::from(cli.platform);
    let limits = config.worker.limits_for(platform);

    let file_name = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.input.display().to_string());
    let size = input_size(&cli.input)?;

    let mut session = QuoteSession::new(config, platform);
    session.set_selection(PricingSelection {
        material: cli.material,
        color_hex: cli.color.clone(),
        infill_percent: cli.infill,
        quantity: cli.qty,
    });

    if session
        .accept_file(&file_name, size, &cli.input.display().to_string())
        .is_ok()
    {
        session.wait();
    }

    let report = QuoteReport {
        file: file_name,
        platform,
        selection: session.selection().clone(),
        metrics: session.metrics().copied(),
        bounds: session.bounds().copied(),
        price: *session.pricing(),
        currency,
        error: session.error_code().map(ErrorReport::from),
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{}", report.to_text()),
    }

    if let SessionState::Ready { .. } = session.state() {
        if let Some(out) = &cli.preview {
            write_preview(&cli.input, out, &cli.color, platform, limits)?;
        }
        if let Some(out) = &cli.export_centered {
            write_centered(&cli.input, out, limits)?;
        }
    }

    if report.error.is_some() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn input_size(path: &Path) -> Result<u64> {
    let meta =
        std::fs::metadata(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(meta.len())
}

fn write_preview(
    input: &Path,
    out: &Path,
    color: &str,
    platform: Platform,
    limits: ComplexityLimits,
) -> Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let mut scene =
        PreviewScene::new(SvgBackend::new(800.0, 600.0), platform).with_limits(limits);
    scene
        .set_color(color)
        .with_context(|| format!("Invalid preview color {color}"))?;
    scene.load_model(&bytes).context("Failed to load preview model")?;
    let svg = scene.render().context("Failed to render preview")?;
    std::fs::write(out, svg).with_context(|| format!("Failed to write {}", out.display()))?;
    info!(path = %out.display(), "wrote preview");
    Ok(())
}

fn write_centered(input: &Path, out: &Path, limits: ComplexityLimits) -> Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let mut loaded = load_stl(&bytes, &limits)
        .context("Failed to load model for export")?;
    loaded.place_on_bed();
    let name = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stl = export_binary_stl(&loaded.mesh, &name).context("Failed to export STL")?;
    std::fs::write(out, stl).with_context(|| format!("Failed to write {}", out.display()))?;
    info!(path = %out.display(), "wrote centered STL");
    Ok(())
}
