//! Detector Constellation CLI
//!
//! Generates the detector layout for a constellation and optionally plots
//! the detector pointings.
//!
//! Usage:
//!   generate-constellation --mask 111111110000000011111111 \
//!                          --sides +x,-x,+z \
//!                          --area 1000 \
//!                          --output detectors.json \
//!                          --plot pointings.svg

use anyhow::{Context, Result};
use clap::Parser;
use detector_constellation::{GeneratorConfig, Mask, PlotStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    name = "generate-constellation",
    about = "Generate detector locations and pointings for a satellite constellation"
)]
struct Args {
    /// JSON config file (CLI flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Slot table JSON file (defaults to the bundled Galileo table)
    #[arg(short, long)]
    table: Option<PathBuf>,

    /// Active slots as a 0/1 string, or "all"
    #[arg(short, long)]
    mask: Option<String>,

    /// Comma separated detector sides, e.g. "+x,-x,+z"
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    sides: Option<Vec<String>>,

    /// Detector effective area
    #[arg(short, long)]
    area: Option<f64>,

    /// Detector background rate (default: 4 x area)
    #[arg(short, long)]
    bkg_rate: Option<f64>,

    /// Output JSON file for the detectors
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a sky plot of the pointings (.svg or .png)
    #[arg(short, long)]
    plot: Option<PathBuf>,

    /// Marker radius in the sky plot (pixels)
    #[arg(long, default_value_t = 5)]
    marker_size: u32,

    /// Write the slot table in use to a JSON file
    #[arg(long)]
    export_table: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("Detector Constellation Generator");
    info!("{}", "=".repeat(60));

    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("loading config {:?}", path))?,
        None => GeneratorConfig::default(),
    };

    if let Some(table) = args.table {
        config.table = Some(table);
    }
    if let Some(sides) = args.sides {
        config.sides = sides;
    }
    if let Some(area) = args.area {
        config.effective_area = area;
    }
    if args.bkg_rate.is_some() {
        config.background_rate = args.bkg_rate;
    }

    let table = config.load_table().context("loading slot table")?;
    info!(
        "Slot table: {} ({} slots)",
        table.name().unwrap_or("unnamed"),
        table.len()
    );

    if let Some(mask) = &args.mask {
        config.mask = if mask.eq_ignore_ascii_case("all") {
            Mask::all(table.len())
        } else {
            mask.parse().context("parsing --mask")?
        };
    }

    let generator = config.build(&table)?;

    info!("\n{:<20} {:>9} {:>9} {:>10} {:>9} {:>9}", "detector", "ra", "dec", "alt [km]", "point ra", "point dec");
    for det in generator.constellation().detectors() {
        info!(
            "{:<20} {:>9.3} {:>9.3} {:>10.1} {:>9.3} {:>9.3}",
            det.name(),
            det.location.ra_deg,
            det.location.dec_deg,
            det.location.altitude_km,
            det.pointing.ra_deg,
            det.pointing.dec_deg
        );
    }

    if let Some(path) = &args.output {
        info!("\nWriting detectors to {:?}", path);
        let file = File::create(path)?;
        generator.to_json_writer(BufWriter::new(file))?;
    }

    if let Some(path) = &args.export_table {
        info!("Writing slot table to {:?}", path);
        table.save_json(path)?;
    }

    if let Some(path) = &args.plot {
        let style = PlotStyle {
            marker_size: args.marker_size,
            ..PlotStyle::default()
        };
        generator
            .plot_detector_pointings()?
            .with_style(style)
            .save(path)?;
    }

    // Summary
    info!("\n{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Detectors:       {}", generator.len());
    info!("Active slots:    {}", generator.mask().active_count());
    info!(
        "Sides:           {}",
        generator
            .sides()
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("Effective area:  {}", generator.effective_area());
    info!("Background rate: {}", generator.background_rate());

    Ok(())
}
