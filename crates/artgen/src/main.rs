//! Art gallery generator for the nice!view display.
//!
//! Scans an art folder, renames images into the `image<N>` numbering
//! convention, converts each one to packed 1-bit data via the
//! bitmap-pipeline crate, and emits an LVGL C source file plus byte-accurate
//! preview PNGs. The `compare` subcommand renders every scaling x dither
//! combination of the first image instead.

use std::path::PathBuf;

use bitmap_pipeline::{DitherMethod, ProcessingConfig, ScalingMethod};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cgen;
mod gallery;
mod preview;

const DEFAULT_OUTPUT: &str = "./boards/shields/nice_view_custom/widgets/art.c";
const DEFAULT_WIDGET: &str = "./boards/shields/nice_view_custom/widgets/peripheral_status.c";

#[derive(Parser)]
#[command(name = "artgen")]
#[command(about = "Generate 1-bit LVGL art arrays for the nice!view display")]
struct Cli {
    /// Folder containing source images
    #[arg(long, default_value = "./art")]
    art_dir: PathBuf,

    /// Scaling method: adaptive, edge_preserving, content_aware, area_sampling
    #[arg(long, default_value = "content_aware")]
    scaling: ScalingMethod,

    /// Dither method: error_diffusion, floyd_steinberg, threshold_adaptive
    #[arg(long, default_value = "error_diffusion")]
    dither: DitherMethod,

    /// Squash images to the display size instead of letterboxing
    #[arg(long)]
    ignore_aspect_ratio: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the art C file and previews (the default)
    Generate {
        /// Generated C file path
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Widget source whose LV_IMG_DECLARE block gets rewritten
        #[arg(long, default_value = DEFAULT_WIDGET)]
        widget: PathBuf,

        /// Skip writing byte-accurate preview PNGs
        #[arg(long)]
        no_previews: bool,
    },
    /// Render every scaling x dither combination of the first image
    Compare,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ProcessingConfig {
        scaling: cli.scaling,
        dither: cli.dither,
        maintain_aspect_ratio: !cli.ignore_aspect_ratio,
    };

    match cli.command.unwrap_or(Commands::Generate {
        output: PathBuf::from(DEFAULT_OUTPUT),
        widget: PathBuf::from(DEFAULT_WIDGET),
        no_previews: false,
    }) {
        Commands::Generate {
            output,
            widget,
            no_previews,
        } => gallery::generate(&cli.art_dir, &output, &widget, !no_previews, &config),
        Commands::Compare => gallery::compare_methods(&cli.art_dir),
    }
}
