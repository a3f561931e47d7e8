//! persp - perspective projection of one image onto another
//!
//! Places a source image on a 3D plane in front of a pinhole camera and
//! composites its projection onto a reference canvas.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use persp_ops::{BackendChoice, Quality};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "persp")]
#[command(author, version, about = "Project an image onto a canvas through a 3D camera")]
#[command(long_about = "
Projects a source image placed on a plane in 3D space onto a reference
canvas through a pinhole camera and composites the result.

Examples:
  persp project card.png table.png -o out.png --yaw 20 --pitch -10
  persp project card.png table.png -o out.png --distance 1500 --scale 80
  persp project card.png table.png -o out.png --backend threaded -j 8
  persp project card.png table.png -o out.png --params shot.yaml --roll 5
  persp backends                       # List execution backends
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Project SRC onto REF and write the composite
    #[command(visible_alias = "p")]
    Project(ProjectArgs),

    /// List execution backends and their availability
    #[command(visible_alias = "b")]
    Backends,
}

/// Flags given here override values loaded with `--params`.
#[derive(Args)]
pub struct ProjectArgs {
    /// Source image placed on the plane
    pub source: PathBuf,

    /// Reference canvas
    pub reference: PathBuf,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// YAML parameter file
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Rotation about X in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub pitch: Option<f64>,

    /// Rotation about Y in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub yaw: Option<f64>,

    /// Rotation about Z in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub roll: Option<f64>,

    /// Horizontal translation in pixels
    #[arg(long, allow_negative_numbers = true)]
    pub tx: Option<f64>,

    /// Vertical translation in pixels
    #[arg(long, allow_negative_numbers = true)]
    pub ty: Option<f64>,

    /// Camera distance in pixels (1000 = unit magnification)
    #[arg(short, long)]
    pub distance: Option<f64>,

    /// Plane scale in percent
    #[arg(short, long)]
    pub scale: Option<f64>,

    /// Backend: serial, threaded, gpu
    #[arg(short, long)]
    pub backend: Option<BackendChoice>,

    /// Worker threads for the threaded backend
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Interpolation: speed, balanced, quality
    #[arg(short, long)]
    pub quality: Option<Quality>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Project(args) => commands::project::run(args, cli.verbose),
        Commands::Backends => commands::backends::run(cli.verbose),
    }
}
