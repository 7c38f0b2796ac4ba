//! quadmark CLI: detect square fiducials, print the marker, render synthetic views.

use clap::{Args, Parser, Subcommand, ValueEnum};
use nalgebra::Vector3;
use quadmark::detect::{run_config, save_rgb, to_image_gray};
use quadmark::synth::render_view;
use quadmark::{BitMatrix, CameraIntrinsics, CameraProfile, DetectConfig, DetectorParams, Pose, SelectionPolicy};
use std::path::PathBuf;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "quadmark")]
#[command(about = "Detect a square bit-grid fiducial marker and estimate its pose")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines (requires the `tracing` feature).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the marker in an image and write a JSON report.
    Detect(DetectArgs),

    /// Render the printable reference marker as PNG.
    Print(PrintArgs),

    /// Render a synthetic camera view of the marker at a given pose.
    Synth(SynthArgs),

    /// Print the default detector parameters as JSON.
    Params {
        /// Write to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// JSON job description; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input image.
    #[arg(long, required_unless_present = "config")]
    image: Option<PathBuf>,

    /// Calibration JSON with `cameraMatrix` and `distCoeffs`.
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Report output path (default: quadmark_report.json).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write the frame with outlines and pose axes drawn on it.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Accept payloads within this Hamming distance of the reference.
    #[arg(long)]
    max_hamming: Option<u32>,

    /// Which decoded marker provides the frame pose.
    #[arg(long, value_enum)]
    selection: Option<SelectionArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SelectionArg {
    LargestArea,
    First,
    Last,
}

impl SelectionArg {
    fn to_core(self) -> SelectionPolicy {
        match self {
            Self::LargestArea => SelectionPolicy::LargestArea,
            Self::First => SelectionPolicy::First,
            Self::Last => SelectionPolicy::Last,
        }
    }
}

impl DetectArgs {
    fn to_config(&self) -> CliResult<DetectConfig> {
        let mut cfg = match &self.config {
            Some(path) => DetectConfig::load_json(path)?,
            None => DetectConfig::default(),
        };
        if let Some(image) = &self.image {
            cfg.image_path = image.display().to_string();
        }
        if let Some(cal) = &self.calibration {
            cfg.calibration_path = Some(cal.display().to_string());
        }
        if let Some(out) = &self.out {
            cfg.output_path = Some(out.display().to_string());
        }
        if let Some(overlay) = &self.overlay {
            cfg.overlay_path = Some(overlay.display().to_string());
        }
        if self.max_hamming.is_some() || self.selection.is_some() {
            let mut params = cfg.build_params();
            if let Some(h) = self.max_hamming {
                params.max_hamming = h;
            }
            if let Some(s) = self.selection {
                params.selection = s.to_core();
            }
            cfg.params = Some(params);
        }
        if cfg.image_path.is_empty() {
            return Err("no input image: pass --image or set image_path in --config".into());
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Args)]
struct PrintArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Cell size in pixels.
    #[arg(long, default_value_t = 40)]
    cell_px: usize,

    /// White quiet zone around the marker, in cells.
    #[arg(long, default_value_t = 1)]
    quiet_cells: usize,
}

#[derive(Debug, Clone, Args)]
struct SynthArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 640)]
    width: usize,

    #[arg(long, default_value_t = 480)]
    height: usize,

    /// Calibration JSON; the uncalibrated default camera otherwise.
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Marker translation in marker units (x y z).
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_hyphen_values = true,
          default_values_t = [-0.5, -0.5, 4.0])]
    tvec: Vec<f64>,

    /// Marker rotation vector in radians (x y z).
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_hyphen_values = true,
          default_values_t = [0.0, 0.0, 0.0])]
    rvec: Vec<f64>,

    /// Rotate the printed pattern clockwise by this many quarter turns.
    #[arg(long, default_value_t = 0)]
    turns: u8,
}

fn init_logging(verbose: u8, json: bool) {
    #[cfg(feature = "tracing")]
    {
        let _ = verbose;
        quadmark::core::init_tracing(json);
    }
    #[cfg(not(feature = "tracing"))]
    {
        if json {
            eprintln!("--log-json needs the `tracing` feature; using plain logs");
        }
        let _ = quadmark::core::init_with_level(quadmark::core::level_from_verbosity(verbose));
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Print(args) => run_print(&args),
        Commands::Synth(args) => run_synth(&args),
        Commands::Params { out } => run_params(out),
    }
}

// ── detect ─────────────────────────────────────────────────────────────

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let cfg = args.to_config()?;
    let report = run_config(&cfg)?;

    match report.error {
        None => {
            let t = report.pose.tvec;
            let r = report.pose.rvec;
            println!(
                "pose: rvec=[{:.4}, {:.4}, {:.4}] tvec=[{:.4}, {:.4}, {:.4}] ({} marker(s))",
                r.x,
                r.y,
                r.z,
                t.x,
                t.y,
                t.z,
                report.markers.len()
            );
        }
        Some(err) => println!("no pose: {err}"),
    }
    Ok(())
}

// ── print ──────────────────────────────────────────────────────────────

fn run_print(args: &PrintArgs) -> CliResult<()> {
    if args.cell_px == 0 {
        return Err("--cell-px must be positive".into());
    }
    let img = quadmark::code::render_marker(&BitMatrix::reference(), args.cell_px, args.quiet_cells);
    to_image_gray(&img)?.save(&args.out)?;
    log::info!(
        "marker {}x{} px written to {}",
        img.width,
        img.height,
        args.out.display()
    );
    Ok(())
}

// ── synth ──────────────────────────────────────────────────────────────

fn run_synth(args: &SynthArgs) -> CliResult<()> {
    let camera = match &args.calibration {
        Some(path) => CameraProfile::load_json(path)?.to_intrinsics()?,
        None => CameraIntrinsics::default_uncalibrated(),
    };
    let (Ok(rvec), Ok(tvec)) = (
        <[f64; 3]>::try_from(args.rvec.as_slice()),
        <[f64; 3]>::try_from(args.tvec.as_slice()),
    ) else {
        return Err("--rvec and --tvec take three values each".into());
    };
    let pose = Pose::new(Vector3::from(rvec), Vector3::from(tvec));
    let pattern = BitMatrix::reference().rotated(args.turns);

    let img = render_view(&pattern, &pose, &camera, args.width, args.height);
    save_rgb(&img, &args.out)?;
    log::info!("synthetic view written to {}", args.out.display());
    Ok(())
}

// ── params ─────────────────────────────────────────────────────────────

fn run_params(out: Option<PathBuf>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(&DetectorParams::default())?;
    match out {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
