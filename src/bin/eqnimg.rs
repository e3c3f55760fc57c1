/// Command-line interface for batch equation image generation.
///
/// Reads the equation list from a data directory, renders every equation at
/// every resolution tier and verifies that all images were written.
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use eqnimg::data::{EQN_DATA_FILE_NAME, VERSION_FILE_NAME};
use eqnimg::{
    check_data_dir, generate, load_equations, parse_color, verify_outputs, CropMode,
    MathJaxRenderer, RenderConfig, Tier,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "eqnimg")]
#[command(about = "Render TeX equations into cropped PNGs at multiple resolutions", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the data files, render every equation and verify the output
    Generate(GenerateArgs),
    /// Validate the data files only
    Check(DataArgs),
    /// Check that every expected image exists
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Directory containing equation_data.json and version.json
    #[arg(long, value_name = "DIR", default_value = "data")]
    data_dir: PathBuf,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Output directory, one subdirectory per tier
    #[arg(short, long, value_name = "DIR", default_value = "imgs")]
    out: PathBuf,

    /// Resolution tier as NAME=SCALE; repeat for several (default: Android densities)
    #[arg(long = "tier", value_name = "NAME=SCALE")]
    tiers: Vec<Tier>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    target: VerifyArgs,

    /// Font size in pixels at scale 1
    #[arg(long, default_value = "300")]
    font_size: f32,

    /// Margin around the content before cropping, in pixels
    #[arg(long, default_value = "16")]
    padding: u32,

    /// Text color (ARGB hex, e.g., 0xff000000 for black)
    #[arg(long, default_value = "0xff000000")]
    color: String,

    /// Fill the canvas with opaque white (use with --crop-mode non-white)
    #[arg(long)]
    background: bool,

    /// Which pixels count as content when cropping
    #[arg(long, value_enum, default_value_t = CropArg::Alpha)]
    crop_mode: CropArg,

    /// Pixels with alpha at or below this value are treated as blank
    #[arg(long, default_value = "0")]
    alpha_threshold: u8,

    /// Skip validation of the data files
    #[arg(long)]
    no_check: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CropArg {
    Alpha,
    NonWhite,
}

impl From<CropArg> for CropMode {
    fn from(arg: CropArg) -> Self {
        match arg {
            CropArg::Alpha => CropMode::Alpha,
            CropArg::NonWhite => CropMode::NonWhite,
        }
    }
}

impl VerifyArgs {
    fn tiers(&self) -> Vec<Tier> {
        if self.tiers.is_empty() {
            Tier::defaults()
        } else {
            self.tiers.clone()
        }
    }
}

impl GenerateArgs {
    fn render_config(&self) -> Result<RenderConfig, String> {
        Ok(RenderConfig {
            font_size: self.font_size,
            padding: self.padding,
            text_color: parse_color(&self.color)?,
            has_background: self.background,
            crop_mode: self.crop_mode.into(),
            alpha_threshold: self.alpha_threshold,
        })
    }
}

/// Runs the data checker and prints every issue. Returns `true` when valid.
fn run_check(args: &DataArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let report = check_data_dir(&args.data_dir)?;
    for issue in &report.issues {
        eprintln!("✗ {}", issue);
    }
    if report.is_valid() {
        eprintln!(
            "✓ {} and {} are valid ({} equations)",
            EQN_DATA_FILE_NAME, VERSION_FILE_NAME, report.equation_count
        );
    }
    Ok(report.is_valid())
}

/// Runs the verifier and prints every missing file. Returns `true` when complete.
fn run_verify(args: &VerifyArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let equations = load_equations(args.data.data_dir.join(EQN_DATA_FILE_NAME))?;
    let report = verify_outputs(&args.out, &args.tiers(), &equations);
    for path in &report.missing {
        eprintln!("✗ missing {}", path.display());
    }
    if report.is_complete() {
        eprintln!("✓ all {} images present", report.checked);
    }
    Ok(report.is_complete())
}

fn run_generate(args: &GenerateArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let config = args.render_config()?;

    if !args.no_check && !run_check(&args.target.data)? {
        return Ok(false);
    }

    let equations = load_equations(args.target.data.data_dir.join(EQN_DATA_FILE_NAME))?;
    let tiers = args.target.tiers();

    eprintln!(
        "Rendering {} equations at {} tiers...",
        equations.len(),
        tiers.len()
    );
    let renderer = MathJaxRenderer::new()?;
    let report = generate(&equations, &tiers, &config, &renderer, &args.target.out)?;

    for tier in &report.tiers {
        for failure in &tier.failed {
            eprintln!("✗ [{}] {}: {}", tier.tier, failure.image_key, failure.error);
        }
    }
    eprintln!(
        "Results: {} generated, {} failed",
        report.generated(),
        report.failed()
    );

    run_verify(&args.target)
}

fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Check(args) => run_check(args),
        Command::Verify(args) => run_verify(args),
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .ok();

    if run(&cli)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
