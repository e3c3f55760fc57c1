//! Batch generation: one worker thread per resolution tier.
//!
//! Workers share nothing but read-only inputs. Each owns a temporary
//! directory holding the oversized raster of the equation in flight, which
//! is cropped into `<out>/<tier>/<image_key>.png`. A failed equation is
//! logged and skipped; [`crate::verify`] reports the gap afterwards.

use crate::crop::{crop_file, CropError};
use crate::data::Equation;
use crate::render::{rasterize, write_png, EquationRenderer, RenderConfig, RenderError};
use crate::tier::{validate_tiers, Tier, TierError};
use crate::verify::output_path;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use thiserror::Error;

/// Name of the per-worker scratch raster.
const TMP_FILE_NAME: &str = "tmp.png";

/// Errors that abort a whole generation run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The tier list is unusable.
    #[error(transparent)]
    Tier(#[from] TierError),

    /// An output directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// Directory being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A worker's temporary directory could not be created.
    #[error("failed to create temporary directory for tier {tier:?}: {source}")]
    TempDir {
        /// Tier of the worker.
        tier: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A worker thread could not be started.
    #[error("failed to spawn worker for tier {tier:?}: {source}")]
    Spawn {
        /// Tier of the worker.
        tier: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked.
    #[error("worker for tier {0:?} panicked")]
    WorkerPanicked(String),
}

/// Errors for a single equation in a single tier.
#[derive(Error, Debug)]
pub enum EquationError {
    /// Rendering or rasterizing failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Cropping failed.
    #[error(transparent)]
    Crop(#[from] CropError),
}

/// An equation that could not be produced in some tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Key of the equation.
    pub image_key: String,
    /// Rendered error message.
    pub error: String,
}

/// Outcome of one tier's worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierReport {
    /// Tier name.
    pub tier: String,
    /// Number of images written.
    pub generated: usize,
    /// Equations that failed, in list order.
    pub failed: Vec<Failure>,
}

/// Outcome of [`generate`], one entry per tier in tier order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// Per-tier outcomes.
    pub tiers: Vec<TierReport>,
}

impl GenerateReport {
    /// Total number of images written.
    pub fn generated(&self) -> usize {
        self.tiers.iter().map(|t| t.generated).sum()
    }

    /// Total number of failed (tier, equation) pairs.
    pub fn failed(&self) -> usize {
        self.tiers.iter().map(|t| t.failed.len()).sum()
    }
}

/// Creates `<out_dir>/<tier>` for every tier. Existing directories and
/// their contents are left alone.
pub fn prepare_dirs(out_dir: &Path, tiers: &[Tier]) -> Result<(), PipelineError> {
    for tier in tiers {
        let path = out_dir.join(&tier.name);
        fs::create_dir_all(&path).map_err(|source| PipelineError::CreateDir {
            path: path.clone(),
            source,
        })?;
        log::debug!("prepared {}", path.display());
    }
    Ok(())
}

/// Renders one equation at one tier: markup to SVG, SVG to an oversized
/// raster at `tmp_path`, raster cropped into `out_path`.
///
/// Returns the size of the cropped image.
pub fn render_equation(
    eqn: &Equation,
    tier: &Tier,
    config: &RenderConfig,
    renderer: &dyn EquationRenderer,
    tmp_path: &Path,
    out_path: &Path,
) -> Result<(u32, u32), EquationError> {
    let svg = renderer.render_svg(&eqn.tex)?;
    let pixmap = rasterize(&svg, tier.scale, config)?;
    write_png(&pixmap, tmp_path)?;
    let size = crop_file(tmp_path, out_path, config.crop_mode, config.alpha_threshold)?;
    Ok(size)
}

fn run_worker(
    tier: &Tier,
    equations: &[Equation],
    config: &RenderConfig,
    renderer: &dyn EquationRenderer,
    out_dir: &Path,
) -> Result<TierReport, PipelineError> {
    let tmp_dir = tempfile::Builder::new()
        .prefix(&format!("eqnimg-{}-", tier.name))
        .tempdir()
        .map_err(|source| PipelineError::TempDir {
            tier: tier.name.clone(),
            source,
        })?;
    let tmp_path = tmp_dir.path().join(TMP_FILE_NAME);

    let mut report = TierReport {
        tier: tier.name.clone(),
        generated: 0,
        failed: Vec::new(),
    };

    for eqn in equations {
        let out_path = output_path(out_dir, tier, eqn);
        match render_equation(eqn, tier, config, renderer, &tmp_path, &out_path) {
            Ok((width, height)) => {
                report.generated += 1;
                log::info!(
                    "[{}] Generated img {} ({}x{})",
                    tier.name,
                    eqn.file_name(),
                    width,
                    height
                );
            }
            Err(e) => {
                log::error!("[{}] failed to generate {}: {}", tier.name, eqn.file_name(), e);
                // A stale image from an earlier run must not pass verification.
                if out_path.exists() {
                    if let Err(rm) = fs::remove_file(&out_path) {
                        log::warn!("failed to remove stale {}: {}", out_path.display(), rm);
                    }
                }
                report.failed.push(Failure {
                    image_key: eqn.image_key.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if let Err(e) = tmp_dir.close() {
        log::warn!("[{}] failed to remove temporary directory: {}", tier.name, e);
    }
    Ok(report)
}

/// Renders every equation at every tier into `out_dir`.
///
/// Tiers are validated and their directories created first, then one
/// thread per tier processes the whole list in order. Per-equation failures
/// are recorded in the report; only setup failures and worker panics abort
/// the run.
///
/// Renderers with process-wide setup, such as [`crate::MathJaxRenderer`],
/// must be fully constructed before this is called.
///
/// # Example
///
/// ```rust,no_run
/// use eqnimg::{generate, Equation, MathJaxRenderer, RenderConfig, Tier};
/// use std::path::Path;
///
/// let equations = vec![Equation::new("pythagoras", "a^2 + b^2 = c^2")];
/// let report = generate(
///     &equations,
///     &Tier::defaults(),
///     &RenderConfig::default(),
///     &MathJaxRenderer::new()?,
///     Path::new("imgs"),
/// )?;
/// assert_eq!(report.failed(), 0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn generate(
    equations: &[Equation],
    tiers: &[Tier],
    config: &RenderConfig,
    renderer: &dyn EquationRenderer,
    out_dir: &Path,
) -> Result<GenerateReport, PipelineError> {
    validate_tiers(tiers)?;
    prepare_dirs(out_dir, tiers)?;

    log::info!(
        "rendering {} equations into {} tiers under {}",
        equations.len(),
        tiers.len(),
        out_dir.display()
    );

    let results: Vec<Result<TierReport, PipelineError>> = thread::scope(|scope| {
        let handles: Vec<_> = tiers
            .iter()
            .map(|tier| {
                let handle = thread::Builder::new()
                    .name(format!("render-{}", tier.name))
                    .spawn_scoped(scope, move || {
                        run_worker(tier, equations, config, renderer, out_dir)
                    });
                (tier, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(tier, handle)| match handle {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(PipelineError::WorkerPanicked(tier.name.clone()))),
                Err(source) => Err(PipelineError::Spawn {
                    tier: tier.name.clone(),
                    source,
                }),
            })
            .collect()
    });

    let tiers = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    Ok(GenerateReport { tiers })
}
