#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![allow(rustdoc::invalid_codeblock_attributes)]

pub mod crop;
pub mod data;
pub mod pipeline;
pub mod render;
pub mod tier;
pub mod verify;

pub use crop::{content_bounds, crop_file, crop_to_content, Bounds, CropError, CropMode};
pub use data::check::{check_data_dir, CheckReport, Issue};
pub use data::{load_equations, DataError, Equation, Variable};
pub use pipeline::{generate, prepare_dirs, GenerateReport, PipelineError, TierReport};
pub use render::{
    parse_color, rasterize, EquationRenderer, MathJaxRenderer, RenderConfig, RenderError,
};
pub use tier::{validate_tiers, Tier, TierError};
pub use verify::{verify_outputs, VerifyReport};
