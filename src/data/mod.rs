//! Equation list loading.
//!
//! The equation list is a JSON document shared with the application that
//! consumes the generated images. Only `image_key` and `tex` matter for
//! rendering; the descriptive fields are carried along so the same types can
//! be reused by tooling that inspects the list.

pub mod check;

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default directory holding the data files.
pub const DEFAULT_DATA_DIR: &str = "data";
/// File name of the equation list inside the data directory.
pub const EQN_DATA_FILE_NAME: &str = "equation_data.json";
/// File name of the version marker inside the data directory.
pub const VERSION_FILE_NAME: &str = "version.json";

/// Errors raised while reading the data files.
#[derive(Error, Debug)]
pub enum DataError {
    /// The data directory does not exist or is not a directory.
    #[error("data directory does not exist: {0}")]
    MissingDir(PathBuf),

    /// A required data file is absent.
    #[error("data file does not exist: {0}")]
    MissingFile(PathBuf),

    /// Reading a data file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A data file is not valid JSON, or does not have the expected shape.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// File being parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// An image key cannot be used as an output file name.
    #[error("invalid image key {key:?} at equation #{index}")]
    InvalidKey {
        /// Position of the equation in the list.
        index: usize,
        /// Offending key.
        key: String,
    },

    /// Two equations share an image key and would write the same file.
    #[error("duplicate image key {key:?} at equation #{index}")]
    DuplicateKey {
        /// Position of the second occurrence.
        index: usize,
        /// Repeated key.
        key: String,
    },
}

/// A variable appearing in an equation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Variable {
    /// Human readable name ("velocity").
    pub name: String,
    /// Symbol as written in the equation ("v").
    pub symbol: String,
    /// Expression solving the equation for this variable.
    pub expression: String,
}

/// One entry of the equation list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Equation {
    /// Identifier used as the output file stem (`<image_key>.png`).
    pub image_key: String,
    /// TeX markup, without math delimiters.
    pub tex: String,
    /// Display name ("Ohm's Law").
    #[serde(default)]
    pub name: String,
    /// Grouping shown by the consuming app ("Electricity").
    #[serde(default)]
    pub category: String,
    /// Search terms.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Variables the equation can be solved for.
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl Equation {
    /// Builds an entry with only the fields needed for rendering.
    pub fn new(image_key: impl Into<String>, tex: impl Into<String>) -> Self {
        Self {
            image_key: image_key.into(),
            tex: tex.into(),
            name: String::new(),
            category: String::new(),
            keywords: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// File name of the rendered image.
    pub fn file_name(&self) -> String {
        format!("{}.png", self.image_key)
    }
}

#[derive(Deserialize)]
struct EquationFile {
    equations: Vec<Equation>,
}

/// Returns `true` when `key` can be used verbatim as a file stem.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\', '\0'])
}

/// Parses an equation list from a JSON string.
///
/// `origin` is only used for error messages. Keys must be usable as file
/// names and unique within the list.
pub fn parse_equations(json: &str, origin: &Path) -> Result<Vec<Equation>, DataError> {
    let file: EquationFile = serde_json::from_str(json).map_err(|source| DataError::Json {
        path: origin.to_path_buf(),
        source,
    })?;

    let mut seen = HashSet::new();
    for (index, eqn) in file.equations.iter().enumerate() {
        if !is_valid_key(&eqn.image_key) {
            return Err(DataError::InvalidKey {
                index,
                key: eqn.image_key.clone(),
            });
        }
        if !seen.insert(eqn.image_key.as_str()) {
            return Err(DataError::DuplicateKey {
                index,
                key: eqn.image_key.clone(),
            });
        }
    }

    Ok(file.equations)
}

/// Loads the equation list from `path`, keeping file order.
///
/// # Example
///
/// ```rust,no_run
/// use eqnimg::data::load_equations;
///
/// let equations = load_equations("data/equation_data.json")?;
/// for eqn in &equations {
///     println!("{} -> {}", eqn.image_key, eqn.tex);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn load_equations(path: impl AsRef<Path>) -> Result<Vec<Equation>, DataError> {
    let path = path.as_ref();
    let json = read_to_string(path)?;
    let equations = parse_equations(&json, path)?;
    log::debug!("loaded {} equations from {}", equations.len(), path.display());
    Ok(equations)
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, DataError> {
    if !path.is_file() {
        return Err(DataError::MissingFile(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}
