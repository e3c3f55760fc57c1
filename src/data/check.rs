//! Structural validation of the data directory.
//!
//! The consuming application reads `equation_data.json` with a stricter
//! schema than the renderer needs, so the whole document is checked here
//! before any image is produced.

use super::{read_to_string, DataError, EQN_DATA_FILE_NAME, VERSION_FILE_NAME};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

const VERSION_KEY: &str = "version";
const EQUATIONS_KEY: &str = "equations";
const NAME_KEY: &str = "name";
const CATEGORY_KEY: &str = "category";
const IMAGE_KEY: &str = "image_key";
const TEX_KEY: &str = "tex";
const KEYWORDS_KEY: &str = "keywords";
const VARIABLES_KEY: &str = "variables";
const SYMBOL_KEY: &str = "symbol";
const EXPRESSION_KEY: &str = "expression";

/// A content problem found in one of the data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// File the problem was found in.
    pub file: &'static str,
    /// Location inside the document, e.g. `/equations/3/keywords/0`.
    pub pointer: String,
    /// What is wrong.
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}: {}", self.file, self.pointer, self.message)
    }
}

/// Outcome of [`check_data_dir`].
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Data directory that was checked.
    pub data_dir: PathBuf,
    /// Version number found in `version.json`, if valid.
    pub version: Option<i64>,
    /// Number of entries in the `equations` array.
    pub equation_count: usize,
    /// Every problem found, in document order.
    pub issues: Vec<Issue>,
}

impl CheckReport {
    /// `true` when no issue was found.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

struct Collector {
    file: &'static str,
    issues: Vec<Issue>,
}

impl Collector {
    fn new(file: &'static str) -> Self {
        Self {
            file,
            issues: Vec::new(),
        }
    }

    fn push(&mut self, pointer: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue {
            file: self.file,
            pointer: pointer.into(),
            message: message.into(),
        });
    }

    fn require_string<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        at: &str,
        key: &str,
    ) -> Option<&'a str> {
        match obj.get(key) {
            None => {
                self.push(at, format!("missing '{}'", key));
                None
            }
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                self.push(format!("{}/{}", at, key), "is not a string");
                None
            }
        }
    }

    fn require_array<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        at: &str,
        key: &str,
    ) -> Option<&'a Vec<Value>> {
        match obj.get(key) {
            None => {
                self.push(at, format!("missing '{}'", key));
                None
            }
            Some(Value::Array(items)) => Some(items),
            Some(_) => {
                self.push(format!("{}/{}", at, key), "is not an array");
                None
            }
        }
    }
}

/// Validates the data directory.
///
/// Structural failures that prevent reading the files (missing directory or
/// file, unparsable JSON) are returned as errors. Content problems are all
/// collected into the report.
///
/// # Example
///
/// ```rust,no_run
/// use eqnimg::data::check::check_data_dir;
///
/// let report = check_data_dir("data")?;
/// for issue in &report.issues {
///     eprintln!("{}", issue);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn check_data_dir(data_dir: impl AsRef<Path>) -> Result<CheckReport, DataError> {
    let data_dir = data_dir.as_ref();
    if !data_dir.is_dir() {
        return Err(DataError::MissingDir(data_dir.to_path_buf()));
    }

    let eqn_path = data_dir.join(EQN_DATA_FILE_NAME);
    let version_path = data_dir.join(VERSION_FILE_NAME);
    // Both files must exist before either is parsed.
    for path in [&eqn_path, &version_path] {
        if !path.is_file() {
            return Err(DataError::MissingFile(path.clone()));
        }
    }

    let version_doc = parse_value(&version_path)?;
    let eqn_doc = parse_value(&eqn_path)?;

    let mut report = CheckReport {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };

    let mut version_issues = Collector::new(VERSION_FILE_NAME);
    report.version = check_version(&version_doc, &mut version_issues);

    let mut eqn_issues = Collector::new(EQN_DATA_FILE_NAME);
    report.equation_count = check_equation_data(&eqn_doc, &mut eqn_issues);

    report.issues = version_issues.issues;
    report.issues.extend(eqn_issues.issues);

    if report.is_valid() {
        log::info!(
            "data in {} is valid (version {:?}, {} equations)",
            data_dir.display(),
            report.version,
            report.equation_count
        );
    } else {
        log::warn!(
            "data in {} has {} issue(s)",
            data_dir.display(),
            report.issues.len()
        );
    }

    Ok(report)
}

fn parse_value(path: &Path) -> Result<Value, DataError> {
    let content = read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| DataError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn check_version(doc: &Value, out: &mut Collector) -> Option<i64> {
    let Some(obj) = doc.as_object() else {
        out.push("", "version data is not an object");
        return None;
    };
    match obj.get(VERSION_KEY) {
        None => {
            out.push("", "version data does not contain version");
            None
        }
        Some(v) => match version_number(v) {
            Some(n) => Some(n),
            None => {
                out.push(format!("/{}", VERSION_KEY), "version is not an integer");
                None
            }
        },
    }
}

/// Integer value of `v`, accepting whole floats such as `1.0`.
fn version_number(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    let f = v.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn check_equation_data(doc: &Value, out: &mut Collector) -> usize {
    let Some(obj) = doc.as_object() else {
        out.push("", "equation data is not an object");
        return 0;
    };
    let Some(equations) = out.require_array(obj, "", EQUATIONS_KEY) else {
        return 0;
    };

    let mut seen_keys = HashSet::new();
    for (i, eqn) in equations.iter().enumerate() {
        let at = format!("/{}/{}", EQUATIONS_KEY, i);
        let Some(eqn) = eqn.as_object() else {
            out.push(at, "equation is not an object");
            continue;
        };
        check_equation(eqn, &at, out, &mut seen_keys);
    }
    equations.len()
}

fn check_equation<'a>(
    eqn: &'a Map<String, Value>,
    at: &str,
    out: &mut Collector,
    seen_keys: &mut HashSet<&'a str>,
) {
    out.require_string(eqn, at, NAME_KEY);
    out.require_string(eqn, at, CATEGORY_KEY);
    out.require_string(eqn, at, TEX_KEY);

    if let Some(key) = out.require_string(eqn, at, IMAGE_KEY) {
        if !super::is_valid_key(key) {
            out.push(
                format!("{}/{}", at, IMAGE_KEY),
                format!("{:?} cannot be used as a file name", key),
            );
        } else if !seen_keys.insert(key) {
            out.push(
                format!("{}/{}", at, IMAGE_KEY),
                format!("duplicate image key {:?}", key),
            );
        }
    }

    if let Some(keywords) = out.require_array(eqn, at, KEYWORDS_KEY) {
        for (k, keyword) in keywords.iter().enumerate() {
            if !keyword.is_string() {
                out.push(
                    format!("{}/{}/{}", at, KEYWORDS_KEY, k),
                    "keyword is not a string",
                );
            }
        }
    }

    if let Some(variables) = out.require_array(eqn, at, VARIABLES_KEY) {
        for (v, var) in variables.iter().enumerate() {
            let var_at = format!("{}/{}/{}", at, VARIABLES_KEY, v);
            match var.as_object() {
                Some(var) => {
                    out.require_string(var, &var_at, NAME_KEY);
                    out.require_string(var, &var_at, SYMBOL_KEY);
                    out.require_string(var, &var_at, EXPRESSION_KEY);
                }
                None => out.push(var_at, "variable is not an object"),
            }
        }
    }
}
