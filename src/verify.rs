//! Post-run output verification.

use crate::data::Equation;
use crate::tier::Tier;
use std::path::{Path, PathBuf};

/// Outcome of [`verify_outputs`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifyReport {
    /// Number of expected files examined.
    pub checked: usize,
    /// Expected files that are absent, not regular files, or empty.
    pub missing: Vec<PathBuf>,
}

impl VerifyReport {
    /// `true` when every expected file is present.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Path of the image for `eqn` in `tier` under `out_dir`.
pub fn output_path(out_dir: &Path, tier: &Tier, eqn: &Equation) -> PathBuf {
    out_dir.join(&tier.name).join(eqn.file_name())
}

/// Checks that `<out_dir>/<tier>/<image_key>.png` exists for every tier and
/// equation.
///
/// Missing files are reported in tier order, then equation order.
pub fn verify_outputs(out_dir: &Path, tiers: &[Tier], equations: &[Equation]) -> VerifyReport {
    let mut report = VerifyReport::default();
    for tier in tiers {
        for eqn in equations {
            let path = output_path(out_dir, tier, eqn);
            report.checked += 1;
            let present = path
                .metadata()
                .map(|meta| meta.is_file() && meta.len() > 0)
                .unwrap_or(false);
            if !present {
                log::warn!("missing output {}", path.display());
                report.missing.push(path);
            }
        }
    }
    if report.is_complete() {
        log::info!("verified {} output files", report.checked);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_reports_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let tiers = vec![Tier::new("a", 1.0).unwrap(), Tier::new("b", 2.0).unwrap()];
        let eqns = vec![Equation::new("one", "1"), Equation::new("two", "2")];

        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/one.png"), b"png").unwrap();
        fs::write(dir.path().join("a/two.png"), b"png").unwrap();
        fs::create_dir_all(dir.path().join("b/one.png")).unwrap();
        fs::write(dir.path().join("b/two.png"), b"").unwrap();

        let report = verify_outputs(dir.path(), &tiers, &eqns);
        assert_eq!(report.checked, 4);
        assert_eq!(
            report.missing,
            vec![dir.path().join("b/one.png"), dir.path().join("b/two.png")]
        );
        assert!(!report.is_complete());
    }

    #[test]
    fn test_complete() {
        let dir = tempfile::tempdir().unwrap();
        let tiers = vec![Tier::new("mdpi", 1.0).unwrap()];
        let eqns = vec![Equation::new("k", "x")];
        fs::create_dir_all(dir.path().join("mdpi")).unwrap();
        fs::write(dir.path().join("mdpi/k.png"), b"png").unwrap();
        assert!(verify_outputs(dir.path(), &tiers, &eqns).is_complete());
    }

    #[test]
    fn test_no_equations_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let report = verify_outputs(dir.path(), &Tier::defaults(), &[]);
        assert_eq!(report, VerifyReport::default());
    }
}
