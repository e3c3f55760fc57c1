/// Integration tests for the generation pipeline.
///
/// A fixed-SVG renderer stands in for MathJax so these tests exercise data
/// loading, rasterization, cropping and verification without the JS engine.
use eqnimg::data::{EQN_DATA_FILE_NAME, VERSION_FILE_NAME};
use eqnimg::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

/// A 30x20 document with a filled 12x6 rectangle at (4, 7).
const PLATE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="20" viewBox="0 0 30 20">
  <g fill="currentColor" stroke="none"><rect x="4" y="7" width="12" height="6"/></g>
</svg>"#;

struct PlateRenderer;

impl EquationRenderer for PlateRenderer {
    fn render_svg(&self, tex: &str) -> Result<String, RenderError> {
        if tex.trim().is_empty() {
            return Err(RenderError::EmptyMarkup);
        }
        Ok(PLATE_SVG.to_string())
    }
}

/// Renders nothing visible.
struct BlankRenderer;

impl EquationRenderer for BlankRenderer {
    fn render_svg(&self, _tex: &str) -> Result<String, RenderError> {
        Ok(r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"></svg>"#.into())
    }
}

fn write_data(dir: &Path) {
    fs::write(dir.join(VERSION_FILE_NAME), r#"{"version": 7}"#).unwrap();
    fs::write(
        dir.join(EQN_DATA_FILE_NAME),
        r#"{"equations": [
            {"name": "Newton's second law", "category": "Mechanics", "image_key": "newton2",
             "tex": "F = ma", "keywords": ["force"],
             "variables": [{"name": "force", "symbol": "F", "expression": "ma"}]},
            {"name": "Empty", "category": "Broken", "image_key": "empty",
             "tex": "  ", "keywords": [], "variables": []}
        ]}"#,
    )
    .unwrap();
}

#[test]
fn test_data_to_verified_images() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_data(data.path());

    let check = check_data_dir(data.path()).unwrap();
    assert!(check.is_valid(), "{:?}", check.issues);
    assert_eq!(check.version, Some(7));

    let equations = load_equations(data.path().join(EQN_DATA_FILE_NAME)).unwrap();
    assert_eq!(equations.len(), 2);

    let tiers = vec![Tier::new("mdpi", 1.0).unwrap(), Tier::new("xxhdpi", 3.0).unwrap()];
    let config = RenderConfig {
        padding: 8,
        ..Default::default()
    };
    let report = generate(&equations, &tiers, &config, &PlateRenderer, out.path()).unwrap();
    assert_eq!(report.generated(), 2);
    assert_eq!(report.failed(), 2);
    for tier in &report.tiers {
        assert_eq!(tier.failed[0].image_key, "empty");
    }

    let mdpi = image::open(out.path().join("mdpi/newton2.png")).unwrap().to_rgba8();
    assert_eq!(mdpi.dimensions(), (12, 6));
    assert!(mdpi.pixels().all(|p| p.0 == [0, 0, 0, 255]));

    let xxhdpi = image::open(out.path().join("xxhdpi/newton2.png")).unwrap();
    assert_eq!((xxhdpi.width(), xxhdpi.height()), (36, 18));

    let verify = verify_outputs(out.path(), &tiers, &equations);
    assert_eq!(verify.checked, 4);
    assert_eq!(
        verify.missing,
        vec![
            out.path().join("mdpi/empty.png"),
            out.path().join("xxhdpi/empty.png")
        ]
    );
}

#[test]
fn test_text_color_reaches_output() {
    let out = tempfile::tempdir().unwrap();
    let equations = vec![Equation::new("red", "r")];
    let tiers = vec![Tier::new("mdpi", 1.0).unwrap()];
    let config = RenderConfig {
        text_color: 0xffff0000,
        ..Default::default()
    };
    generate(&equations, &tiers, &config, &PlateRenderer, out.path()).unwrap();

    let img = image::open(out.path().join("mdpi/red.png")).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[test]
fn test_background_with_non_white_crop() {
    let out = tempfile::tempdir().unwrap();
    let equations = vec![Equation::new("boxed", "b")];
    let tiers = vec![Tier::new("mdpi", 1.0).unwrap()];
    let config = RenderConfig {
        has_background: true,
        crop_mode: CropMode::NonWhite,
        ..Default::default()
    };
    generate(&equations, &tiers, &config, &PlateRenderer, out.path()).unwrap();

    let img = image::open(out.path().join("mdpi/boxed.png")).unwrap();
    assert_eq!((img.width(), img.height()), (12, 6));
}

#[test]
fn test_blank_render_fails_crop() {
    let out = tempfile::tempdir().unwrap();
    let equations = vec![Equation::new("nothing", "x")];
    let tiers = vec![Tier::new("mdpi", 1.0).unwrap()];
    let report = generate(
        &equations,
        &tiers,
        &RenderConfig::default(),
        &BlankRenderer,
        out.path(),
    )
    .unwrap();
    assert_eq!(report.failed(), 1);
    assert!(report.tiers[0].failed[0].error.contains("no visible content"));
    assert!(!verify_outputs(out.path(), &tiers, &equations).is_complete());
}

#[test]
fn test_rerun_overwrites_outputs() {
    let out = tempfile::tempdir().unwrap();
    let equations = vec![Equation::new("again", "a")];
    let tiers = vec![Tier::new("mdpi", 1.0).unwrap()];
    let config = RenderConfig::default();

    generate(&equations, &tiers, &config, &PlateRenderer, out.path()).unwrap();
    let first = fs::read(out.path().join("mdpi/again.png")).unwrap();
    generate(&equations, &tiers, &config, &PlateRenderer, out.path()).unwrap();
    let second = fs::read(out.path().join("mdpi/again.png")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_render_config_defaults() {
    let config = RenderConfig::default();
    assert_eq!(config.font_size, 300.0);
    assert_eq!(config.padding, 16);
    assert_eq!(config.text_color, 0xff000000);
    assert!(!config.has_background);
    assert_eq!(config.crop_mode, CropMode::Alpha);
}

#[test]
fn test_error_display() {
    assert!(format!("{}", RenderError::EmptyMarkup).contains("empty"));
    assert!(format!("{}", CropError::Blank).contains("no visible content"));
    assert!(format!("{}", TierError::Empty).contains("at least one tier"));
}

#[test]
fn test_shipped_data_is_valid() {
    let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let report = check_data_dir(&data).unwrap();
    assert!(report.is_valid(), "{:?}", report.issues);
    assert_eq!(report.equation_count, 4);
    let equations = load_equations(data.join(EQN_DATA_FILE_NAME)).unwrap();
    assert_eq!(equations[0].image_key, "newtons_second_law");
}
