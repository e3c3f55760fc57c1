use eqnimg::render::find_markup_error;
use eqnimg::{generate, verify_outputs, Equation, EquationRenderer, MathJaxRenderer, RenderConfig, Tier};

fn latex_to_svg(tex: &str) -> Result<String, String> {
    MathJaxRenderer::new()
        .map_err(|e| format!("Failed to start MathJax: {}", e))?
        .render_svg(tex)
        .map_err(|e| format!("Failed to render LaTeX: {}", e))
}

#[test]
#[ignore = "runs the MathJax engine"]
fn test_multiple_renders() {
    let formulas = [
        "x^2 + y^2 = z^2",
        "\\int_0^\\infty e^{-x} dx",
        "E = mc^2",
        "x = \\frac{-b \\pm \\sqrt{b^2 - 4ac}}{2a}",
        "\\sum_{i=1}^{n} i = \\frac{n(n+1)}{2}",
    ];
    for tex in formulas {
        let svg = latex_to_svg(tex).unwrap();
        assert!(svg.contains("<svg"), "{}", tex);
        assert_eq!(find_markup_error(&svg), None);
    }
    assert!(latex_to_svg("").is_err());
}

#[test]
#[ignore = "runs the MathJax engine"]
fn test_mathjax_to_tiers() {
    let out = tempfile::tempdir().unwrap();
    let equations = vec![
        Equation::new("pythagoras", "a^2 + b^2 = c^2"),
        Equation::new("golden_ratio", "\\phi = \\frac{1 + \\sqrt{5}}{2}"),
    ];
    let tiers = vec![Tier::new("mdpi", 1.0).unwrap(), Tier::new("xhdpi", 2.0).unwrap()];

    let report = generate(
        &equations,
        &tiers,
        &RenderConfig::default(),
        &MathJaxRenderer::new().unwrap(),
        out.path(),
    )
    .unwrap();
    assert_eq!(report.failed(), 0, "{:?}", report);
    assert!(verify_outputs(out.path(), &tiers, &equations).is_complete());

    let small = image::open(out.path().join("mdpi/pythagoras.png")).unwrap();
    let large = image::open(out.path().join("xhdpi/pythagoras.png")).unwrap();
    assert!(large.width() > small.width());
    assert!(large.height() > small.height());
}
