use crate::utils::{small_grid, write_synthetic_csv};
use ocd_severity::{Pipeline, PipelineConfig};

/// Configured output paths receive the heatmap SVG and the JSON summary
#[test]
fn test_svg_and_json_outputs() -> ocd_severity::Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_synthetic_csv(dir.path(), 120, 5);
    let svg_path = dir.path().join("out").join("confusion.svg");
    let json_path = dir.path().join("out").join("summary.json");

    let config = PipelineConfig::builder()
        .input_path(&input)
        .param_grid(small_grid())
        .cv_folds(3)
        .show_progress(false)
        .heatmap_svg(&svg_path)
        .summary_json(&json_path)
        .build()?;
    let outcome = Pipeline::new(config).run()?;

    let svg = std::fs::read_to_string(&svg_path).expect("svg written");
    assert_eq!(svg, outcome.heatmap.to_svg());
    assert!(svg.contains("Confusion Matrix - Balanced Gradient Boosting"));

    let json = std::fs::read_to_string(&json_path).expect("json written");
    let value: serde_json::Value = serde_json::from_str(&json)?;
    let accuracy = value["accuracy"].as_f64().expect("accuracy field");
    assert!((accuracy - outcome.accuracy).abs() < 1e-12);
    assert_eq!(value["test_rows"].as_u64(), Some(outcome.split.test.len() as u64));
    assert_eq!(value["class_names"].as_array().map(Vec::len), Some(3));
    assert_eq!(
        value["input_path"].as_str(),
        input.to_str()
    );
    assert_eq!(
        value["candidates"].as_array().map(Vec::len),
        Some(outcome.summary.candidates.len())
    );
    Ok(())
}

/// The terminal rendering carries the title, both captions and every label
#[test]
fn test_terminal_heatmap() -> ocd_severity::Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_synthetic_csv(dir.path(), 120, 6);
    let config = crate::utils::test_config(&input)?;
    let outcome = Pipeline::new(config).run()?;

    let rendered = outcome.heatmap.render_ansi();
    assert!(rendered.starts_with("Confusion Matrix - Balanced Gradient Boosting"));
    for caption in ["Actual", "Predicted", "Mild", "Moderate", "Severe"] {
        assert!(rendered.contains(caption), "missing {caption}");
    }

    let report = outcome.report.to_string();
    assert!(report.contains("precision"));
    assert!(report.contains("weighted avg"));
    Ok(())
}
