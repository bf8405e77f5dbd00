//! Generation Invariant Tests
//!
//! End-to-end runs of the pipeline against a recording renderer.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use carpet_rules::{
    encode, GenerationPipeline, Manifest, PipelineError, RasterError, RasterOutcome, RasterStatus,
    Renderer, RunConfig,
};

/// Writes a stand-in PNG and records every call.
#[derive(Default)]
struct RecordingRenderer {
    calls: RefCell<Vec<(PathBuf, PathBuf)>>,
}

impl Renderer for RecordingRenderer {
    fn render(&self, svg_path: &Path, png_path: &Path) -> Result<RasterOutcome, RasterError> {
        self.calls
            .borrow_mut()
            .push((svg_path.to_path_buf(), png_path.to_path_buf()));
        fs::write(png_path, b"\x89PNG\r\n\x1a\n").unwrap();
        Ok(RasterOutcome {
            stdout: format!("rendered {}", png_path.display()),
            ..RasterOutcome::success()
        })
    }
}

const PLACEHOLDERS: [&str; 9] = [
    "000000", "007f00", "00ff00", "7f0000", "7f7f00", "7fff00", "ff0000", "ff7f00", "ffff00",
];

fn grid_template() -> String {
    let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg">"#);
    for (i, token) in PLACEHOLDERS.iter().enumerate() {
        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="1" height="1" style="fill:#{};stroke:none"/>"#,
            i % 3,
            i / 3,
            token
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn pipeline_in(dir: &Path) -> GenerationPipeline<RecordingRenderer> {
    GenerationPipeline::new(
        RecordingRenderer::default(),
        RunConfig::default().with_output_dir(dir),
    )
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn invariant_single_placeholder_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path());

    let template = r#"<svg><rect style="fill:#000000"/></svg>"#;
    let report = pipeline
        .run("5 -> 0 0 0, 0 0 0, 0 0 0", template, &mut Vec::new())
        .unwrap();

    let stem = format!("rule-{}FF", encode(5).to_upper());
    assert_eq!(stem, "rule-303030FF");
    assert_eq!(
        dir_entries(dir.path()),
        vec![format!("{}.png", stem), format!("{}.svg", stem)]
    );

    let svg = fs::read_to_string(dir.path().join(format!("{}.svg", stem))).unwrap();
    assert_eq!(svg, format!(r#"<svg><rect style="fill:#{}"/></svg>"#, encode(0)));

    assert_eq!(report.assets.len(), 1);
    assert_eq!(report.assets[0].raster, RasterStatus::Succeeded);
}

#[test]
fn invariant_all_nine_placeholders_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path());

    let report = pipeline
        .run("0 -> 1 2 3, 4 5 6, 7 8 9", &grid_template(), &mut Vec::new())
        .unwrap();
    assert_eq!(report.assets[0].key, encode(0));

    let svg = fs::read_to_string(&report.assets[0].svg_path).unwrap();
    for token in PLACEHOLDERS {
        assert!(!svg.contains(&format!(":#{}", token)), "{} left behind", token);
    }
    for (i, level) in (1..=9).enumerate() {
        let expected = format!(
            r#"x="{}" y="{}" width="1" height="1" style="fill:#{};"#,
            i % 3,
            i / 3,
            encode(level)
        );
        assert!(svg.contains(&expected), "missing {}", expected);
    }
}

#[test]
fn invariant_svg_output_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path());
    let rules = "0 -> 1 2 3, 4 5 6, 7 8 9\n9 -> 0 0 0, 0 9 0, 0 0 0";

    pipeline.run(rules, &grid_template(), &mut Vec::new()).unwrap();
    let first: Vec<_> = dir_entries(dir.path())
        .into_iter()
        .filter(|n| n.ends_with(".svg"))
        .map(|n| fs::read(dir.path().join(n)).unwrap())
        .collect();

    pipeline.run(rules, &grid_template(), &mut Vec::new()).unwrap();
    let second: Vec<_> = dir_entries(dir.path())
        .into_iter()
        .filter(|n| n.ends_with(".svg"))
        .map(|n| fs::read(dir.path().join(n)).unwrap())
        .collect();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn invariant_comment_only_rules_generate_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path());

    let report = pipeline
        .run("# no rules here\n\njust text\n", &grid_template(), &mut Vec::new())
        .unwrap();

    assert!(report.assets.is_empty());
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn invariant_malformed_rule_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path());

    let rules = "1 -> 1 1 1, 1 1 1, 1 1 1\nx -> 1 2 3, 4 5 6, 7 8 9";
    let err = pipeline
        .run(rules, &grid_template(), &mut Vec::new())
        .unwrap_err();

    assert!(matches!(err, PipelineError::Parse(_)));
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn invariant_template_without_placeholders_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path());
    let template = r#"<svg><circle fill="red"/></svg>"#;

    let report = pipeline
        .run("0 -> 1 1 1, 1 1 1, 1 1 1\n1 -> 2 2 2, 2 2 2, 2 2 2", template, &mut Vec::new())
        .unwrap();

    assert_eq!(report.assets.len(), 2);
    for asset in &report.assets {
        assert_eq!(fs::read_to_string(&asset.svg_path).unwrap(), template);
    }
}

#[test]
fn invariant_rules_processed_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path());

    let mut sink = Vec::new();
    pipeline
        .run("7 -> 0 0 0\n2 -> 0 0 0\n7 -> 1 1 1", "<svg/>", &mut sink)
        .unwrap();

    let calls = pipeline_calls(&pipeline);
    assert_eq!(
        calls,
        vec![
            dir.path().join(format!("rule-{}FF.svg", encode(7).to_upper())),
            dir.path().join(format!("rule-{}FF.svg", encode(2).to_upper())),
        ]
    );

    let reported = String::from_utf8(sink).unwrap();
    assert_eq!(reported.lines().count(), 2);
    assert!(reported.starts_with("rendered "));
}

fn pipeline_calls(pipeline: &GenerationPipeline<RecordingRenderer>) -> Vec<PathBuf> {
    pipeline.renderer().calls.borrow().iter().map(|(svg, _)| svg.clone()).collect()
}

#[test]
fn invariant_manifest_records_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("manifest.json");
    let config = RunConfig {
        manifest_path: Some(manifest_path.clone()),
        ..RunConfig::default().with_output_dir(dir.path())
    };
    let pipeline = GenerationPipeline::new(RecordingRenderer::default(), config);

    let rules = "0 -> 1 2 3, 4 5 6, 7 8 9";
    pipeline.run(rules, &grid_template(), &mut Vec::new()).unwrap();

    let manifest: Manifest =
        serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(manifest.entries.len(), 1);

    let entry = &manifest.entries[0];
    assert_eq!(entry.key, encode(0));
    assert_eq!(entry.svg_file, "rule-180000FF.svg");
    assert_eq!(entry.replacements, 9);
    assert_eq!(entry.raster, RasterStatus::Succeeded);

    let svg = fs::read(dir.path().join(&entry.svg_file)).unwrap();
    assert_eq!(entry.svg_sha256, carpet_rules::hashing::sha256_hex(&svg));
    assert_eq!(
        manifest.job_hash,
        carpet_rules::hashing::compute_job_hash(rules, &grid_template(), carpet_rules::ENGINE_VERSION)
    );
}

#[test]
fn invariant_extreme_levels_complete() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path());

    let rules = format!("{} -> {} 0 0, 0 0 0, 0 0 0", i64::MAX, i64::MIN);
    let report = pipeline
        .run(&rules, "<svg><rect style=\"fill:#000000\"/></svg>", &mut Vec::new())
        .unwrap();

    assert_eq!(report.assets.len(), 1);
    assert_eq!(report.assets[0].key, encode(i64::MAX));
    let svg = fs::read_to_string(&report.assets[0].svg_path).unwrap();
    assert!(svg.contains(&format!(":#{}", encode(i64::MIN))));
}
