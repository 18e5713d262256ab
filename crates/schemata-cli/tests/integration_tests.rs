//! End-to-end tests for the schemata binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

const STATION: &str = "\
--- !schemata.Station
network: GE
station: RGN
lat: 52
lon: '13.07'
channels:
- !schemata.Channel
  channel: BHZ
  azimuth: 0
  response: !schemata.Gain
    gain: 1500000000.0
";

const BAD_TENSOR: &str = "\
--- !schemata.MomentTensor
m6: [1.0, 2.0, 3.0, 0.5, 0.25]
";

fn schemata(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schemata"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn check_passes_valid_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("stations")).unwrap();
    fs::write(dir.path().join("stations/rgn.yaml"), STATION).unwrap();
    fs::write(dir.path().join("stations/README.md"), "not yaml").unwrap();

    let output = schemata(dir.path(), &["check", "stations"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
}

#[test]
fn check_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.yaml"), STATION).unwrap();
    fs::write(dir.path().join("bad.yaml"), BAD_TENSOR).unwrap();

    let output = schemata(dir.path(), &["check", ".", "--report", "report.json"]);
    assert!(!output.status.success());

    let json = fs::read_to_string(dir.path().join("report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(report["summary"]["files"], 2);
    assert_eq!(report["summary"]["valid"], 1);
    assert_eq!(report["summary"]["failed"], 1);
    assert!(report["failures"][0]["message"]
        .as_str()
        .unwrap()
        .contains("length 6"));
}

#[test]
fn regularize_rewrites_canonical_stream() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("in.yaml"), STATION).unwrap();

    let output = schemata(dir.path(), &["regularize", "in.yaml", "--output", "out.yaml"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let text = fs::read_to_string(dir.path().join("out.yaml")).unwrap();
    assert!(text.starts_with("# schemata-format: 1\n"));
    assert!(text.contains("lat: 52.0"));
    assert!(text.contains("lon: 13.07"));
    assert!(text.contains("azimuth: 0.0"));
    assert!(text.contains("elevation: 0.0"));

    // Regularized output is a fixed point
    let again = schemata(dir.path(), &["regularize", "out.yaml"]);
    assert!(again.status.success());
    assert_eq!(String::from_utf8(again.stdout).unwrap(), text);
}

#[test]
fn config_changes_tag_prefix() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("schemata.toml"), "tag_prefix = \"pyrocko\"\n").unwrap();

    let output = schemata(dir.path(), &["schemas", "--json"]);
    assert!(output.status.success());

    let schemas: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tags: Vec<&str> = schemas
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["tag"].as_str().unwrap())
        .collect();
    assert_eq!(tags[0], "pyrocko.Response");
    assert!(tags.contains(&"pyrocko.MomentTensor"));
}

#[test]
fn schemas_lists_fields_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let output = schemata(dir.path(), &["schemas", "--json"]);
    let schemas: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    let station = schemas
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["tag"] == "schemata.Station")
        .unwrap();
    let names: Vec<&str> = station["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();

    assert_eq!(
        names,
        vec!["network", "station", "location", "lat", "lon", "elevation", "depth", "channels"]
    );
}

#[test]
fn empty_files_pass_check() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("empty.yaml"), "").unwrap();
    fs::write(dir.path().join("banner.yaml"), "# schemata-format: 1\n# schemata-model: 1\n").unwrap();

    let output = schemata(dir.path(), &["check", ".", "--report", "report.json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));

    let json = fs::read_to_string(dir.path().join("report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["summary"]["files"], 2);
    assert_eq!(report["summary"]["documents"], 0);
}
