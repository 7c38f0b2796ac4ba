#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn quadmark() -> Command {
    Command::cargo_bin("quadmark").expect("binary built")
}

#[test]
fn params_dumps_default_json() {
    let out = quadmark().arg("params").assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("json");
    assert_eq!(json["warp_size"], 200);
    assert_eq!(json["total_grid"], 6);
    assert_eq!(json["max_hamming"], 0);
    assert_eq!(json["selection"], "largest_area");
}

#[test]
fn print_writes_marker_png() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("marker.png");
    quadmark()
        .args(["print", "--cell-px", "10", "--quiet-cells", "1", "--out"])
        .arg(&path)
        .assert()
        .success();
    let img = image::open(&path).expect("png").to_luma8();
    assert_eq!(img.dimensions(), (80, 80));
    // quiet zone, then the black ring
    assert_eq!(img.get_pixel(5, 5).0[0], 255);
    assert_eq!(img.get_pixel(15, 15).0[0], 0);
}

#[test]
fn synth_then_detect_round_trip() {
    let dir = tempdir().expect("tempdir");
    let frame = dir.path().join("frame.png");
    let report = dir.path().join("report.json");
    let overlay = dir.path().join("overlay.png");

    quadmark()
        .args(["synth", "--tvec", "-0.5", "-0.5", "4", "--turns", "1", "--out"])
        .arg(&frame)
        .assert()
        .success();

    quadmark()
        .arg("detect")
        .arg("--image")
        .arg(&frame)
        .arg("--out")
        .arg(&report)
        .arg("--overlay")
        .arg(&overlay)
        .assert()
        .success()
        .stdout(predicate::str::contains("pose:"));

    let raw = std::fs::read_to_string(&report).expect("report");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(json["pose"]["valid"], true);
    assert!(json["error"].is_null());
    assert_eq!(json["markers"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["markers"][0]["orientation"], "Deg90");
    let tz = json["pose"]["tvec"][2].as_f64().expect("tz");
    assert!((tz - 4.0).abs() < 0.1, "tz = {tz}");
    assert_eq!(json["view_matrix"].as_array().map(Vec::len), Some(16));
    assert!(overlay.exists());
}

#[test]
fn detect_reports_missing_marker() {
    let dir = tempdir().expect("tempdir");
    let frame = dir.path().join("blank.png");
    image::RgbImage::from_pixel(64, 48, image::Rgb([255, 255, 255]))
        .save(&frame)
        .expect("save");
    let report = dir.path().join("report.json");

    quadmark()
        .arg("detect")
        .arg("--image")
        .arg(&frame)
        .arg("--out")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("no pose"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report")).expect("json");
    assert_eq!(json["pose"]["valid"], false);
    assert_eq!(json["error"], "no_candidate");
}

#[test]
fn detect_fails_on_missing_image() {
    let dir = tempdir().expect("tempdir");
    quadmark()
        .arg("detect")
        .arg("--image")
        .arg(dir.path().join("nope.png"))
        .arg("--out")
        .arg(dir.path().join("report.json"))
        .assert()
        .failure();
}

#[test]
fn detect_rejects_malformed_calibration() {
    let dir = tempdir().expect("tempdir");
    let frame = dir.path().join("blank.png");
    image::RgbImage::new(32, 32).save(&frame).expect("save");
    let cal = dir.path().join("camera.json");
    std::fs::write(&cal, r#"{ "cameraMatrix": [[800, 0, 320], [0, 800, 240]], "distCoeffs": [] }"#)
        .expect("write");

    quadmark()
        .arg("detect")
        .arg("--image")
        .arg(&frame)
        .arg("--calibration")
        .arg(&cal)
        .arg("--out")
        .arg(dir.path().join("report.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("camera matrix").or(predicate::str::contains("cameraMatrix")));
}
