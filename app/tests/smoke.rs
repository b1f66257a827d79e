use image::{Rgb, RgbImage};
use std::process::Command;

const DETECTIONS: &str = r#"[
  { "bounding_box": { "left": 100, "top": 50, "right": 200, "bottom": 150 },
    "categories": [{ "label": "car", "score": 0.92, "index": 2 }] },
  { "bounding_box": { "left": 300, "top": 200, "right": 400, "bottom": 400 },
    "categories": [{ "label": "person", "score": 0.81, "index": 0 }] },
  { "bounding_box": { "left": 0, "top": 0, "right": 10, "bottom": 10 },
    "categories": [] }
]"#;

#[test]
fn smoke_render_writes_overlay_and_display_list() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("frame.png");
    let detections = dir.path().join("dets.json");
    let out = dir.path().join("out.png");
    let ops = dir.path().join("ops.json");
    RgbImage::from_pixel(640, 480, Rgb([40, 40, 40])).save(&image).unwrap();
    std::fs::write(&detections, DETECTIONS).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_objscope"))
        .arg("render")
        .arg("--image")
        .arg(&image)
        .arg("--detections")
        .arg(&detections)
        .args(["--view", "1080x1920"])
        .arg("--out")
        .arg(&out)
        .arg("--display-list")
        .arg(&ops)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "car (92%), person (81%)");

    let rendered = image::open(&out).unwrap();
    assert_eq!((rendered.width(), rendered.height()), (1080, 1920));

    let list: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&ops).unwrap()).unwrap();
    let texts: Vec<&str> = list["ops"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|op| op["text"].as_str())
        .collect();
    assert_eq!(texts, vec!["car 92%", "person 81%"]);
}

#[test]
fn smoke_render_without_detector_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("frame.png");
    RgbImage::new(8, 8).save(&image).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_objscope"))
        .arg("render")
        .arg("--image")
        .arg(&image)
        .arg("--detections")
        .arg(dir.path().join("missing.json"))
        .arg("--out")
        .arg(dir.path().join("out.png"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.json"));
}
