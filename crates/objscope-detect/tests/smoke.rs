use image::RgbImage;
use objscope_detect::{summarize, Detector, DetectorOptions, ReplayDetector, NO_OBJECT};
use std::io::Write;

#[test]
fn replay_from_file_feeds_status_line() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"[
            {{"bounding_box": {{"left": 100, "top": 50, "right": 200, "bottom": 150}},
              "categories": [{{"label": "car", "score": 0.92, "index": 2}}]}},
            {{"bounding_box": {{"left": 10, "top": 10, "right": 40, "bottom": 90}},
              "categories": [{{"label": "person", "score": 0.81, "index": 0}}]}},
            {{"bounding_box": {{"left": 0, "top": 0, "right": 5, "bottom": 5}},
              "categories": [{{"label": "kite", "score": 0.1, "index": 33}}]}}
        ]"#
    )?;

    let mut det = ReplayDetector::open(file.path())?.with_options(DetectorOptions::default());
    let out = det.detect(&RgbImage::new(640, 480))?;

    assert_eq!(out.len(), 2);
    assert_eq!(summarize(&out), "car (92%), person (81%)");
    assert_eq!(summarize(&[]), NO_OBJECT);
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let err = ReplayDetector::open("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.json"));
}
