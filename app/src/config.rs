use anyhow::Context;
use objscope_camera::CameraConfig;
use objscope_detect::{DetectorOptions, LabelMap};
use objscope_overlay::OverlayStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub overlay: OverlayConfig,
    pub view: ViewConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    /// Square model input edge in pixels.
    pub input_size: u32,
    /// One label per line; the built-in COCO table when absent.
    pub labels_path: Option<PathBuf>,
    #[serde(flatten)]
    pub options: DetectorOptions,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/model.onnx"),
            input_size: 640,
            labels_path: None,
            options: DetectorOptions::default(),
        }
    }
}

impl DetectorConfig {
    pub fn labels(&self) -> anyhow::Result<LabelMap> {
        match &self.labels_path {
            Some(path) => LabelMap::from_file(path).with_context(|| format!("loading labels {}", path.display())),
            None => Ok(LabelMap::default()),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    #[serde(flatten)]
    pub style: OverlayStyle,
    pub font_path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { width: 1080, height: 1920 }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading config {}", path_ref.display()))?;
        let config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", path_ref.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objscope_camera::Facing;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.camera.width, 640);
        assert_eq!(cfg.camera.fps, 30);
        assert_eq!(cfg.detector.input_size, 640);
        assert_eq!(cfg.detector.options.max_results, 5);
        assert_eq!(cfg.detector.options.score_threshold, 0.5);
        assert_eq!(cfg.overlay.style.stroke_width, 4.0);
        assert_eq!(cfg.overlay.style.text_size, 30.0);
        assert_eq!(cfg.view, ViewConfig { width: 1080, height: 1920 });
    }

    #[test]
    fn config_load_reads_partial_json() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            br#"{
                "camera": { "facing": "front", "front_device": "/dev/video7" },
                "detector": { "score_threshold": 0.3, "max_results": 10 },
                "overlay": { "text_size": 24.0 },
                "view": { "width": 720 }
            }"#,
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = AppConfig::load(&path).unwrap();

        assert_eq!(cfg.camera.facing, Facing::Front);
        assert_eq!(cfg.camera.device_for(Facing::Front), "/dev/video7");
        assert_eq!(cfg.camera.width, 640);
        assert_eq!(cfg.detector.options.score_threshold, 0.3);
        assert_eq!(cfg.detector.options.max_results, 10);
        assert_eq!(cfg.detector.input_size, 640);
        assert_eq!(cfg.overlay.style.text_size, 24.0);
        assert_eq!(cfg.overlay.style.stroke_width, 4.0);
        assert_eq!(cfg.view, ViewConfig { width: 720, height: 1920 });
    }

    #[test]
    fn config_load_reports_path_on_error() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"{ not json").unwrap();
        let path = temp.into_temp_path();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }

    #[test]
    fn builtin_labels_without_path() {
        let labels = DetectorConfig::default().labels().unwrap();
        assert_eq!(labels.label_for(0), "person");
    }
}
