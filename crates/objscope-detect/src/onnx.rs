use crate::{
    non_max_suppression, BoundingBox, Category, DetectError, Detection, Detector, DetectorOptions,
    LabelMap, Result,
};
use image::RgbImage;
use log::{debug, info};
use objscope_preprocess::Preprocessor;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;

fn ort_err(e: impl std::fmt::Display) -> DetectError {
    DetectError::Ort(e.to_string())
}

/// ONNX Runtime detector for YOLO-style heads.
///
/// Expects a single `[1, 4 + classes, N]` output where each column is
/// `(cx, cy, w, h, class scores…)` in model-input pixels.
pub struct OnnxDetector {
    session: Session,
    input_name: String,
    preprocessor: Preprocessor,
    labels: LabelMap,
    options: DetectorOptions,
}

impl OnnxDetector {
    /// Load and optimise the model for a square `input_size` input.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        input_size: u32,
        labels: LabelMap,
        options: DetectorOptions,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let session = Session::builder()
            .map_err(ort_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort_err)?
            .commit_from_file(model_path)
            .map_err(ort_err)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "images".to_string());
        info!("loaded {} (input `{}`, {}x{})", model_path.display(), input_name, input_size, input_size);

        Ok(Self {
            session,
            input_name,
            preprocessor: Preprocessor::new(input_size, input_size),
            labels,
            options,
        })
    }
}

/// Turn a raw `[1, 4 + classes, N]` head output into image-space detections.
fn decode_head(
    shape: &[i64],
    data: &[f32],
    input_dims: (u32, u32),
    image_dims: (u32, u32),
    labels: &LabelMap,
    score_threshold: f32,
) -> Result<Vec<Detection>> {
    let (rows, cols) = match shape {
        [1, rows, cols] if *rows > 4 && *cols >= 0 => (*rows as usize, *cols as usize),
        _ => return Err(DetectError::InvalidOutputShape(shape.to_vec())),
    };
    if data.len() < rows * cols {
        return Err(DetectError::InvalidOutputShape(shape.to_vec()));
    }

    let (image_w, image_h) = image_dims;
    let sx = image_w as f32 / input_dims.0 as f32;
    let sy = image_h as f32 / input_dims.1 as f32;
    let at = |row: usize, col: usize| data[row * cols + col];

    let mut dets = Vec::new();
    for col in 0..cols {
        let (best_cls, best_score) = (4..rows)
            .map(|row| (row - 4, at(row, col)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if best_score < score_threshold {
            continue;
        }

        let bbox = BoundingBox::from_center(at(0, col), at(1, col), at(2, col), at(3, col))
            .scaled(sx, sy)
            .clamped(image_w as f32, image_h as f32);
        let label = labels.label_for(best_cls).into_owned();
        dets.push(Detection::new(bbox, vec![Category::new(label, best_score, best_cls)]));
    }
    Ok(dets)
}

impl Detector for OnnxDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        let nchw = self
            .preprocessor
            .run_nchw(image)
            .map_err(|e| DetectError::InvalidInput(e.to_string()))?;
        let (n, c, h, w) = nchw.dim();
        let data: Vec<f32> = nchw.iter().copied().collect();
        let input = Tensor::from_array(([n, c, h, w], data.into_boxed_slice())).map_err(ort_err)?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(ort_err)?;
        let (out_shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(ort_err)?;
        let out_shape: Vec<i64> = out_shape.iter().copied().collect();
        let data = data.to_vec();
        drop(outputs);

        let raw = decode_head(
            &out_shape,
            &data,
            self.preprocessor.dims(),
            image.dimensions(),
            &self.labels,
            self.options.score_threshold,
        )?;
        let candidates = raw.len();
        let kept = self.options.apply(non_max_suppression(raw, self.options.iou_threshold));
        debug!("onnx: {} candidates -> {} detections", candidates, kept.len());
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two candidates, two classes, laid out row-major as the head emits them.
    fn head() -> (Vec<i64>, Vec<f32>) {
        let rows = [
            [320.0, 100.0], // cx
            [320.0, 100.0], // cy
            [64.0, 10.0],   // w
            [32.0, 10.0],   // h
            [0.1, 0.2],     // class 0
            [0.8, 0.3],     // class 1
        ];
        (vec![1, 6, 2], rows.iter().flatten().copied().collect())
    }

    #[test]
    fn decodes_into_image_pixels() {
        let (shape, data) = head();
        let labels = LabelMap::new(vec!["person".into(), "bicycle".into()]);
        let dets = decode_head(&shape, &data, (640, 640), (1280, 960), &labels, 0.5).unwrap();
        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        assert_eq!(d.categories[0], Category::new("bicycle", 0.8, 1));
        // x scales by 2, y by 1.5
        assert_eq!(d.bounding_box, BoundingBox::new(576.0, 456.0, 704.0, 504.0));
    }

    #[test]
    fn rejects_unexpected_shapes() {
        let labels = LabelMap::coco80();
        assert!(matches!(
            decode_head(&[1, 4, 10], &[0.0; 40], (640, 640), (640, 640), &labels, 0.5),
            Err(DetectError::InvalidOutputShape(_))
        ));
        assert!(decode_head(&[1, 6, 10], &[0.0; 5], (640, 640), (640, 640), &labels, 0.5).is_err());
    }

    #[test]
    #[ignore]
    fn blank_frame_has_no_detections() {
        let manifest = env!("CARGO_MANIFEST_DIR");
        let model = std::env::var("OBJSCOPE_MODEL")
            .unwrap_or_else(|_| format!("{manifest}/../../models/model.onnx"));
        let mut det = OnnxDetector::new(&model, 640, LabelMap::coco80(), DetectorOptions::default())
            .expect("model");
        let out = det.detect(&RgbImage::new(640, 480)).expect("inference");
        assert!(out.is_empty());
    }
}
