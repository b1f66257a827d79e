use crate::{DetectError, Result};
use std::borrow::Cow;
use std::path::Path;

const UNKNOWN: &str = "unknown";

/// COCO class names in the sparse 90-id layout SSD-style models emit.
/// Retired ids are kept as "unknown" so indices line up.
const COCO_SPARSE: [&str; 88] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", UNKNOWN, "stop sign", "parking meter", "bench", "bird",
    "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", UNKNOWN,
    "backpack", "umbrella", UNKNOWN, "handbag", "tie", "suitcase", "frisbee", "skis",
    "snowboard", "sports ball", "kite", "baseball bat", "baseball glove", "skateboard",
    "surfboard", "tennis racket", "bottle", UNKNOWN, "wine glass", "cup", "fork", "knife",
    "spoon", "bowl", "banana", "apple", "sandwich", "orange", "broccoli", "carrot", "hot dog",
    "pizza", "donut", "cake", "chair", "couch", "potted plant", "bed", UNKNOWN, "dining table",
    UNKNOWN, "toilet", UNKNOWN, "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", UNKNOWN, "book", "clock", "vase",
    "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Class index → display name.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Sparse COCO table (SSD / TFLite detector ids).
    pub fn coco() -> Self {
        Self::new(COCO_SPARSE.iter().map(|s| s.to_string()).collect())
    }

    /// Contiguous 80-class COCO table (YOLO family ids).
    pub fn coco80() -> Self {
        Self::new(
            COCO_SPARSE
                .iter()
                .filter(|s| **s != UNKNOWN)
                .map(|s| s.to_string())
                .collect(),
        )
    }

    /// One label per line; blank lines are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DetectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        ))
    }

    /// Name for `index`, or `"Class <index>"` past the end of the table.
    pub fn label_for(&self, index: usize) -> Cow<'_, str> {
        match self.labels.get(index) {
            Some(label) => Cow::Borrowed(label.as_str()),
            None => Cow::Owned(format!("Class {index}")),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::coco80()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn sparse_table_keeps_gaps() {
        let m = LabelMap::coco();
        assert_eq!(m.label_for(0), "person");
        assert_eq!(m.label_for(11), "unknown");
        assert_eq!(m.label_for(12), "stop sign");
    }

    #[test]
    fn contiguous_table_has_eighty_classes() {
        let m = LabelMap::coco80();
        assert_eq!(m.len(), 80);
        assert_eq!(m.label_for(11), "stop sign");
        assert_eq!(m.label_for(79), "toothbrush");
    }

    #[test]
    fn out_of_range_falls_back_to_class_id() {
        assert_eq!(LabelMap::coco().label_for(200), "Class 200");
    }

    #[test]
    fn reads_label_file() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "cat\n\n dog \nbird").unwrap();
        let m = LabelMap::from_file(f.path()).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.label_for(1), "dog");
    }
}
