use crate::Detection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Result filtering applied after every inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorOptions {
    /// Upper bound on detections per frame.
    pub max_results: usize,
    /// Minimum top-category score to keep a detection.
    pub score_threshold: f32,
    /// Overlap above which the weaker of two boxes is suppressed.
    pub iou_threshold: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_results: 5,
            score_threshold: 0.5,
            iou_threshold: 0.45,
        }
    }
}

impl DetectorOptions {
    /// Drop detections below the threshold (and malformed ones), order by
    /// score descending, keep at most `max_results`.
    pub fn apply(&self, mut dets: Vec<Detection>) -> Vec<Detection> {
        dets.retain(|d| d.top().is_some_and(|c| c.score >= self.score_threshold));
        // stable: equal scores keep their original order
        dets.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));
        dets.truncate(self.max_results);
        dets
    }
}
