use crate::Detection;
use std::cmp::Ordering;

/// Greedy class-agnostic NMS: keep the best box, drop everything that
/// overlaps it by more than `iou_threshold`, repeat.
pub fn non_max_suppression(mut dets: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    dets.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));

    let mut keep: Vec<Detection> = Vec::with_capacity(dets.len());
    'outer: for d in dets {
        for k in &keep {
            if d.bounding_box.iou(&k.bounding_box) > iou_threshold {
                continue 'outer;
            }
        }
        keep.push(d);
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoundingBox, Category};

    fn det(l: f32, score: f32) -> Detection {
        Detection::new(
            BoundingBox::new(l, 0.0, l + 10.0, 10.0),
            vec![Category::new("person", score, 0)],
        )
    }

    #[test]
    fn overlapping_boxes_collapse_to_best() {
        let kept = non_max_suppression(vec![det(0.0, 0.6), det(1.0, 0.9), det(50.0, 0.7)], 0.5);
        let scores: Vec<f32> = kept.iter().map(|d| d.score()).collect();
        assert_eq!(scores, vec![0.9, 0.7]);
    }

    #[test]
    fn empty_input() {
        assert!(non_max_suppression(Vec::new(), 0.5).is_empty());
    }
}
