use crate::Detection;

/// Status text when a frame has no detections.
pub const NO_OBJECT: &str = "No object detected";

/// One-line description of a frame: `"person (92%), car (81%)"`.
///
/// Percentages are truncated, so 0.996 reads `99%`. Box labels on the
/// overlay round instead, so the two can differ by one. Detections without
/// categories are left out.
pub fn summarize(detections: &[Detection]) -> String {
    let parts: Vec<String> = detections
        .iter()
        .filter_map(|d| d.top())
        .map(|c| format!("{} ({}%)", c.label, (c.score * 100.0) as i32))
        .collect();

    if parts.is_empty() {
        NO_OBJECT.to_string()
    } else {
        parts.join(", ")
    }
}
