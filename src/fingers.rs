//! Finger counting on the selected hand contour.
//!
//! The hand outline is compared against its convex hull: every gap between two
//! consecutive hull vertices is a convexity defect, and a defect deep enough to be
//! the valley between two extended fingers counts once. `HandDetector` chains the
//! whole per-frame pipeline (mask, contour, hull, defects, count).

use image::RgbImage;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

use crate::config::{FingerSettings, SkinSettings};
use crate::contour::{self, Contour};
use crate::vision;

/// Defect depths are fixed point: 256 units per pixel.
pub const DEPTH_SCALE: f64 = 256.0;

/// One hull-to-contour gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvexityDefect {
    /// Contour index of the hull vertex where the gap starts.
    pub start: usize,
    /// Contour index of the hull vertex where the gap ends.
    pub end: usize,
    /// Contour index of the point farthest from the hull edge.
    pub farthest: usize,
    /// Distance of `farthest` from the hull edge, in 1/256 px.
    pub depth: u32,
}

/// Convex hull of the contour as ascending indices into `contour.points`.
pub fn hull_indices(contour: &Contour) -> Vec<usize> {
    if contour.is_empty() {
        return Vec::new();
    }
    let hull: Vec<Point<i32>> = convex_hull(contour.points.as_slice());
    let mut idx: Vec<usize> = hull
        .iter()
        .filter_map(|hp| contour.points.iter().position(|p| p == hp))
        .collect();
    idx.sort_unstable();
    idx.dedup();
    idx
}

/// Defects of `contour` against `hull` (ascending contour indices). Only gaps with a
/// positive depth are reported; a hull of fewer than three vertices has none.
pub fn convexity_defects(contour: &Contour, hull: &[usize]) -> Vec<ConvexityDefect> {
    let pts = &contour.points;
    let n = pts.len();
    if hull.len() < 3 {
        return Vec::new();
    }

    let mut defects = Vec::new();
    for k in 0..hull.len() {
        let a = hull[k];
        let b = hull[(k + 1) % hull.len()];
        let pa = pts[a];
        let pb = pts[b];
        let dx = (pb.x - pa.x) as f64;
        let dy = (pb.y - pa.y) as f64;
        let len = dx.hypot(dy);

        let mut best = 0.0f64;
        let mut farthest = None;
        let mut i = (a + 1) % n;
        while i != b {
            let q = pts[i];
            let qx = (q.x - pa.x) as f64;
            let qy = (q.y - pa.y) as f64;
            let d = if len > 0.0 {
                (qx * dy - qy * dx).abs() / len
            } else {
                qx.hypot(qy)
            };
            if d > best {
                best = d;
                farthest = Some(i);
            }
            i = (i + 1) % n;
        }

        if let Some(farthest) = farthest {
            defects.push(ConvexityDefect {
                start: a,
                end: b,
                farthest,
                depth: (best * DEPTH_SCALE).round() as u32,
            });
        }
    }
    defects
}

/// Defects strictly deeper than `threshold` (1/256 px): the valleys between fingers.
pub fn finger_valleys(
    defects: &[ConvexityDefect],
    threshold: u32,
) -> impl Iterator<Item = &ConvexityDefect> {
    defects.iter().filter(move |d| d.depth > threshold)
}

/// Number of finger valleys. Uncapped.
pub fn count_fingers(defects: &[ConvexityDefect], threshold: u32) -> usize {
    finger_valleys(defects, threshold).count()
}

/// Result of running the pipeline on one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Detection {
    /// Largest skin region, if any.
    pub hand: Option<Contour>,
    /// Deepest point of each counted valley, in frame coordinates.
    pub valleys: Vec<Point<i32>>,
    /// Raw, undebounced estimate; 0 when no hand was found.
    pub fingers: i32,
}

/// Frame -> finger estimate. Stateless; one instance per capture thread.
#[derive(Debug, Clone)]
pub struct HandDetector {
    skin: SkinSettings,
    fingers: FingerSettings,
}

impl HandDetector {
    pub fn new(skin: SkinSettings, fingers: FingerSettings) -> Self {
        Self { skin, fingers }
    }

    pub fn detect(&self, frame: &RgbImage) -> Detection {
        let mask = vision::skin_mask(frame, &self.skin);
        if vision::is_empty(&mask) {
            return Detection::default();
        }

        let Some(hand) = contour::largest(contour::external_contours(&mask)) else {
            return Detection::default();
        };

        let hull = hull_indices(&hand);
        let defects = convexity_defects(&hand, &hull);
        let threshold = self.fingers.defect_depth_threshold;
        let valleys = finger_valleys(&defects, threshold)
            .map(|d| hand.points[d.farthest])
            .collect();
        let count = count_fingers(&defects, threshold);

        Detection {
            hand: Some(hand),
            valleys,
            fingers: i32::try_from(count).unwrap_or(i32::MAX),
        }
    }
}
