// Contour extraction on the skin mask and selection of the hand candidate.
use image::{GrayImage, imageops};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::contour_area;
use imageproc::point::Point;

/// Closed boundary of one mask region, with straight runs collapsed to their endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area (absolute value, in px²).
    pub fn area(&self) -> f64 {
        contour_area(&self.points)
    }
}

/// Outermost borders only: hole borders and anything nested inside a hole are dropped.
///
/// The tracer mislabels a region whose first pixel sits in column 0 as a hole, so the
/// mask is traced inside a one pixel background frame and the points shifted back.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut framed, mask, 1, 1);
    find_contours::<i32>(&framed)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let points: Vec<Point<i32>> =
                c.points.iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect();
            Contour::new(simplify_chain(&points))
        })
        .collect()
}

/// Drop every vertex that lies strictly inside a straight run (horizontal, vertical,
/// diagonal or otherwise), treating the chain as closed.
pub fn simplify_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        if cur == prev {
            continue;
        }
        let (ax, ay) = (cur.x - prev.x, cur.y - prev.y);
        let (bx, by) = (next.x - cur.x, next.y - cur.y);
        let collinear = ax * by - ay * bx == 0;
        let forward = ax * bx + ay * by > 0;
        if !(collinear && forward) {
            out.push(cur);
        }
    }
    if out.is_empty() {
        // every vertex sat on one line through a closed chain; keep the first as the anchor
        out.push(points[0]);
    }
    out
}

/// Pick the contour enclosing the most area. Ties go to the earliest contour in
/// tracing order, which carries no meaning beyond being stable.
pub fn largest(contours: Vec<Contour>) -> Option<Contour> {
    let mut best: Option<(f64, Contour)> = None;
    for c in contours {
        let area = c.area();
        if best.as_ref().is_none_or(|(best_area, _)| area > *best_area) {
            best = Some((area, c));
        }
    }
    best.map(|(_, c)| c)
}
