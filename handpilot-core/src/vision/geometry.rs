// File: handpilot-core/src/vision/geometry.rs
//
// Contour geometry used by the finger-valley heuristic. Contours are the
// point lists produced by `imageproc::contours::find_contours`; area and
// hull come from `imageproc::geometry`, defects are computed here.

use std::collections::HashMap;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

/// One convexity defect. `start` and `end` are consecutive hull vertices,
/// `far` is the contour point between them farthest from the hull edge.
/// All three are indices into the contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defect {
    pub start: usize,
    pub end: usize,
    pub far: usize,
    pub depth: f64,
}

/// Convex hull of a contour as indices into `points`, sorted in contour
/// order. Each hull vertex maps to its first occurrence in the contour;
/// collinear and duplicate points are dropped.
pub fn convex_hull_indices(points: &[Point<i32>]) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return (0..n).collect();
    }

    // Graham's comparator needs distinct points to stay a total order.
    let mut distinct = points.to_vec();
    distinct.sort_unstable_by_key(|p| (p.x, p.y));
    distinct.dedup();

    let mut first_seen: HashMap<(i32, i32), usize> = HashMap::with_capacity(n);
    for (i, p) in points.iter().enumerate() {
        first_seen.entry((p.x, p.y)).or_insert(i);
    }

    let mut hull: Vec<usize> = convex_hull(distinct)
        .into_iter()
        .filter_map(|p| first_seen.get(&(p.x, p.y)).copied())
        .collect();
    hull.sort_unstable();
    hull.dedup();
    hull
}

/// Convexity defects between each pair of consecutive hull indices
/// (wrapping around). Hull edges with no contour point strictly off the
/// edge yield no defect.
pub fn convexity_defects(points: &[Point<i32>], hull: &[usize]) -> Vec<Defect> {
    let n = points.len();
    let mut defects = Vec::new();
    if hull.len() < 3 || n < 4 {
        return defects;
    }

    for (k, &start) in hull.iter().enumerate() {
        let end = hull[(k + 1) % hull.len()];
        let p0 = points[start];
        let p1 = points[end];
        let dx0 = (p1.x - p0.x) as f64;
        let dy0 = (p1.y - p0.y) as f64;
        let len = dx0.hypot(dy0);
        let scale = if len == 0.0 { 0.0 } else { 1.0 / len };

        let mut deepest: Option<usize> = None;
        let mut depth = 0.0;
        let mut j = start;
        loop {
            j = (j + 1) % n;
            if j == end {
                break;
            }
            let dx = (points[j].x - p0.x) as f64;
            let dy = (points[j].y - p0.y) as f64;
            let dist = (-dy0 * dx + dx0 * dy).abs() * scale;
            if dist > depth {
                depth = dist;
                deepest = Some(j);
            }
        }

        if let Some(far) = deepest {
            defects.push(Defect { start, end, far, depth });
        }
    }
    defects
}

fn distance(a: Point<i32>, b: Point<i32>) -> f64 {
    ((a.x - b.x) as f64).hypot((a.y - b.y) as f64)
}

/// Interior angle (radians) at `far` of the triangle `(start, far, end)`,
/// by the law of cosines. `None` when a side adjacent to `far` has zero length.
pub fn valley_angle(start: Point<i32>, end: Point<i32>, far: Point<i32>) -> Option<f64> {
    let a = distance(end, start);
    let b = distance(far, start);
    let c = distance(end, far);
    if b == 0.0 || c == 0.0 {
        return None;
    }
    let cos = ((b * b + c * c - a * a) / (2.0 * b * c)).clamp(-1.0, 1.0);
    Some(cos.acos())
}
