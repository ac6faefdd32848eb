//! Hit-testing screen points against scene graphics.
//!
//! Uses the world matrices from the last transform update: the point is
//! mapped into each candidate's local space and tested against its shape.
//! Closed sub-paths are filled even-odd (holes are misses); open sub-paths
//! hit within a small screen tolerance.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::scene::{NodeId, NodeKind, PathShape, Scene};
use crate::transform::{Point, Rect};

/// Screen-space distance within which an open polyline counts as hit.
pub const LINE_HIT_TOLERANCE: f64 = 3.0;

/// Topmost drawable under `screen_pt` among the descendants of `within`.
#[must_use]
pub fn hit_test(scene: &Scene, within: &NodeId, screen_pt: Point) -> Option<NodeId> {
    scene.descendants(within).into_iter().rev().find(|id| hits(scene, id, screen_pt))
}

fn hits(scene: &Scene, id: &NodeId, screen_pt: Point) -> bool {
    let Some(node) = scene.get(id) else {
        return false;
    };
    if node.ignore {
        return false;
    }
    let Some(inverse) = node.world.invert() else {
        return false;
    };
    let local = inverse.apply(screen_pt);

    match &node.kind {
        NodeKind::Path(shape) => {
            let (sx, sy) = node.world.scale();
            let scale = sx.max(sy);
            let tolerance = if scale > 0.0 { LINE_HIT_TOLERANCE / scale } else { LINE_HIT_TOLERANCE };
            path_contains(shape, local, tolerance)
        }
        NodeKind::Image { rect, .. } => rect.contains(local),
        NodeKind::Group | NodeKind::Text { .. } => false,
    }
}

/// Whether `pt` (local space) hits `shape`.
#[must_use]
pub fn path_contains(shape: &PathShape, pt: Point, tolerance: f64) -> bool {
    let Some(bbox) = shape.bounding_rect() else {
        return false;
    };
    let padded = Rect::new(bbox.x - tolerance, bbox.y - tolerance, bbox.width + 2.0 * tolerance, bbox.height + 2.0 * tolerance);
    if !padded.contains(pt) {
        return false;
    }

    let mut inside = false;
    for sub in &shape.subpaths {
        if sub.closed {
            if ring_contains(&sub.points, pt) {
                inside = !inside;
            }
        } else if sub.points.windows(2).any(|w| segment_distance(pt, w[0], w[1]) <= tolerance) {
            return true;
        }
    }
    inside
}

/// Even-odd ray cast against a single ring.
fn ring_contains(ring: &[Point], pt: Point) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > pt.y) != (b.y > pt.y) && pt.x < (b.x - a.x) * (pt.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 { 0.0 } else { (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0) };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    (p.x - cx).hypot(p.y - cy)
}
