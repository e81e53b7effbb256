use crate::model::{PointId, Vec2};
use crate::PathModel;

/// Result of hit-testing a pick position against the path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathPick {
    Point { id: PointId, dist: f32 },
    Segment { index: usize, t: f32, dist: f32 },
}

/// Nearest control point whose position lies within `tol` of `p` on each
/// axis (a box test, not a radial one). Ties go to the lower id, i.e. the
/// earlier point in path order.
pub fn pick_control_point(model: &PathModel, p: Vec2, tol: f32) -> Option<(PointId, f32)> {
    let mut best: Option<(PointId, f32)> = None;
    for (id, point) in model.live_points() {
        let dx = point.pos.x - p.x;
        let dy = point.pos.y - p.y;
        if dx.abs() > tol || dy.abs() > tol {
            continue;
        }
        let d2 = dx * dx + dy * dy;
        if best.map_or(true, |(_, bd)| d2 < bd) {
            best = Some((id, d2));
        }
    }
    best.map(|(id, d2)| (id, d2.sqrt()))
}

/// Like `pick_control_point`, restricted to edit points (path endpoints).
pub fn pick_edit_point(model: &PathModel, p: Vec2, tol: f32) -> Option<(PointId, f32)> {
    let mut best: Option<(PointId, f32)> = None;
    for (id, point) in model.live_points() {
        if !point.role.is_edit_point() {
            continue;
        }
        let dx = point.pos.x - p.x;
        let dy = point.pos.y - p.y;
        if dx.abs() > tol || dy.abs() > tol {
            continue;
        }
        let d2 = dx * dx + dy * dy;
        if best.map_or(true, |(_, bd)| d2 < bd) {
            best = Some((id, d2));
        }
    }
    best.map(|(id, d2)| (id, d2.sqrt()))
}

/// Nearest segment by the coarse sampled curve distance, within `tol`.
/// Returns the segment index, the sample parameter, and the distance.
pub fn pick_segment(model: &PathModel, p: Vec2, tol: f32) -> Option<(usize, f32, f32)> {
    let mut best: Option<(usize, f32, f32)> = None;
    for idx in 0..model.segment_count() {
        let Some(bez) = model.segment_bezier(idx) else { continue };
        let (d, t) = bez.min_distance(p);
        if d > tol {
            continue;
        }
        if best.map_or(true, |(_, _, bd)| d < bd) {
            best = Some((idx, t, d));
        }
    }
    best
}

/// Control points first, then segments; mirrors the pointer-down priority.
pub fn pick(model: &PathModel, p: Vec2, point_tol: f32, segment_tol: f32) -> Option<PathPick> {
    if let Some((id, dist)) = pick_control_point(model, p, point_tol) {
        return Some(PathPick::Point { id, dist });
    }
    if let Some((index, t, dist)) = pick_segment(model, p, segment_tol) {
        return Some(PathPick::Segment { index, t, dist });
    }
    None
}
