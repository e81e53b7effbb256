use crate::model::Vec2;

/// Linear interpolation between two points.
#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    Vec2 {
        x: a.x + t * (b.x - a.x),
        y: a.y + t * (b.y - a.y),
    }
}

#[inline]
pub fn dist_sq(a: Vec2, b: Vec2) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dx * dx + dy * dy
}

/// Unit vector from `a` toward `b`, or `fallback` when the two coincide.
pub fn direction_or(a: Vec2, b: Vec2, fallback: Vec2) -> Vec2 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= super::tolerance::EPS_LEN {
        fallback
    } else {
        Vec2 { x: dx / len, y: dy / len }
    }
}
