//! Cubic Bézier curve utilities: evaluation, subdivision, coarse distance
//! search, and the degeneracy checks used to export lines/quads losslessly.

use super::math::{dist_sq, lerp};
use super::tolerance::{near_zero, EPS_DEGEN};
use crate::model::Vec2;

/// Sample count for the coarse point-to-curve distance search (t = 0, 0.1, … 1).
/// Deliberately coarse: it only has to disambiguate "near this segment" for
/// context actions, not find the true foot point. Tunable, not a contract.
pub const DISTANCE_SAMPLES: u32 = 10;

/// Handle placement factor for cosmetic straightening.
const STRAIGHTEN_FRACTION: f32 = 0.3;

/// Control points of a cubic Bézier curve.
#[derive(Clone, Copy, Debug)]
pub struct CubicBezier {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Evaluate the curve at parameter t ∈ [0, 1] (Bernstein form).
    pub fn eval(&self, t: f32) -> Vec2 {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        Vec2 {
            x: mt3 * self.p0.x + 3.0 * mt2 * t * self.p1.x + 3.0 * mt * t2 * self.p2.x + t3 * self.p3.x,
            y: mt3 * self.p0.y + 3.0 * mt2 * t * self.p1.y + 3.0 * mt * t2 * self.p2.y + t3 * self.p3.y,
        }
    }

    /// Coarse minimum distance from `p` to the curve.
    ///
    /// Samples `DISTANCE_SAMPLES + 1` parameters and returns the smallest
    /// Euclidean distance together with the parameter that produced it.
    pub fn min_distance(&self, p: Vec2) -> (f32, f32) {
        let mut best_d2 = f32::INFINITY;
        let mut best_t = 0.0;
        for i in 0..=DISTANCE_SAMPLES {
            let t = i as f32 / DISTANCE_SAMPLES as f32;
            let d2 = dist_sq(p, self.eval(t));
            if d2 < best_d2 {
                best_d2 = d2;
                best_t = t;
            }
        }
        (best_d2.sqrt(), best_t)
    }

    /// True iff the control polygon collapses to the unique quadratic with the
    /// same endpoints and tangents: 3·P1 − 3·P2 + P3 − P0 vanishes.
    pub fn can_be_quad(&self) -> bool {
        let vx = 3.0 * self.p1.x - 3.0 * self.p2.x + self.p3.x - self.p0.x;
        let vy = 3.0 * self.p1.y - 3.0 * self.p2.y + self.p3.y - self.p0.y;
        near_zero(vx, EPS_DEGEN) && near_zero(vy, EPS_DEGEN)
    }

    /// True iff the cubic degenerates fully to a straight line: quad-convertible
    /// and the second-derivative term 3·P1 − 6·P2 + 3·P3 vanishes as well.
    pub fn can_be_line(&self) -> bool {
        if !self.can_be_quad() {
            return false;
        }
        let vx = 3.0 * self.p1.x - 6.0 * self.p2.x + 3.0 * self.p3.x;
        let vy = 3.0 * self.p1.y - 6.0 * self.p2.y + 3.0 * self.p3.y;
        near_zero(vx, EPS_DEGEN) && near_zero(vy, EPS_DEGEN)
    }

    /// The quadratic control point recovered from the cubic form.
    /// Only meaningful when `can_be_quad()` holds.
    pub fn quad_control_point(&self) -> Vec2 {
        Vec2 {
            x: -0.25 * self.p0.x + 0.75 * self.p1.x + 0.75 * self.p2.x - 0.25 * self.p3.x,
            y: -0.25 * self.p0.y + 0.75 * self.p1.y + 0.75 * self.p2.y - 0.25 * self.p3.y,
        }
    }

    /// Split the curve at parameter t using de Casteljau subdivision.
    ///
    /// Returns the curves for 0..t and t..1; both share the split point `M`.
    pub fn split(&self, t: f32) -> (CubicBezier, CubicBezier) {
        let a = lerp(self.p0, self.p1, t);
        let b = lerp(self.p1, self.p2, t);
        let c = lerp(self.p2, self.p3, t);

        let d = lerp(a, b, t);
        let e = lerp(b, c, t);

        let m = lerp(d, e, t);

        (
            CubicBezier::new(self.p0, a, d, m),
            CubicBezier::new(m, e, c, self.p3),
        )
    }

    /// Handle positions that make the segment visually straight while keeping
    /// it a true cubic: P1 and P2 placed 30% in from either endpoint.
    pub fn straight_handles(p0: Vec2, p3: Vec2) -> (Vec2, Vec2) {
        let chord = p3 - p0;
        (p0 + chord * STRAIGHTEN_FRACTION, p3 - chord * STRAIGHTEN_FRACTION)
    }
}
