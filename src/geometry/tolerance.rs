// Centralized tolerances and helpers for robust geometry

pub const EPS_POS: f32 = 1e-4;       // endpoint coincidence threshold (px)
pub const EPS_LEN: f32 = 1e-6;       // zero-length vector threshold
pub const EPS_DEGEN: f32 = 1e-3;     // line/quad degeneracy residual threshold

#[inline] pub fn near_zero(x: f32, eps: f32) -> bool { x.abs() <= eps }
