use crate::document::NodeHandle;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Fuzzy coordinate equality; exact float comparison is never used for geometry.
    pub fn approx_eq(self, other: Vec2, eps: f32) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2 { x: self.x * s, y: self.y * s }
    }
}

/// Index into the `PathModel` point arena. Identity equality is index equality.
pub type PointId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointRole {
    Start,
    FirstControl,
    SecondControl,
    End,
    /// Merged start/end identity of a closed path.
    StartAndEnd,
}

impl PointRole {
    /// Edit points are the path-visible endpoints, as opposed to Bézier handles.
    pub fn is_edit_point(self) -> bool {
        matches!(self, PointRole::Start | PointRole::End | PointRole::StartAndEnd)
    }
}

/// Which property pair of the owning segment node a point writes into. The
/// path header's `startX`/`startY` pair is addressed by `path_anchor` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorSlot {
    Control1,
    Control2,
    End,
}

impl AnchorSlot {
    pub fn prop_names(self) -> (&'static str, &'static str) {
        match self {
            AnchorSlot::Control1 => ("control1X", "control1Y"),
            AnchorSlot::Control2 => ("control2X", "control2Y"),
            AnchorSlot::End => ("x", "y"),
        }
    }
}

/// A tagged 2D point of the editable path.
///
/// The anchors are weak back-references into the document: lookup-only handles
/// revalidated on every write, never live pointers. A merged closing point
/// carries both (it writes the path start and the last segment's endpoint).
#[derive(Clone, Copy, Debug)]
pub struct ControlPoint {
    pub pos: Vec2,
    pub role: PointRole,
    pub path_anchor: Option<NodeHandle>,
    pub seg_anchor: Option<(NodeHandle, AnchorSlot)>,
}

impl ControlPoint {
    pub fn new(pos: Vec2, role: PointRole) -> Self {
        ControlPoint { pos, role, path_anchor: None, seg_anchor: None }
    }
}

/// One cubic Bézier segment of the path, in canonical form.
///
/// `points[0]` is shared with the previous segment's `points[3]` by identity.
#[derive(Clone, Debug)]
pub struct CubicSegment {
    pub points: [PointId; 4],
    /// Named numeric attributes attached to this segment, preserved verbatim
    /// in document order.
    pub attrs: IndexMap<String, f32>,
    pub percent: Option<f32>,
    /// Document node this segment was read from / last written to.
    pub node: NodeHandle,
}

impl CubicSegment {
    pub fn p0(&self) -> PointId { self.points[0] }
    pub fn p1(&self) -> PointId { self.points[1] }
    pub fn p2(&self) -> PointId { self.points[2] }
    pub fn p3(&self) -> PointId { self.points[3] }
}

/// A control point captured at drag start, used to compute per-point deltas.
#[derive(Clone, Copy, Debug)]
pub struct SelectionPoint {
    pub id: PointId,
    pub start: Vec2,
}
