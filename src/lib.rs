//! Interactive cubic-Bézier path editing engine.
//!
//! A path arrives as a heterogeneous sequence of declarative primitives
//! (lines, quadratics, cubics plus attribute/percent markers), is normalized
//! into a uniform cubic representation owned by [`PathModel`], edited through
//! picking/selection/dragging and structural commands, and exported back,
//! degenerating each cubic to a line or quad again whenever that is
//! geometrically exact.

pub mod model;
pub mod document;
pub mod selection;
pub mod controller;
pub mod geometry {
    pub mod cubic;
    pub mod math;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod picking;
}

use document::{CommitError, Document, Element, ElementKind, NodeHandle};
use geometry::cubic::CubicBezier;
use geometry::math::direction_or;
use geometry::tolerance::EPS_POS;
use indexmap::IndexMap;
use model::{AnchorSlot, ControlPoint, CubicSegment, PointId, PointRole, Vec2};

/// Distance the end point is pushed past the start when a closed path is
/// re-opened, so the broken join is visible and pickable.
pub const REOPEN_OFFSET: f32 = 10.0;

/// The ordered sequence of cubic segments forming the editable path.
///
/// Control points live in an arena; segments reference them by index, so the
/// shared-endpoint invariant `segments[i].P3 == segments[i+1].P0` is an index
/// equality and survives serialization. Points and segments are rebuilt
/// wholesale on every import.
#[derive(Default)]
pub struct PathModel {
    pub(crate) points: Vec<Option<ControlPoint>>,
    pub(crate) segments: Vec<CubicSegment>,
    pub(crate) trailing_attrs: IndexMap<String, f32>,
    pub(crate) trailing_percent: Option<f32>,
}

impl PathModel {
    pub fn new() -> Self {
        Self::default()
    }

    // --- arena ---

    fn alloc_point(&mut self, cp: ControlPoint) -> PointId {
        let id = self.points.len() as PointId;
        self.points.push(Some(cp));
        id
    }

    fn free_point(&mut self, id: PointId) {
        if let Some(slot) = self.points.get_mut(id as usize) {
            *slot = None;
        }
    }

    pub fn point(&self, id: PointId) -> Option<&ControlPoint> {
        self.points.get(id as usize).and_then(|p| p.as_ref())
    }

    pub(crate) fn point_mut(&mut self, id: PointId) -> Option<&mut ControlPoint> {
        self.points.get_mut(id as usize).and_then(|p| p.as_mut())
    }

    pub fn point_pos(&self, id: PointId) -> Option<Vec2> {
        self.point(id).map(|p| p.pos)
    }

    pub fn set_point_pos(&mut self, id: PointId, pos: Vec2) -> bool {
        if !pos.x.is_finite() || !pos.y.is_finite() {
            return false;
        }
        match self.point_mut(id) {
            Some(p) => {
                p.pos = pos;
                true
            }
            None => false,
        }
    }

    /// All live control points, in arena order (which is path order for an
    /// unedited import).
    pub fn live_points(&self) -> impl Iterator<Item = (PointId, &ControlPoint)> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|p| (i as PointId, p)))
    }

    pub fn point_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    fn point_referenced(&self, id: PointId) -> bool {
        self.segments.iter().any(|s| s.points.contains(&id))
    }

    // --- segments ---

    pub fn segments(&self) -> &[CubicSegment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment_bezier(&self, idx: usize) -> Option<CubicBezier> {
        let seg = self.segments.get(idx)?;
        Some(CubicBezier::new(
            self.point_pos(seg.p0())?,
            self.point_pos(seg.p1())?,
            self.point_pos(seg.p2())?,
            self.point_pos(seg.p3())?,
        ))
    }

    /// Closed iff the first segment's start and the last segment's end are the
    /// same point identity (the merged `StartAndEnd` point). A model with zero
    /// segments is never closed.
    pub fn is_closed(&self) -> bool {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => first.p0() == last.p3(),
            _ => false,
        }
    }

    /// Axis-aligned bounds over all live control points.
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut iter = self.live_points().map(|(_, p)| p.pos);
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Path-order neighbor control vertices of an edit point: the second
    /// handle of the segment ending here and the first handle of the segment
    /// starting here. On a closed path the merged identity wraps the join.
    pub fn neighbors_of_edit_point(&self, id: PointId) -> (Option<PointId>, Option<PointId>) {
        let mut pred = None;
        let mut succ = None;
        for seg in &self.segments {
            if seg.p3() == id {
                pred = Some(seg.p2());
            }
            if seg.p0() == id {
                succ = Some(seg.p1());
            }
        }
        (pred, succ)
    }

    // --- import ---

    /// Build a model from the ordered children of the path container.
    ///
    /// Attribute/percent elements accumulate onto the next geometry element;
    /// leftovers become trailing data. Malformed primitives are logged and
    /// skipped. A coordinate-coincident first/last endpoint is merged into a
    /// single `StartAndEnd` identity.
    pub fn import(doc: &dyn Document) -> PathModel {
        let mut m = PathModel::new();
        let mut pending_attrs: IndexMap<String, f32> = IndexMap::new();
        let mut pending_percent: Option<f32> = None;
        let mut prev_end: Option<PointId> = None;

        for (node, el) in doc.children() {
            // Pull every required numeric property up front; one missing
            // value invalidates the whole element.
            let mut vals = Vec::with_capacity(el.kind.required_props().len());
            let mut missing = None;
            for key in el.kind.required_props() {
                match el.get(key) {
                    Some(v) => vals.push(v),
                    None => {
                        missing = Some(*key);
                        break;
                    }
                }
            }
            if let Some(key) = missing {
                log::warn!(
                    "skipping malformed {:?} element: missing numeric property '{}'",
                    el.kind,
                    key
                );
                continue;
            }
            match el.kind {
                ElementKind::Path => {
                    if prev_end.is_some() {
                        log::warn!("skipping duplicate path header");
                        continue;
                    }
                    let mut start =
                        ControlPoint::new(Vec2::new(vals[0], vals[1]), PointRole::Start);
                    start.path_anchor = Some(node);
                    prev_end = Some(m.alloc_point(start));
                }
                ElementKind::Attribute => {
                    let Some(name) = el.name.clone() else {
                        log::warn!("skipping attribute element without a name");
                        continue;
                    };
                    pending_attrs.insert(name, vals[0]);
                }
                ElementKind::Percent => {
                    pending_percent = Some(vals[0]);
                }
                ElementKind::Line | ElementKind::Quad | ElementKind::Cubic => {
                    let Some(p0_id) = prev_end else {
                        log::warn!("skipping {:?} element before the path header", el.kind);
                        continue;
                    };
                    let p0 = m.point_pos(p0_id).unwrap_or(Vec2::ZERO);
                    let (p1, p2, p3) = match el.kind {
                        ElementKind::Line => {
                            let target = Vec2::new(vals[0], vals[1]);
                            let d = target - p0;
                            (p0 + d * (1.0 / 3.0), p0 + d * (2.0 / 3.0), target)
                        }
                        ElementKind::Quad => {
                            let q = Vec2::new(vals[0], vals[1]);
                            let target = Vec2::new(vals[2], vals[3]);
                            (
                                p0 + (q - p0) * (2.0 / 3.0),
                                target + (q - target) * (2.0 / 3.0),
                                target,
                            )
                        }
                        _ => (
                            Vec2::new(vals[0], vals[1]),
                            Vec2::new(vals[2], vals[3]),
                            Vec2::new(vals[4], vals[5]),
                        ),
                    };
                    let mut cp1 = ControlPoint::new(p1, PointRole::FirstControl);
                    cp1.seg_anchor = Some((node, AnchorSlot::Control1));
                    let mut cp2 = ControlPoint::new(p2, PointRole::SecondControl);
                    cp2.seg_anchor = Some((node, AnchorSlot::Control2));
                    let mut cp3 = ControlPoint::new(p3, PointRole::End);
                    cp3.seg_anchor = Some((node, AnchorSlot::End));
                    let p1_id = m.alloc_point(cp1);
                    let p2_id = m.alloc_point(cp2);
                    let p3_id = m.alloc_point(cp3);
                    m.segments.push(CubicSegment {
                        points: [p0_id, p1_id, p2_id, p3_id],
                        attrs: std::mem::take(&mut pending_attrs),
                        percent: pending_percent.take(),
                        node,
                    });
                    prev_end = Some(p3_id);
                }
                ElementKind::Other => {}
            }
        }

        m.trailing_attrs = pending_attrs;
        m.trailing_percent = pending_percent;
        m.detect_closed();
        m
    }

    fn detect_closed(&mut self) {
        let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) else {
            return;
        };
        let (start_id, end_id) = (first.p0(), last.p3());
        if start_id == end_id {
            return;
        }
        let (Some(a), Some(b)) = (self.point_pos(start_id), self.point_pos(end_id)) else {
            return;
        };
        if !a.approx_eq(b, EPS_POS) {
            return;
        }
        // Merge: the start point takes over the end point's identity and both
        // write-back anchors.
        let end_anchor = self.point(end_id).and_then(|p| p.seg_anchor);
        if let Some(start) = self.point_mut(start_id) {
            start.role = PointRole::StartAndEnd;
            start.seg_anchor = end_anchor;
        }
        self.free_point(end_id);
        let last_idx = self.segments.len() - 1;
        self.segments[last_idx].points[3] = start_id;
    }

    // --- export ---

    /// Regenerate the document's child list, degenerating each segment to the
    /// simplest geometrically exact primitive (line, then quad, then cubic).
    pub fn export(&mut self, doc: &mut dyn Document) -> Result<(), CommitError> {
        self.export_with(doc, false)
    }

    /// Forced-cubic export: always emits `Cubic` elements so in-memory segment
    /// identities stay stable across a structural edit.
    pub fn export_canonical(&mut self, doc: &mut dyn Document) -> Result<(), CommitError> {
        self.export_with(doc, true)
    }

    fn export_with(&mut self, doc: &mut dyn Document, force_cubic: bool) -> Result<(), CommitError> {
        doc.begin_transaction();

        let mut order: Vec<NodeHandle> = Vec::new();
        let mut seg_nodes: Vec<NodeHandle> = Vec::with_capacity(self.segments.len());
        let mut path_node = None;

        if let Some(first) = self.segments.first() {
            let start = self.point_pos(first.p0()).unwrap_or(Vec2::ZERO);
            let node = doc.create_element(Element::path(start.x, start.y));
            order.push(node);
            path_node = Some(node);

            for idx in 0..self.segments.len() {
                for (name, value) in &self.segments[idx].attrs {
                    order.push(doc.create_element(Element::attribute(name, *value)));
                }
                if let Some(p) = self.segments[idx].percent {
                    order.push(doc.create_element(Element::percent(p)));
                }
                let bez = match self.segment_bezier(idx) {
                    Some(b) => b,
                    None => continue,
                };
                let el = if !force_cubic && bez.can_be_line() {
                    Element::line(bez.p3.x, bez.p3.y)
                } else if !force_cubic && bez.can_be_quad() {
                    let q = bez.quad_control_point();
                    Element::quad(q.x, q.y, bez.p3.x, bez.p3.y)
                } else {
                    Element::cubic(bez.p1.x, bez.p1.y, bez.p2.x, bez.p2.y, bez.p3.x, bez.p3.y)
                };
                let node = doc.create_element(el);
                order.push(node);
                seg_nodes.push(node);
            }

            for (name, value) in &self.trailing_attrs {
                order.push(doc.create_element(Element::attribute(name, *value)));
            }
            if let Some(p) = self.trailing_percent {
                order.push(doc.create_element(Element::percent(p)));
            }
        }

        doc.replace_children(order);
        doc.commit()?;

        // Only after a successful commit: rebind every back-reference to the
        // freshly created nodes. On failure the model stays as-is and the
        // caller resynchronizes with a full re-import.
        for slot in self.points.iter_mut().flatten() {
            slot.path_anchor = None;
            slot.seg_anchor = None;
        }
        for (idx, node) in seg_nodes.into_iter().enumerate() {
            self.segments[idx].node = node;
            let [_, p1, p2, p3] = self.segments[idx].points;
            if let Some(p) = self.point_mut(p1) {
                p.seg_anchor = Some((node, AnchorSlot::Control1));
            }
            if let Some(p) = self.point_mut(p2) {
                p.seg_anchor = Some((node, AnchorSlot::Control2));
            }
            if let Some(p) = self.point_mut(p3) {
                p.seg_anchor = Some((node, AnchorSlot::End));
            }
        }
        if let (Some(node), Some(first)) = (path_node, self.segments.first()) {
            let p0 = first.p0();
            if let Some(p) = self.point_mut(p0) {
                p.path_anchor = Some(node);
            }
        }
        Ok(())
    }

    /// Geometry-only write-back of one point through its anchors. Returns
    /// false when the point is gone, unanchored, or a handle went stale.
    pub fn write_point_back(&self, doc: &mut dyn Document, id: PointId) -> bool {
        let Some(p) = self.point(id) else { return false };
        let mut wrote = false;
        let mut ok = true;
        if let Some(node) = p.path_anchor {
            ok &= doc.set_numeric_property(node, "startX", p.pos.x);
            ok &= doc.set_numeric_property(node, "startY", p.pos.y);
            wrote = true;
        }
        if let Some((node, slot)) = p.seg_anchor {
            let (px, py) = slot.prop_names();
            ok &= doc.set_numeric_property(node, px, p.pos.x);
            ok &= doc.set_numeric_property(node, py, p.pos.y);
            wrote = true;
        }
        wrote && ok
    }

    // --- structural edits ---

    /// Merge or break the start/end join. Returns false when already in the
    /// requested state (idempotent) or the model is empty.
    pub fn toggle_closed(&mut self, want_closed: bool) -> bool {
        if self.segments.is_empty() || self.is_closed() == want_closed {
            return false;
        }
        let last_idx = self.segments.len() - 1;
        let start_id = self.segments[0].p0();
        if want_closed {
            let end_id = self.segments[last_idx].p3();
            let end_anchor = self.point(end_id).and_then(|p| p.seg_anchor);
            self.free_point(end_id);
            if let Some(start) = self.point_mut(start_id) {
                start.role = PointRole::StartAndEnd;
                start.seg_anchor = end_anchor;
            }
            self.segments[last_idx].points[3] = start_id;
        } else {
            let joint_pos = self.point_pos(start_id).unwrap_or(Vec2::ZERO);
            let last_p0_pos = self
                .point_pos(self.segments[last_idx].p0())
                .unwrap_or(Vec2::ZERO);
            let dir = direction_or(last_p0_pos, joint_pos, Vec2::new(1.0, 0.0));
            let seg_anchor = match self.point_mut(start_id) {
                Some(joint) => {
                    joint.role = PointRole::Start;
                    joint.seg_anchor.take()
                }
                None => None,
            };
            let mut end = ControlPoint::new(joint_pos + dir * REOPEN_OFFSET, PointRole::End);
            end.seg_anchor = seg_anchor;
            let end_id = self.alloc_point(end);
            self.segments[last_idx].points[3] = end_id;
        }
        log::debug!("toggle_closed({}) applied", want_closed);
        true
    }

    /// Remove an edit point. One containing segment: the segment is deleted.
    /// Two (interior or closing join): the neighbors merge into
    /// `(A.P0, A.P1, B.P2, B.P3)`, discarding the removed point's control
    /// information. Anything else is a no-op.
    pub fn remove_edit_point(&mut self, id: PointId) -> bool {
        match self.point(id) {
            Some(p) if p.role.is_edit_point() => {}
            _ => return false,
        }
        let enders: Vec<usize> = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.p3() == id)
            .map(|(i, _)| i)
            .collect();
        let starters: Vec<usize> = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.p0() == id)
            .map(|(i, _)| i)
            .collect();

        match (enders.as_slice(), starters.as_slice()) {
            ([idx], []) | ([], [idx]) => {
                let seg = self.segments.remove(*idx);
                self.free_point(seg.p1());
                self.free_point(seg.p2());
                for end in [seg.p0(), seg.p3()] {
                    if !self.point_referenced(end) {
                        self.free_point(end);
                    }
                }
                self.fix_endpoint_roles();
                log::debug!("removed edit point {} with its only segment", id);
                true
            }
            ([a_idx], [b_idx]) => {
                let a = self.segments[*a_idx].clone();
                let b = self.segments[*b_idx].clone();
                let merged = CubicSegment {
                    points: [a.p0(), a.p1(), b.p2(), b.p3()],
                    attrs: a.attrs.clone(),
                    percent: a.percent,
                    node: a.node,
                };
                self.free_point(id);
                self.free_point(a.p2());
                self.free_point(b.p1());
                self.segments[*a_idx] = merged;
                self.segments.remove(*b_idx);
                self.fix_endpoint_roles();
                log::debug!("merged segments across removed edit point {}", id);
                true
            }
            _ => false,
        }
    }

    fn fix_endpoint_roles(&mut self) {
        if self.is_closed() {
            if let Some(first) = self.segments.first() {
                let p0 = first.p0();
                if let Some(p) = self.point_mut(p0) {
                    p.role = PointRole::StartAndEnd;
                }
            }
            return;
        }
        if let Some(first) = self.segments.first() {
            let p0 = first.p0();
            if let Some(p) = self.point_mut(p0) {
                p.role = PointRole::Start;
            }
        }
        if let Some(last) = self.segments.last() {
            let p3 = last.p3();
            if let Some(p) = self.point_mut(p3) {
                p.role = PointRole::End;
            }
        }
    }

    /// Replace segment `idx` with its De Casteljau halves at `t`; the split
    /// point becomes a new shared edit point. The left half keeps the
    /// original attrs/percent, the right half starts clean.
    pub fn split_segment(&mut self, idx: usize, t: f32) -> bool {
        if !(t > 0.0 && t < 1.0) {
            return false;
        }
        let Some(bez) = self.segment_bezier(idx) else { return false };
        let (left, right) = bez.split(t);

        let old = self.segments[idx].clone();
        self.free_point(old.p1());
        self.free_point(old.p2());

        let a = self.alloc_point(ControlPoint::new(left.p1, PointRole::FirstControl));
        let d = self.alloc_point(ControlPoint::new(left.p2, PointRole::SecondControl));
        let m = self.alloc_point(ControlPoint::new(left.p3, PointRole::End));
        let e = self.alloc_point(ControlPoint::new(right.p1, PointRole::FirstControl));
        let c = self.alloc_point(ControlPoint::new(right.p2, PointRole::SecondControl));

        self.segments[idx] = CubicSegment {
            points: [old.p0(), a, d, m],
            attrs: old.attrs.clone(),
            percent: old.percent,
            node: old.node,
        };
        self.segments.insert(
            idx + 1,
            CubicSegment {
                points: [m, e, c, old.p3()],
                attrs: IndexMap::new(),
                percent: None,
                node: old.node,
            },
        );
        log::debug!("split segment {} at t={}", idx, t);
        true
    }

    /// Cosmetic straightening: reposition the handles 30% in from either
    /// endpoint. The segment stays a true cubic.
    pub fn straighten_segment(&mut self, idx: usize) -> bool {
        let Some(seg) = self.segments.get(idx) else { return false };
        let [p0, p1, p2, p3] = seg.points;
        let (Some(a), Some(b)) = (self.point_pos(p0), self.point_pos(p3)) else {
            return false;
        };
        let (h1, h2) = CubicBezier::straight_handles(a, b);
        self.set_point_pos(p1, h1) && self.set_point_pos(p2, h2)
    }
}
