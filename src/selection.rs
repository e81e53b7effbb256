//! Interactive selection and drag state machine over the path's control
//! points. Per-gesture state: created on pointer press, cleared at gesture
//! end or on `clear()`.

use crate::model::{PointId, SelectionPoint, Vec2};
use crate::PathModel;

/// Snap grid used while the coarse modifier is held.
pub const SNAP_GRID: f32 = 10.0;

/// Modifier keys affecting the drag delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DragModifiers {
    /// Snap to multiples of `SNAP_GRID` instead of whole units.
    pub coarse: bool,
    /// Zero the X component of the delta.
    pub lock_x: bool,
    /// Zero the Y component of the delta.
    pub lock_y: bool,
}

/// Snap a drag delta: grid-of-10 under the coarse modifier, whole units
/// otherwise; the two axis locks zero their component independently.
pub fn snap_delta(delta: Vec2, mods: DragModifiers) -> Vec2 {
    let grid = if mods.coarse { SNAP_GRID } else { 1.0 };
    let mut out = Vec2 {
        x: (delta.x / grid).round() * grid,
        y: (delta.y / grid).round() * grid,
    };
    if mods.lock_x {
        out.x = 0.0;
    }
    if mods.lock_y {
        out.y = 0.0;
    }
    out
}

#[derive(Default)]
pub struct SelectionManipulator {
    single: Vec<SelectionPoint>,
    /// Populated only when the picked anchor is an edit point: its path-order
    /// neighbor handles, dragged along to keep tangents visually attached.
    neighbors: Vec<SelectionPoint>,
    multi: Vec<SelectionPoint>,
    drag_anchor: Vec2,
    rect_anchor: Vec2,
    rect: (Vec2, Vec2),
    multi_selecting: bool,
    moving: bool,
}

impl SelectionManipulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_multi_selecting(&self) -> bool {
        self.multi_selecting
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn multi_select_rect(&self) -> (Vec2, Vec2) {
        self.rect
    }

    /// Every selected point id, single anchor first, then auto-added
    /// neighbors, then rectangle members; no duplicates.
    pub fn selected_ids(&self) -> Vec<PointId> {
        let mut ids = Vec::new();
        for sp in self
            .single
            .iter()
            .chain(self.neighbors.iter())
            .chain(self.multi.iter())
        {
            if !ids.contains(&sp.id) {
                ids.push(sp.id);
            }
        }
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.single.is_empty() && self.neighbors.is_empty() && self.multi.is_empty()
    }

    // --- single selection ---

    /// Select one control point. When it is an edit point, its path-order
    /// predecessor and successor control vertices are auto-added so a drag
    /// moves the adjacent handles too (wrapping only on a closed path).
    pub fn add_single_control_point_smartly(&mut self, model: &PathModel, id: PointId) {
        let Some(point) = model.point(id) else { return };
        self.push_unique_single(SelectionPoint { id, start: point.pos });
        if point.role.is_edit_point() {
            let (pred, succ) = model.neighbors_of_edit_point(id);
            for n in [pred, succ].into_iter().flatten() {
                if let Some(pos) = model.point_pos(n) {
                    self.push_unique_neighbor(SelectionPoint { id: n, start: pos });
                }
            }
        }
    }

    fn push_unique_single(&mut self, sp: SelectionPoint) {
        if !self.single.iter().any(|s| s.id == sp.id) {
            self.single.push(sp);
        }
    }

    fn push_unique_neighbor(&mut self, sp: SelectionPoint) {
        if !self.neighbors.iter().any(|s| s.id == sp.id) {
            self.neighbors.push(sp);
        }
    }

    // --- rectangle selection ---

    pub fn start_multi_selection(&mut self, p: Vec2) {
        self.rect_anchor = p;
        self.rect = (p, p);
        self.multi_selecting = true;
        self.multi.clear();
    }

    /// Recompute the rectangle and its membership from scratch; selection is
    /// not incremental, so shrinking the rectangle drops points again.
    pub fn update_multi_selection(&mut self, model: &PathModel, p: Vec2) {
        if !self.multi_selecting {
            return;
        }
        let min = Vec2::new(self.rect_anchor.x.min(p.x), self.rect_anchor.y.min(p.y));
        let max = Vec2::new(self.rect_anchor.x.max(p.x), self.rect_anchor.y.max(p.y));
        self.rect = (min, max);
        self.multi.clear();
        for (id, point) in model.live_points() {
            let pos = point.pos;
            if pos.x >= min.x && pos.x <= max.x && pos.y >= min.y && pos.y <= max.y {
                self.multi.push(SelectionPoint { id, start: pos });
            }
        }
    }

    /// Stop rubber-banding; the membership persists until `clear()`.
    pub fn end_multi_selection(&mut self) {
        self.multi_selecting = false;
    }

    // --- dragging ---

    pub fn start_moving(&mut self, p: Vec2) {
        self.drag_anchor = p;
        self.moving = true;
    }

    /// Apply `start + snapped delta` to every selected point. Returns the
    /// ids that were actually repositioned, for the caller's write-back.
    pub fn update_moving(
        &mut self,
        model: &mut PathModel,
        p: Vec2,
        mods: DragModifiers,
    ) -> Vec<PointId> {
        if !self.moving {
            return Vec::new();
        }
        let delta = snap_delta(p - self.drag_anchor, mods);
        let mut moved = Vec::new();
        for sp in self
            .single
            .iter()
            .chain(self.neighbors.iter())
            .chain(self.multi.iter())
        {
            if moved.contains(&sp.id) {
                continue;
            }
            if model.set_point_pos(sp.id, sp.start + delta) {
                moved.push(sp.id);
            }
        }
        moved
    }

    /// Finish the drag: re-baseline every start position to the current
    /// coordinate so a subsequent drag starts fresh. Selection stays intact.
    pub fn end_moving(&mut self, model: &PathModel) {
        for sp in self
            .single
            .iter_mut()
            .chain(self.neighbors.iter_mut())
            .chain(self.multi.iter_mut())
        {
            if let Some(pos) = model.point_pos(sp.id) {
                sp.start = pos;
            }
        }
        self.moving = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_units_and_grid() {
        let d = Vec2::new(12.4, -3.6);
        let plain = snap_delta(d, DragModifiers::default());
        assert_eq!(plain, Vec2::new(12.0, -4.0));

        let coarse = snap_delta(d, DragModifiers { coarse: true, ..Default::default() });
        assert_eq!(coarse, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn snap_axis_locks_combine() {
        let d = Vec2::new(7.2, 9.9);
        let x_locked = snap_delta(d, DragModifiers { lock_x: true, ..Default::default() });
        assert_eq!(x_locked, Vec2::new(0.0, 10.0));
        let both = snap_delta(
            d,
            DragModifiers { lock_x: true, lock_y: true, ..Default::default() },
        );
        assert_eq!(both, Vec2::ZERO);
    }
}
