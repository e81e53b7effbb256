//! Event routing on top of the model and the selection state machine.
//!
//! The controller is UI-framework free: pointer input arrives as plain
//! [`InputEvent`] values and every consequence the host must apply to its
//! renderer or document shows up as a [`DocumentEffect`]. Structural edits
//! run inside the `updates_suspended` reentrancy guard so a write-back
//! triggered notification cannot recursively re-enter the edit.

use crate::algorithms::picking;
use crate::document::Document;
use crate::model::{PointId, Vec2};
use crate::selection::{DragModifiers, SelectionManipulator};
use crate::PathModel;

/// Per-axis box tolerance for picking a control point, in scene units.
pub const POINT_PICK_TOL: f32 = 10.0;
/// Distance tolerance for picking a segment for context actions.
pub const SEGMENT_PICK_TOL: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Pointer input as a plain value; the host translates its toolkit events.
#[derive(Clone, Copy, Debug)]
pub enum InputEvent {
    PointerDown { pos: Vec2, button: PointerButton },
    PointerMove { pos: Vec2, modifiers: DragModifiers },
    PointerUp { pos: Vec2, button: PointerButton },
}

/// Structural commands, typically chosen from the context menu.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathAction {
    Split { segment: usize, t: f32 },
    Straighten { segment: usize },
    ToggleClosed { closed: bool },
    RemoveEditPoint { point: PointId },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MenuEntry {
    pub action: PathAction,
    pub enabled: bool,
}

/// Consequences for the host to apply to its document/renderer.
#[derive(Clone, Debug, PartialEq)]
pub enum DocumentEffect {
    BoundsChanged { min: Vec2, max: Vec2 },
    Repaint,
    SelectionChanged,
    ShowContextMenu(Vec<MenuEntry>),
    /// A document commit was aborted after the model had already mutated;
    /// the host must re-import (`PathEditor::reload`) to resynchronize.
    ResyncRequired,
}

/// Orchestrates pointer events into selection calls and model mutations for
/// one edited path. Switching paths means building a fresh editor (or
/// calling `reload`); nothing is re-diffed incrementally.
pub struct PathEditor {
    pub model: PathModel,
    pub selection: SelectionManipulator,
    suspended: bool,
}

impl Default for PathEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl PathEditor {
    pub fn new() -> Self {
        PathEditor {
            model: PathModel::new(),
            selection: SelectionManipulator::new(),
            suspended: false,
        }
    }

    pub fn from_document(doc: &dyn Document) -> Self {
        PathEditor {
            model: PathModel::import(doc),
            selection: SelectionManipulator::new(),
            suspended: false,
        }
    }

    /// Rebuild the model from the document. Refused while an edit batch is
    /// in progress (this is the reentry point the guard exists for).
    pub fn reload(&mut self, doc: &dyn Document) -> bool {
        if self.suspended {
            return false;
        }
        self.model = PathModel::import(doc);
        self.selection.clear();
        true
    }

    pub fn updates_suspended(&self) -> bool {
        self.suspended
    }

    /// Host-side batch guard: while set, `reload` and structural actions are
    /// ignored. `apply_action` manages it internally around its own batch.
    pub fn set_updates_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    pub fn handle_event(&mut self, doc: &mut dyn Document, event: InputEvent) -> Vec<DocumentEffect> {
        match event {
            InputEvent::PointerDown { pos, button: PointerButton::Primary } => {
                if let Some((id, _)) = picking::pick_control_point(&self.model, pos, POINT_PICK_TOL)
                {
                    // Pressing an already-selected point drags the whole
                    // selection; a fresh point replaces it.
                    if !self.selection.selected_ids().contains(&id) {
                        self.selection.clear();
                    }
                    self.selection.add_single_control_point_smartly(&self.model, id);
                    self.selection.start_moving(pos);
                } else {
                    self.selection.clear();
                    self.selection.start_multi_selection(pos);
                }
                vec![DocumentEffect::SelectionChanged]
            }
            InputEvent::PointerDown { button: PointerButton::Secondary, .. } => Vec::new(),
            InputEvent::PointerMove { pos, modifiers } => {
                if self.selection.is_moving() {
                    let moved = self.selection.update_moving(&mut self.model, pos, modifiers);
                    if moved.is_empty() {
                        return Vec::new();
                    }
                    for id in &moved {
                        // Stale handles drop the write; the next export rebinds.
                        self.model.write_point_back(doc, *id);
                    }
                    let mut effects = Vec::new();
                    if let Some(e) = self.bounds_effect() {
                        effects.push(e);
                    }
                    effects.push(DocumentEffect::Repaint);
                    effects
                } else if self.selection.is_multi_selecting() {
                    self.selection.update_multi_selection(&self.model, pos);
                    vec![DocumentEffect::SelectionChanged]
                } else {
                    Vec::new()
                }
            }
            InputEvent::PointerUp { button: PointerButton::Primary, .. } => {
                if self.selection.is_moving() {
                    self.selection.end_moving(&self.model);
                    vec![DocumentEffect::Repaint]
                } else if self.selection.is_multi_selecting() {
                    self.selection.end_multi_selection();
                    vec![DocumentEffect::SelectionChanged]
                } else {
                    Vec::new()
                }
            }
            InputEvent::PointerUp { pos, button: PointerButton::Secondary } => {
                vec![DocumentEffect::ShowContextMenu(self.context_menu(pos))]
            }
        }
    }

    /// Build the structural command menu for a pick position: edit points
    /// take priority over segments; an empty path offers nothing.
    pub fn context_menu(&self, pos: Vec2) -> Vec<MenuEntry> {
        let mut entries = Vec::new();
        let segs = self.model.segment_count();
        if segs == 0 {
            return entries;
        }
        let closed = self.model.is_closed();
        let toggle = MenuEntry {
            action: PathAction::ToggleClosed { closed: !closed },
            enabled: true,
        };
        if let Some((id, _)) = picking::pick_edit_point(&self.model, pos, POINT_PICK_TOL) {
            // Closing consumes one point identity, hence the higher floor.
            let removable = if closed { segs >= 3 } else { segs >= 2 };
            entries.push(MenuEntry {
                action: PathAction::RemoveEditPoint { point: id },
                enabled: removable,
            });
            entries.push(toggle);
        } else if let Some((index, t, _)) =
            picking::pick_segment(&self.model, pos, SEGMENT_PICK_TOL)
        {
            entries.push(MenuEntry {
                action: PathAction::Split { segment: index, t },
                enabled: t > 0.0 && t < 1.0,
            });
            entries.push(MenuEntry {
                action: PathAction::Straighten { segment: index },
                // Degenerate single-loop case.
                enabled: !(closed && segs == 1),
            });
            entries.push(toggle);
        }
        entries
    }

    /// Run a structural command: suspend updates, mutate the model, do a
    /// forced-cubic export, resume, and report the new bounds.
    pub fn apply_action(&mut self, doc: &mut dyn Document, action: PathAction) -> Vec<DocumentEffect> {
        if self.suspended {
            return Vec::new();
        }
        self.suspended = true;

        let changed = match action {
            PathAction::Split { segment, t } => self.model.split_segment(segment, t),
            PathAction::Straighten { segment } => self.model.straighten_segment(segment),
            PathAction::ToggleClosed { closed } => self.model.toggle_closed(closed),
            PathAction::RemoveEditPoint { point } => self.model.remove_edit_point(point),
        };

        let mut effects = Vec::new();
        if changed {
            self.selection.clear();
            match self.model.export_canonical(doc) {
                Ok(()) => {
                    if let Some(e) = self.bounds_effect() {
                        effects.push(e);
                    }
                    effects.push(DocumentEffect::Repaint);
                }
                Err(err) => {
                    log::warn!("commit aborted after structural edit: {}", err);
                    effects.push(DocumentEffect::ResyncRequired);
                }
            }
        }

        self.suspended = false;
        effects
    }

    fn bounds_effect(&self) -> Option<DocumentEffect> {
        self.model
            .bounds()
            .map(|(min, max)| DocumentEffect::BoundsChanged { min, max })
    }
}
