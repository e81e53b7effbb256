//! External declarative path vocabulary and the collaborator document
//! boundary the engine reads from and writes into.
//!
//! Elements are property bags rather than fixed structs so that a malformed
//! primitive (a quad missing `controlX`, say) is representable: import logs
//! it and skips it instead of failing.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a document node. Handles are revalidated against the
/// current document on every write; they are never dereferenced directly.
pub type NodeHandle = u32;

/// Closed set of element kinds, decided once at import time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Container header carrying the start coordinate of the first segment.
    Path,
    Line,
    Quad,
    Cubic,
    /// Named numeric value attached to the following geometry element.
    Attribute,
    /// Position-along-path marker attached to the following geometry element.
    Percent,
    /// Anything unrecognized; skipped on import, never produced on export.
    Other,
}

impl ElementKind {
    /// Numeric properties an element of this kind must carry to be imported.
    pub fn required_props(self) -> &'static [&'static str] {
        match self {
            ElementKind::Path => &["startX", "startY"],
            ElementKind::Line => &["x", "y"],
            ElementKind::Quad => &["controlX", "controlY", "x", "y"],
            ElementKind::Cubic => &[
                "control1X", "control1Y", "control2X", "control2Y", "x", "y",
            ],
            ElementKind::Attribute => &["value"],
            ElementKind::Percent => &["value"],
            ElementKind::Other => &[],
        }
    }
}

/// One child element of the path container.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    /// Attribute name; only meaningful for `ElementKind::Attribute`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub props: IndexMap<String, f32>,
}

impl Element {
    fn with_props(kind: ElementKind, pairs: &[(&str, f32)]) -> Self {
        let mut props = IndexMap::new();
        for (k, v) in pairs {
            props.insert((*k).to_string(), *v);
        }
        Element { kind, name: None, props }
    }

    pub fn path(start_x: f32, start_y: f32) -> Self {
        Self::with_props(ElementKind::Path, &[("startX", start_x), ("startY", start_y)])
    }

    pub fn line(x: f32, y: f32) -> Self {
        Self::with_props(ElementKind::Line, &[("x", x), ("y", y)])
    }

    pub fn quad(control_x: f32, control_y: f32, x: f32, y: f32) -> Self {
        Self::with_props(
            ElementKind::Quad,
            &[("controlX", control_x), ("controlY", control_y), ("x", x), ("y", y)],
        )
    }

    pub fn cubic(c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) -> Self {
        Self::with_props(
            ElementKind::Cubic,
            &[
                ("control1X", c1x),
                ("control1Y", c1y),
                ("control2X", c2x),
                ("control2Y", c2y),
                ("x", x),
                ("y", y),
            ],
        )
    }

    pub fn attribute(name: &str, value: f32) -> Self {
        let mut el = Self::with_props(ElementKind::Attribute, &[("value", value)]);
        el.name = Some(name.to_string());
        el
    }

    pub fn percent(value: f32) -> Self {
        Self::with_props(ElementKind::Percent, &[("value", value)])
    }

    pub fn get(&self, prop: &str) -> Option<f32> {
        self.props.get(prop).copied()
    }
}

/// The document-side commit was aborted by the collaborator.
///
/// The engine does not roll back in-memory state on this error; the correct
/// recovery is a full re-import to resynchronize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitError;

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document transaction commit was aborted")
    }
}

impl std::error::Error for CommitError {}

/// Collaborator interface of the host document: element creation, child
/// replacement, transactions, numeric property write-back.
pub trait Document {
    /// Ordered child elements of the path container, with their handles.
    fn children(&self) -> Vec<(NodeHandle, Element)>;

    fn create_element(&mut self, element: Element) -> NodeHandle;

    /// Replace the container's child list. Previously listed nodes that do
    /// not appear in the new order are deleted.
    fn replace_children(&mut self, order: Vec<NodeHandle>);

    fn begin_transaction(&mut self);

    fn commit(&mut self) -> Result<(), CommitError>;

    /// Write one numeric property of a node. Returns false when the handle
    /// is stale or the value is not finite; such writes are dropped.
    fn set_numeric_property(&mut self, node: NodeHandle, name: &str, value: f32) -> bool;
}

/// In-memory reference document: elements live in an arena, ids are indices.
#[derive(Default)]
pub struct MemoryDocument {
    nodes: Vec<Option<Element>>,
    order: Vec<NodeHandle>,
    snapshot: Option<(Vec<Option<Element>>, Vec<NodeHandle>)>,
    fail_next_commit: bool,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document whose child list is exactly `elements`, in order.
    pub fn from_elements(elements: Vec<Element>) -> Self {
        let mut doc = Self::new();
        let order: Vec<NodeHandle> = elements.into_iter().map(|e| doc.create_element(e)).collect();
        doc.order = order;
        doc
    }

    /// Arrange for the next `commit()` to abort. The document itself rolls
    /// back to the transaction snapshot; the engine's model does not.
    pub fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }

    pub fn child_count(&self) -> usize {
        self.order.len()
    }

    pub fn element(&self, node: NodeHandle) -> Option<&Element> {
        self.nodes.get(node as usize).and_then(|e| e.as_ref())
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        let children: Vec<&Element> = self
            .order
            .iter()
            .filter_map(|&id| self.element(id))
            .collect();
        serde_json::json!({ "children": children })
    }

    /// Load the child list from a JSON value; returns false on shape errors.
    pub fn from_json_value(&mut self, v: serde_json::Value) -> bool {
        let Some(children) = v.get("children") else { return false };
        let parsed: Result<Vec<Element>, _> = serde_json::from_value(children.clone());
        match parsed {
            Ok(elements) => {
                *self = Self::from_elements(elements);
                true
            }
            Err(_) => false,
        }
    }
}

impl Document for MemoryDocument {
    fn children(&self) -> Vec<(NodeHandle, Element)> {
        self.order
            .iter()
            .filter_map(|&id| self.element(id).map(|e| (id, e.clone())))
            .collect()
    }

    fn create_element(&mut self, element: Element) -> NodeHandle {
        let id = self.nodes.len() as NodeHandle;
        self.nodes.push(Some(element));
        id
    }

    fn replace_children(&mut self, order: Vec<NodeHandle>) {
        for &old in &self.order {
            if !order.contains(&old) {
                if let Some(slot) = self.nodes.get_mut(old as usize) {
                    *slot = None;
                }
            }
        }
        self.order = order;
    }

    fn begin_transaction(&mut self) {
        self.snapshot = Some((self.nodes.clone(), self.order.clone()));
    }

    fn commit(&mut self) -> Result<(), CommitError> {
        if self.fail_next_commit {
            self.fail_next_commit = false;
            if let Some((nodes, order)) = self.snapshot.take() {
                self.nodes = nodes;
                self.order = order;
            }
            return Err(CommitError);
        }
        self.snapshot = None;
        Ok(())
    }

    fn set_numeric_property(&mut self, node: NodeHandle, name: &str, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self.nodes.get_mut(node as usize).and_then(|e| e.as_mut()) {
            Some(el) => {
                el.props.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_write_is_dropped() {
        let mut doc = MemoryDocument::from_elements(vec![Element::path(0.0, 0.0)]);
        let (id, _) = doc.children()[0].clone();
        assert!(doc.set_numeric_property(id, "startX", 5.0));
        doc.replace_children(vec![]);
        assert!(!doc.set_numeric_property(id, "startX", 7.0));
    }

    #[test]
    fn failed_commit_rolls_document_back() {
        let mut doc = MemoryDocument::from_elements(vec![Element::path(0.0, 0.0)]);
        doc.begin_transaction();
        let added = doc.create_element(Element::line(10.0, 0.0));
        doc.replace_children(vec![added]);
        doc.fail_next_commit();
        assert!(doc.commit().is_err());
        // Back to the single original child.
        let children = doc.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].1.kind, ElementKind::Path);
    }

    #[test]
    fn json_roundtrip_preserves_order_and_props() {
        let doc = MemoryDocument::from_elements(vec![
            Element::path(1.0, 2.0),
            Element::attribute("tension", 0.5),
            Element::quad(3.0, 4.0, 5.0, 6.0),
        ]);
        let v = doc.to_json_value();
        let mut other = MemoryDocument::new();
        assert!(other.from_json_value(v));
        let children = other.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].1.name.as_deref(), Some("tension"));
        assert_eq!(children[2].1.get("controlY"), Some(4.0));
    }
}
