//! Scene graph: the arena of nodes that region graphics are built into.
//!
//! This is the minimal rendering-engine surface the map core needs: groups,
//! compound paths, text and images, each with a local transform, a normal
//! style plus named alternate states, and a handful of interaction fields.
//! Pixels, hover detection and animation playback belong to the host; this
//! module only stores the target values the host reads.
//!
//! Text labels are attached to their host through `text_content` rather than
//! `children`, so clearing a group's children never orphans a label: the
//! label goes with its host.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::consts::DEFAULT_Z2_EMPHASIS_LIFT;
use crate::event::{EventData, HoverEmphasis, TooltipConfig};
use crate::transform::{Matrix, Point, Rect, Transform};

/// Handle to a node in a [`Scene`]. Ids are never reused.
pub type NodeId = Uuid;

// =============================================================
// Styles
// =============================================================

/// A tiled fill materialized from a decal option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub symbol: String,
    pub symbol_size: f64,
    pub color: String,
    /// Fill color drawn beneath the symbols.
    pub background: Option<String>,
    pub tile_width: f64,
    pub tile_height: f64,
    /// Rotation in radians.
    pub rotation: f64,
    /// Device pixel ratio the tile was sized for.
    pub dpr: f64,
}

/// Fill paint: a CSS color string or a pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Paint {
    Color(String),
    Pattern(Pattern),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

/// Visual properties of a node. Path fields and text fields share one record.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Style {
    pub fill: Option<Paint>,
    pub stroke: Option<String>,
    pub line_width: Option<f64>,
    pub opacity: Option<f64>,
    pub shadow_blur: Option<f64>,
    pub shadow_color: Option<String>,
    /// Stroke width is not scaled by ancestor transforms.
    pub stroke_no_scale: bool,
    pub font_size: Option<f64>,
    pub font_weight: Option<String>,
    pub font_family: Option<String>,
    pub align: Option<TextAlign>,
    pub vertical_align: Option<VerticalAlign>,
}

/// Name of an alternate visual state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateName {
    Emphasis,
    Select,
    Blur,
}

/// One alternate state: a style plus an optional visibility override.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NodeState {
    pub style: Style,
    pub ignore: Option<bool>,
}

/// The alternate states installed on a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct States {
    pub emphasis: Option<NodeState>,
    pub select: Option<NodeState>,
    pub blur: Option<NodeState>,
}

impl States {
    #[must_use]
    pub fn get(&self, name: StateName) -> Option<&NodeState> {
        match name {
            StateName::Emphasis => self.emphasis.as_ref(),
            StateName::Select => self.select.as_ref(),
            StateName::Blur => self.blur.as_ref(),
        }
    }

    /// Return the named state, creating an empty one if absent.
    pub fn ensure(&mut self, name: StateName) -> &mut NodeState {
        let slot = match name {
            StateName::Emphasis => &mut self.emphasis,
            StateName::Select => &mut self.select,
            StateName::Blur => &mut self.blur,
        };
        slot.get_or_insert_with(NodeState::default)
    }

    pub fn set(&mut self, name: StateName, state: NodeState) {
        *self.ensure(name) = state;
    }
}

// =============================================================
// Node kinds
// =============================================================

/// One sub-path of a compound path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubPath {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Compound path: every sub-path is filled together (even-odd), so interior
/// rings punch holes in their exterior.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathShape {
    pub subpaths: Vec<SubPath>,
    pub segment_ignore_threshold: f64,
}

impl PathShape {
    /// Bounding rect of every vertex, in the node's local space.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(self.subpaths.iter().flat_map(|s| s.points.iter()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Path(PathShape),
    Text { text: String },
    Image { href: String, rect: Rect },
}

/// Where a host places its text content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextPosition {
    /// Centre of the host's bounding rect.
    Inside,
    /// Percentages of the host's layout rect.
    Percent { x: f64, y: f64 },
}

/// Host-side placement of an attached text node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextConfig {
    pub position: TextPosition,
    pub layout_rect: Option<Rect>,
    /// Text follows the host's scale when `true`.
    pub relative_to_host_scale: bool,
}

/// Pointer events nodes can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    Click,
}

/// What a listener does when its event reaches the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listener {
    /// Record that a mouse-down landed on a selectable region.
    ArmSelect,
    /// Toggle selection of the clicked region if the gesture was armed.
    ToggleSelect,
}

/// Pending transform animation for the host's scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Transform,
    pub to: Transform,
    pub duration_ms: u32,
}

/// A node in the scene.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
    pub name: Option<String>,
    pub transform: Transform,
    pub transition: Option<Transition>,
    /// World matrix as of the last [`Scene::update_transforms`].
    pub world: Matrix,
    pub style: Style,
    pub states: States,
    /// States currently applied on top of the normal style.
    pub current_states: Vec<StateName>,
    /// Interpolate between states instead of switching abruptly.
    pub state_proxy: bool,
    /// Skip drawing when the bounding rect is outside the viewport.
    pub culling: bool,
    pub ignore: bool,
    pub z2_emphasis_lift: i32,
    pub text_content: Option<NodeId>,
    pub text_config: Option<TextConfig>,
    pub disable_label_animation: bool,
    pub data_index: Option<usize>,
    pub event_data: Option<EventData>,
    pub tooltip: Option<TooltipConfig>,
    pub hover: Option<HoverEmphasis>,
    pub listeners: Vec<(EventKind, Listener)>,
}

impl Node {
    fn new(id: NodeId, parent: Option<NodeId>, kind: NodeKind) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            kind,
            name: None,
            transform: Transform::default(),
            transition: None,
            world: Matrix::IDENTITY,
            style: Style::default(),
            states: States::default(),
            current_states: Vec::new(),
            state_proxy: false,
            culling: false,
            ignore: false,
            z2_emphasis_lift: DEFAULT_Z2_EMPHASIS_LIFT,
            text_content: None,
            text_config: None,
            disable_label_animation: false,
            data_index: None,
            event_data: None,
            tooltip: None,
            hover: None,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }
}

// =============================================================
// Scene
// =============================================================

/// Arena of scene nodes rooted at a single group.
pub struct Scene {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
}

impl Scene {
    /// Create a scene holding only an empty root group.
    #[must_use]
    pub fn new() -> Self {
        let root = Uuid::new_v4();
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(root, None, NodeKind::Group));
        Self { nodes, root }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Add a node as the last child of `parent`. A missing parent leaves the
    /// node detached.
    pub fn add(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = Uuid::new_v4();
        let attached = if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
            Some(parent)
        } else {
            None
        };
        self.nodes.insert(id, Node::new(id, attached, kind));
        id
    }

    pub fn add_group(&mut self, parent: NodeId) -> NodeId {
        self.add(parent, NodeKind::Group)
    }

    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes, root and text nodes included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn children(&self, id: &NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Every node below `id` in pre-order, excluding `id` and text content.
    #[must_use]
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(&next).iter().rev().copied());
        }
        out
    }

    /// Delete `id` and its whole subtree (text content included). Returns the
    /// number of nodes removed.
    pub fn remove(&mut self, id: &NodeId) -> usize {
        if *id == self.root {
            return 0;
        }
        let Some(parent_id) = self.nodes.get(id).map(|n| n.parent) else {
            return 0;
        };
        if let Some(parent) = parent_id.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| c != id);
            if parent.text_content == Some(*id) {
                parent.text_content = None;
            }
        }
        self.drop_subtree(*id)
    }

    fn drop_subtree(&mut self, id: NodeId) -> usize {
        let Some(node) = self.nodes.remove(&id) else {
            return 0;
        };
        let mut removed = 1;
        for child in node.children {
            removed += self.drop_subtree(child);
        }
        if let Some(text) = node.text_content {
            removed += self.drop_subtree(text);
        }
        removed
    }

    /// Delete every child of `id`, keeping `id` itself.
    pub fn clear_children(&mut self, id: &NodeId) -> usize {
        let children = self.children(id).to_vec();
        children.iter().map(|c| self.remove(c)).sum()
    }

    // --- Text content ---

    /// Attach (or update) the text node hosted by `host`.
    pub fn set_text_content(&mut self, host: &NodeId, text: &str) -> Option<NodeId> {
        let existing = self.nodes.get(host)?.text_content;
        if let Some(text_id) = existing.filter(|t| self.nodes.contains_key(t)) {
            if let Some(node) = self.nodes.get_mut(&text_id) {
                node.kind = NodeKind::Text { text: text.to_owned() };
            }
            return Some(text_id);
        }
        let id = Uuid::new_v4();
        self.nodes.insert(id, Node::new(id, Some(*host), NodeKind::Text { text: text.to_owned() }));
        if let Some(h) = self.nodes.get_mut(host) {
            h.text_content = Some(id);
        }
        Some(id)
    }

    /// Remove `host`'s text node and its text config.
    pub fn remove_text_content(&mut self, host: &NodeId) {
        let Some(h) = self.nodes.get_mut(host) else {
            return;
        };
        h.text_config = None;
        if let Some(text) = h.text_content.take() {
            self.drop_subtree(text);
        }
    }

    // --- Listeners ---

    pub fn on(&mut self, id: &NodeId, kind: EventKind, listener: Listener) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.listeners.push((kind, listener));
        }
    }

    /// Detach every listener of `kind` from `id`.
    pub fn off(&mut self, id: &NodeId, kind: EventKind) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.listeners.retain(|(k, _)| *k != kind);
        }
    }

    /// Total listeners attached anywhere in the scene.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.nodes.values().map(|n| n.listeners.len()).sum()
    }

    /// Listeners for `kind`, bubbling from `target` up to the root.
    #[must_use]
    pub fn dispatch(&self, target: &NodeId, kind: EventKind) -> Vec<Listener> {
        let mut out = Vec::new();
        let mut cursor = Some(*target);
        while let Some(id) = cursor {
            let Some(node) = self.nodes.get(&id) else {
                break;
            };
            out.extend(node.listeners.iter().filter(|(k, _)| *k == kind).map(|(_, l)| *l));
            cursor = node.parent;
        }
        out
    }

    // --- Transforms ---

    /// Set a node's transform immediately, dropping any pending transition.
    pub fn set_transform(&mut self, id: &NodeId, transform: Transform) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.transform = transform;
            node.transition = None;
        }
    }

    /// Set a node's target transform and record a transition from its current
    /// one for the host animator.
    pub fn animate_transform(&mut self, id: &NodeId, transform: Transform, duration_ms: u32) {
        if let Some(node) = self.nodes.get_mut(id) {
            let from = node.transform;
            node.transform = transform;
            node.transition = Some(Transition { from, to: transform, duration_ms });
        }
    }

    /// Accumulated scale of `id` and all its ancestors.
    #[must_use]
    pub fn world_scale(&self, id: &NodeId) -> (f64, f64) {
        let mut m = Matrix::IDENTITY;
        let mut cursor = Some(*id);
        while let Some(cur) = cursor {
            let Some(node) = self.nodes.get(&cur) else {
                break;
            };
            m = Matrix::from_transform(&node.transform).multiply(&m);
            cursor = node.parent;
        }
        m.scale()
    }

    /// Recompute world matrices from the root down.
    pub fn update_transforms(&mut self) {
        self.update_transforms_with(|_, _| {});
    }

    /// Recompute world matrices, calling `after_update` on each node's freshly
    /// computed matrix before its children are visited.
    pub fn update_transforms_with<F>(&mut self, mut after_update: F)
    where
        F: FnMut(NodeId, &mut Matrix),
    {
        let mut stack = vec![(self.root, Matrix::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            let mut world = parent_world.multiply(&Matrix::from_transform(&node.transform));
            after_update(id, &mut world);
            node.world = world;
            for child in &node.children {
                stack.push((*child, world));
            }
            if let Some(text) = node.text_content {
                stack.push((text, world));
            }
        }
    }

    /// Bounding rect of `id` in its own local space.
    #[must_use]
    pub fn bounding_rect(&self, id: &NodeId) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        match &node.kind {
            NodeKind::Path(shape) => shape.bounding_rect(),
            NodeKind::Image { rect, .. } => Some(*rect),
            NodeKind::Text { .. } => None,
            NodeKind::Group => node
                .children
                .iter()
                .filter_map(|c| {
                    let child = self.nodes.get(c)?;
                    let r = self.bounding_rect(c)?;
                    let m = Matrix::from_transform(&child.transform);
                    let corners = [
                        m.apply(Point::new(r.x, r.y)),
                        m.apply(Point::new(r.x + r.width, r.y)),
                        m.apply(Point::new(r.x, r.y + r.height)),
                        m.apply(Point::new(r.x + r.width, r.y + r.height)),
                    ];
                    Rect::from_points(&corners)
                })
                .reduce(|a, b| a.union(&b)),
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
