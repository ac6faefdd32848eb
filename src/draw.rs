//! `MapDraw`: the per-component map drawer.
//!
//! DESIGN
//! ======
//! One `MapDraw` owns the scene for one geo component or map series:
//!
//! ```text
//! group
//! └── transform_group        roam transform
//!     ├── regions_group      one group per boundary region name
//!     └── svg_group          raw transform; holds this drawer's svg record
//! ```
//!
//! Every `draw` resolves the map source and builds through one of two paths.
//! Boundary regions are rebuilt from scratch each time. A vector document is
//! acquired once per map identifier and restyled in place. Both paths run the
//! same per-region pipeline (style, label, event/tooltip/state trigger) so
//! that a region is complete before the next one starts.
//!
//! Pointer input goes through [`MapDraw::handle_input`]: the roam controller
//! turns gestures into pan/zoom applied to `transform_group`, and the select
//! listeners turn an un-dragged press on a region into `toggle-select`. The
//! drawer reports what happened as [`Action`]s for the host to dispatch.

#[cfg(test)]
#[path = "draw_test.rs"]
mod draw_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::consts::{SEGMENT_IGNORE_THRESHOLD, is_region_available_tag, is_style_enabled_tag};
use crate::data::DataBinding;
use crate::event::{Binding, ComponentRef, ComponentType, reset_event_trigger, reset_state_trigger, reset_tooltip};
use crate::geo::{BoundaryRegionSet, Geometry};
use crate::hit::hit_test;
use crate::input::{Button, PointerInput, SelectGesture};
use crate::label::{self, LabelContext, LabelTransforms};
use crate::options::{Focus, MapOptions, RegionModel, ScaleLimit, SelectedMode};
use crate::resource::{ConsumerId, GraphicRecord, MapHost, MapSource, SvgResource};
use crate::roam::{RoamController, RoamEvent, update_view_on_pan, update_view_on_zoom};
use crate::scene::{EventKind, Listener, NodeId, NodeKind, PathShape, Scene, StateName, States, SubPath};
use crate::style::{PatternContext, RegionStyles, apply_region_styles, install_document_blur, resolve_region_styles};
use crate::transform::{Point, Rect, TransformInfo};

// =============================================================================
// MODEL + ACTIONS
// =============================================================================

/// Everything `draw` reads about the component being drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct MapModel {
    pub component: ComponentRef,
    /// Map identifier resolved through the host.
    pub map: String,
    pub transform: TransformInfo,
    /// Accumulated roam zoom.
    pub zoom: f64,
    /// View rect before roam; pointer gestures start only inside it once
    /// roamed. `None` uses the bounds of the drawn regions.
    pub view_rect: Option<Rect>,
    pub options: MapOptions,
}

impl MapModel {
    #[must_use]
    pub fn new(component: ComponentRef, map: impl Into<String>, options: MapOptions) -> Self {
        Self { component, map: map.into(), transform: TransformInfo::default(), zoom: 1.0, view_rect: None, options }
    }
}

/// The update action that triggered a redraw. Its presence marks the draw
/// as an update rather than the first draw.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePayload {
    #[serde(rename = "type")]
    pub action_type: String,
    pub component_id: Option<String>,
}

/// Actions returned from input handling for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RoamPan { component: ComponentRef, dx: f64, dy: f64 },
    /// `zoom` is relative to the previous zoom; `total_zoom` is accumulated.
    RoamZoom { component: ComponentRef, zoom: f64, total_zoom: f64, origin_x: f64, origin_y: f64 },
    ToggleSelect { component: ComponentRef, name: String },
    RenderNeeded,
}

impl Action {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoamPan { .. } => "roam-pan",
            Self::RoamZoom { .. } => "roam-zoom",
            Self::ToggleSelect { .. } => "toggle-select",
            Self::RenderNeeded => "render-needed",
        }
    }

    /// Wire form: `{kind, componentType, geoId|seriesId, ...}` in camelCase.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut out = Map::new();
        out.insert("kind".into(), self.kind().into());

        let component = match self {
            Self::RoamPan { component, .. } | Self::RoamZoom { component, .. } | Self::ToggleSelect { component, .. } => {
                Some(component)
            }
            Self::RenderNeeded => None,
        };
        if let Some(c) = component {
            out.insert("componentType".into(), c.main_type.as_str().into());
            out.insert(c.main_type.id_key().into(), c.id.clone().into());
        }

        match self {
            Self::RoamPan { dx, dy, .. } => {
                out.insert("dx".into(), (*dx).into());
                out.insert("dy".into(), (*dy).into());
            }
            Self::RoamZoom { zoom, total_zoom, origin_x, origin_y, .. } => {
                out.insert("zoom".into(), (*zoom).into());
                out.insert("totalZoom".into(), (*total_zoom).into());
                out.insert("originX".into(), (*origin_x).into());
                out.insert("originY".into(), (*origin_y).into());
            }
            Self::ToggleSelect { name, .. } => {
                out.insert("name".into(), name.clone().into());
            }
            Self::RenderNeeded => {}
        }
        Value::Object(out)
    }
}

// =============================================================================
// DRAWER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrawnKind {
    Boundary,
    Vector,
}

struct SvgBinding {
    map_id: String,
    resource: Rc<RefCell<SvgResource>>,
    record: GraphicRecord,
}

/// Roam context captured at draw time.
#[derive(Default)]
struct ControllerHost {
    component: Option<ComponentRef>,
    zoom: f64,
    limit: Option<ScaleLimit>,
    view_rect: Option<Rect>,
    chrome: Vec<Rect>,
}

/// Draws one map component into its own scene.
pub struct MapDraw {
    scene: Scene,
    uid: ConsumerId,
    group: NodeId,
    transform_group: NodeId,
    regions_group: NodeId,
    svg_group: NodeId,

    regions_by_name: HashMap<String, NodeId>,
    region_dispatchers: HashMap<String, Vec<NodeId>>,
    svg: Option<SvgBinding>,
    svg_dispatchers: HashMap<String, Vec<NodeId>>,
    drawn: Option<(DrawnKind, String)>,

    item_graphics: HashMap<usize, NodeId>,
    labels: LabelTransforms,

    controller: RoamController,
    controller_host: ControllerHost,
    select: SelectGesture,
    pattern_ctx: PatternContext,
    disposed: bool,
}

impl Default for MapDraw {
    fn default() -> Self {
        Self::new()
    }
}

impl MapDraw {
    #[must_use]
    pub fn new() -> Self {
        let mut scene = Scene::new();
        let group = scene.add_group(scene.root());
        let transform_group = scene.add_group(group);
        let regions_group = scene.add_group(transform_group);
        let svg_group = scene.add_group(transform_group);
        Self {
            scene,
            uid: Uuid::new_v4(),
            group,
            transform_group,
            regions_group,
            svg_group,
            regions_by_name: HashMap::new(),
            region_dispatchers: HashMap::new(),
            svg: None,
            svg_dispatchers: HashMap::new(),
            drawn: None,
            item_graphics: HashMap::new(),
            labels: LabelTransforms::new(),
            controller: RoamController::new(),
            controller_host: ControllerHost { zoom: 1.0, ..ControllerHost::default() },
            select: SelectGesture::Idle,
            pattern_ctx: PatternContext::default(),
            disposed: false,
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Consumer identity used for shared resources.
    #[must_use]
    pub fn uid(&self) -> ConsumerId {
        self.uid
    }

    #[must_use]
    pub fn group(&self) -> NodeId {
        self.group
    }

    #[must_use]
    pub fn transform_group(&self) -> NodeId {
        self.transform_group
    }

    #[must_use]
    pub fn regions_group(&self) -> NodeId {
        self.regions_group
    }

    #[must_use]
    pub fn svg_group(&self) -> NodeId {
        self.svg_group
    }

    /// Graphic bound to a data item by the last draw.
    #[must_use]
    pub fn item_graphic(&self, data_index: usize) -> Option<NodeId> {
        self.item_graphics.get(&data_index).copied()
    }

    #[must_use]
    pub fn labels(&self) -> &LabelTransforms {
        &self.labels
    }

    #[must_use]
    pub fn select_state(&self) -> SelectGesture {
        self.select
    }

    #[must_use]
    pub fn svg_record(&self) -> Option<&GraphicRecord> {
        self.svg.as_ref().map(|b| &b.record)
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        self.pattern_ctx = PatternContext { dpr };
    }

    // --- Draw ---

    /// Bring the scene in line with `model`.
    ///
    /// Without a `payload` this is a first draw and the roam transform snaps;
    /// with one it animates, unless nothing has been drawn yet.
    pub fn draw(
        &mut self,
        model: &MapModel,
        data: Option<&dyn DataBinding>,
        host: &dyn MapHost,
        payload: Option<&UpdatePayload>,
    ) {
        self.disposed = false;
        let nothing_drawn =
            self.scene.children(&self.regions_group).is_empty() && self.scene.children(&self.svg_group).is_empty();
        let first_draw = payload.is_none() || nothing_drawn;
        self.item_graphics.clear();

        match host.resolve(&model.map) {
            Some(MapSource::Boundary(set)) => {
                self.free_svg();
                self.build_boundary(model, &set, data);
                self.drawn = Some((DrawnKind::Boundary, model.map.clone()));
            }
            Some(MapSource::Vector(resource)) => {
                self.clear_regions();
                if self.build_svg(model, &resource, data) {
                    self.drawn = Some((DrawnKind::Vector, model.map.clone()));
                } else {
                    self.drawn = None;
                }
            }
            None => {
                warn!(map_id = %model.map, "map resource unavailable; drawing nothing");
                self.free_svg();
                self.clear_regions();
                self.drawn = None;
            }
        }

        self.update_transform(model, first_draw);
        self.reset_controller(model, host);
        self.reset_select_handler(model.options.selected_mode);
        label::refresh(&mut self.scene, &mut self.labels);

        debug!(
            map_id = %model.map,
            regions = self.regions_by_name.len() + self.svg_dispatchers.len(),
            labels = self.labels.len(),
            first_draw,
            "map drawn"
        );
    }

    fn build_boundary(&mut self, model: &MapModel, set: &BoundaryRegionSet, data: Option<&dyn DataBinding>) {
        self.clear_regions();
        let raw = model.transform.raw;
        let is_geo = model.component.main_type == ComponentType::Geo;

        for region in &set.regions {
            let name = region.name.as_str();
            let region_model = model.options.region_model(name);
            let data_index = data.and_then(|d| d.index_of_name(name));

            let (region_group, created) = match self.regions_by_name.get(name) {
                Some(g) => (*g, false),
                None => {
                    let g = self.scene.add_group(self.regions_group);
                    if let Some(node) = self.scene.get_mut(&g) {
                        node.name = Some(name.to_owned());
                    }
                    self.regions_by_name.insert(name.to_owned(), g);
                    (g, true)
                }
            };

            let mut polygons = Vec::new();
            let mut lines = Vec::new();
            for geometry in &region.geometries {
                match geometry {
                    Geometry::Polygon(poly) => {
                        let rings = std::iter::once(&poly.exterior).chain(poly.interiors.iter());
                        polygons.extend(rings.map(|ring| SubPath {
                            points: ring.iter().map(|p| raw.apply(*p)).collect(),
                            closed: true,
                        }));
                    }
                    Geometry::LineString(line) => {
                        lines.push(SubPath { points: line.iter().map(|p| raw.apply(*p)).collect(), closed: false });
                    }
                }
            }

            let styles = resolve_region_styles(&region_model, data, data_index, &self.pattern_ctx);
            let mut label_host = None;
            if !polygons.is_empty() {
                let path = self.add_compound(region_group, name, polygons, &styles, region_model.selected);
                label_host = Some(path);
            }
            if !lines.is_empty() {
                let line_styles = without_fill(&styles);
                let path = self.add_compound(region_group, name, lines, &line_styles, region_model.selected);
                if label_host.is_none() {
                    label_host = Some(path);
                }
            }

            if let Some(host) = label_host {
                let ctx = LabelContext { is_geo, data, data_index };
                let anchor = raw.apply(region.center);
                label::reset_label(&mut self.scene, &mut self.labels, &host, &region_model, &ctx, Some(anchor));
            }

            if created {
                self.reset_region_triggers(&region_group, &region_model, &model.component, data, data_index);
            }
        }
    }

    fn add_compound(
        &mut self,
        parent: NodeId,
        name: &str,
        subpaths: Vec<SubPath>,
        styles: &RegionStyles,
        selected: bool,
    ) -> NodeId {
        let shape = PathShape { subpaths, segment_ignore_threshold: SEGMENT_IGNORE_THRESHOLD };
        let path = self.scene.add(parent, NodeKind::Path(shape));
        apply_region_styles(&mut self.scene, &path, styles);
        if let Some(node) = self.scene.get_mut(&path) {
            node.culling = true;
            if selected {
                node.current_states = vec![StateName::Select];
            }
        }
        self.region_dispatchers.entry(name.to_owned()).or_default().push(path);
        path
    }

    /// Acquire (or keep) the document for `model.map` and restyle its named
    /// nodes. Returns `false` when the document is unavailable.
    fn build_svg(&mut self, model: &MapModel, resource: &Rc<RefCell<SvgResource>>, data: Option<&dyn DataBinding>) -> bool {
        let unchanged =
            self.svg.as_ref().is_some_and(|b| b.map_id == model.map && Rc::ptr_eq(&b.resource, resource));
        if !unchanged {
            self.free_svg();
            let acquired = match resource.try_borrow_mut() {
                Ok(mut res) => res.acquire(self.uid, &mut self.scene, self.svg_group),
                Err(_) => None,
            };
            let Some(record) = acquired else {
                warn!(map_id = %model.map, "svg resource unavailable; drawing nothing");
                return false;
            };
            self.svg = Some(SvgBinding { map_id: model.map.clone(), resource: Rc::clone(resource), record });
        }
        let Some(record) = self.svg.as_ref().map(|b| b.record.clone()) else {
            return false;
        };

        self.scene.set_transform(&self.svg_group, model.transform.raw);
        self.svg_dispatchers.clear();

        // Alternate states are rebuilt on every pass.
        for id in &record.nodes {
            if let Some(node) = self.scene.get_mut(id) {
                node.culling = true;
                node.z2_emphasis_lift = 0;
                node.state_proxy = false;
                node.states = States::default();
            }
        }

        let is_geo = model.component.main_type == ComponentType::Geo;
        let mut focus_self = false;

        for item in &record.named {
            self.svg_dispatchers.entry(item.name.clone()).or_default().push(item.el);
            let region_model = model.options.region_model(&item.name);
            let data_index = data.and_then(|d| d.index_of_name(&item.name));

            if is_style_enabled_tag(&item.tag) {
                let styles = resolve_region_styles(&region_model, data, data_index, &self.pattern_ctx);
                apply_region_styles(&mut self.scene, &item.el, &styles);
                if let Some(node) = self.scene.get_mut(&item.el) {
                    node.current_states.retain(|s| *s != StateName::Select);
                    if region_model.selected {
                        node.current_states.push(StateName::Select);
                    }
                }
            }

            if item.named_from.is_none() && is_region_available_tag(&item.tag) {
                let ctx = LabelContext { is_geo, data, data_index };
                label::reset_label(&mut self.scene, &mut self.labels, &item.el, &region_model, &ctx, None);
                let focus =
                    self.reset_region_triggers(&item.el, &region_model, &model.component, data, data_index);
                focus_self |= focus == Focus::OnlySelf;
            }
        }

        if is_geo && focus_self {
            let blur_opacity = model.options.blur.item_style.opacity;
            for id in &record.nodes {
                let is_group = self.scene.get(id).is_none_or(|n| n.is_group());
                if !is_group {
                    install_document_blur(&mut self.scene, id, blur_opacity);
                }
            }
        }
        true
    }

    fn reset_region_triggers(
        &mut self,
        el: &NodeId,
        region_model: &RegionModel,
        component: &ComponentRef,
        data: Option<&dyn DataBinding>,
        data_index: Option<usize>,
    ) -> Focus {
        let binding = if data.is_some() { Binding::Data(data_index) } else { Binding::NoData };
        reset_event_trigger(&mut self.scene, el, region_model, component, binding, &mut self.item_graphics);
        reset_tooltip(&mut self.scene, el, region_model, component, binding.has_data());
        reset_state_trigger(&mut self.scene, el, region_model, component)
    }

    fn update_transform(&mut self, model: &MapModel, first_draw: bool) {
        let roam = model.transform.roam;
        if first_draw || !model.options.animation {
            self.scene.set_transform(&self.transform_group, roam);
        } else {
            self.scene.animate_transform(&self.transform_group, roam, model.options.animation_duration_update);
        }
    }

    fn reset_controller(&mut self, model: &MapModel, host: &dyn MapHost) {
        self.controller.enable(model.options.roam);
        self.controller_host = ControllerHost {
            component: Some(model.component.clone()),
            zoom: model.zoom,
            limit: model.options.scale_limit,
            view_rect: model.view_rect,
            chrome: host.chrome_rects(),
        };
    }

    fn reset_select_handler(&mut self, mode: SelectedMode) {
        self.select = SelectGesture::Idle;
        for g in [self.regions_group, self.svg_group] {
            self.scene.off(&g, EventKind::MouseDown);
            self.scene.off(&g, EventKind::Click);
            if mode.is_enabled() {
                self.scene.on(&g, EventKind::MouseDown, Listener::ArmSelect);
                self.scene.on(&g, EventKind::Click, Listener::ToggleSelect);
            }
        }
    }

    fn free_svg(&mut self) {
        if let Some(binding) = self.svg.take() {
            match binding.resource.try_borrow_mut() {
                Ok(mut res) => res.release(&self.uid, &mut self.scene),
                Err(_) => {
                    warn!(map_id = %binding.map_id, "svg resource busy; detaching graphics only");
                    self.scene.remove(&binding.record.root);
                }
            }
        }
        self.svg_dispatchers.clear();
    }

    fn clear_regions(&mut self) {
        self.scene.clear_children(&self.regions_group);
        self.regions_by_name.clear();
        self.region_dispatchers.clear();
    }

    /// Tear down every graphic and binding. Input is ignored until the next
    /// draw. Safe to call repeatedly.
    pub fn remove(&mut self) {
        self.free_svg();
        self.clear_regions();
        self.item_graphics.clear();
        self.labels.clear();
        self.controller.dispose();
        self.controller_host = ControllerHost { zoom: 1.0, ..ControllerHost::default() };
        self.select = SelectGesture::Idle;
        for g in [self.regions_group, self.svg_group] {
            self.scene.off(&g, EventKind::MouseDown);
            self.scene.off(&g, EventKind::Click);
        }
        self.drawn = None;
        self.disposed = true;
    }

    // --- Queries ---

    /// Graphics drawn for `name` in the current map. Boundary maps yield the
    /// compound paths of every occurrence; vector maps yield the named nodes.
    #[must_use]
    pub fn find_graphics_by_region_name(&self, name: Option<&str>, model: &MapModel) -> Vec<NodeId> {
        let Some(name) = name else {
            return Vec::new();
        };
        let index = match &self.drawn {
            Some((DrawnKind::Boundary, map)) if *map == model.map => &self.region_dispatchers,
            Some((DrawnKind::Vector, map)) if *map == model.map => &self.svg_dispatchers,
            _ => return Vec::new(),
        };
        index.get(name).cloned().unwrap_or_default()
    }

    // --- Input ---

    /// Feed one pointer event through selection and roam.
    pub fn handle_input(&mut self, input: &PointerInput) -> Vec<Action> {
        if self.disposed {
            return Vec::new();
        }
        let Some(component) = self.controller_host.component.clone() else {
            return Vec::new();
        };
        let mut actions = Vec::new();

        match *input {
            PointerInput::Down { pt, button: Button::Primary } => {
                let armed = hit_test(&self.scene, &self.group, pt)
                    .is_some_and(|hit| self.scene.dispatch(&hit, EventKind::MouseDown).contains(&Listener::ArmSelect));
                self.select = if armed { SelectGesture::MouseDown } else { SelectGesture::Idle };
            }
            PointerInput::Up { pt, button: Button::Primary } => {
                if self.select == SelectGesture::MouseDown {
                    let hit = hit_test(&self.scene, &self.group, pt);
                    let toggles =
                        hit.is_some_and(|h| self.scene.dispatch(&h, EventKind::Click).contains(&Listener::ToggleSelect));
                    if let Some(name) = hit.filter(|_| toggles).and_then(|h| self.region_name_of(&h)) {
                        actions.push(Action::ToggleSelect { component: component.clone(), name });
                    }
                }
                self.select = SelectGesture::Idle;
            }
            _ => {}
        }

        let view = self.roamed_view_rect();
        let chrome = &self.controller_host.chrome;
        let eligible = |p: Point| view.is_some_and(|v| v.contains(p)) && !chrome.iter().any(|c| c.contains(p));

        let Some(event) = self.controller.on_input(input, eligible) else {
            return actions;
        };
        self.select = match self.select {
            SelectGesture::Idle => SelectGesture::Idle,
            SelectGesture::MouseDown | SelectGesture::Dragging => SelectGesture::Dragging,
        };

        let mut roam = self.scene.get(&self.transform_group).map(|n| n.transform).unwrap_or_default();
        match event {
            RoamEvent::Pan { dx, dy } => {
                update_view_on_pan(&mut roam, dx, dy);
                actions.push(Action::RoamPan { component, dx, dy });
            }
            RoamEvent::Zoom { scale, origin_x, origin_y } => {
                let limit = self.controller_host.limit;
                let zoom = update_view_on_zoom(&mut roam, &mut self.controller_host.zoom, limit, scale, origin_x, origin_y);
                actions.push(Action::RoamZoom {
                    component,
                    zoom,
                    total_zoom: self.controller_host.zoom,
                    origin_x,
                    origin_y,
                });
            }
        }
        self.scene.set_transform(&self.transform_group, roam);
        label::refresh(&mut self.scene, &mut self.labels);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Screen rect in which gestures may start: the configured view rect,
    /// else the drawn geometry, carried through the current roam.
    fn roamed_view_rect(&self) -> Option<Rect> {
        let roam = self.scene.get(&self.transform_group).map(|n| n.transform).unwrap_or_default();
        self.controller_host
            .view_rect
            .or_else(|| self.scene.bounding_rect(&self.transform_group))
            .map(|r| roam.apply_rect(&r))
    }

    /// Region name for a hit node: the nearest ancestor-or-self whose name is
    /// a drawn region.
    fn region_name_of(&self, id: &NodeId) -> Option<String> {
        let mut cursor = Some(*id);
        while let Some(cur) = cursor {
            let node = self.scene.get(&cur)?;
            if let Some(name) = &node.name {
                if self.region_dispatchers.contains_key(name) || self.svg_dispatchers.contains_key(name) {
                    return Some(name.clone());
                }
            }
            cursor = node.parent;
        }
        None
    }
}

impl Drop for MapDraw {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Line styles: the region styles with every fill removed.
fn without_fill(styles: &RegionStyles) -> RegionStyles {
    let mut out = styles.clone();
    for style in [&mut out.normal, &mut out.emphasis, &mut out.select, &mut out.blur] {
        style.fill = None;
    }
    out
}
