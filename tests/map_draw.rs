//! End-to-end behaviour of `MapDraw` against a real registry.

#![allow(clippy::float_cmp)]

use mapdraw::data::{DataItem, SeriesData};
use mapdraw::event::{ComponentRef, ComponentType};
use mapdraw::geo::GeoJsonOptions;
use mapdraw::input::{Button, PointerInput, WheelDelta};
use mapdraw::scene::NodeKind;
use mapdraw::transform::{Point, Rect, Transform};
use mapdraw::{Action, GeoRegistry, MapDraw, MapHost, MapModel, MapSource, UpdatePayload};
use serde_json::json;

const LAND: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"name": "a"},
     "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]}},
    {"type": "Feature", "properties": {"name": "b"},
     "geometry": {"type": "Polygon", "coordinates": [[[20,0],[30,0],[30,10],[20,10],[20,0]]]}},
    {"type": "Feature", "properties": {"name": "a"},
     "geometry": {"type": "Polygon", "coordinates": [[[0,20],[10,20],[10,30],[0,30],[0,20]]]}}
  ]
}"#;

const DOC: &str = r#"<svg viewBox="0 0 100 100">
  <g name="north"><rect x="0" y="0" width="40" height="40"/></g>
  <polygon name="south" points="0,60 40,60 40,100 0,100"/>
</svg>"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

fn registry() -> GeoRegistry {
    init_tracing();
    let mut reg = GeoRegistry::new();
    reg.register_geojson("land", LAND, &GeoJsonOptions::default()).unwrap();
    reg.register_svg("doc", DOC).unwrap();
    reg.register_svg("doc2", DOC).unwrap();
    reg
}

fn geo() -> ComponentRef {
    ComponentRef { main_type: ComponentType::Geo, id: "g0".into(), index: 0 }
}

fn model(map: &str, options: serde_json::Value) -> MapModel {
    MapModel::new(geo(), map, serde_json::from_value(options).unwrap())
}

fn series_model(map: &str, options: serde_json::Value) -> MapModel {
    let component = ComponentRef { main_type: ComponentType::Series, id: "s0".into(), index: 0 };
    MapModel::new(component, map, serde_json::from_value(options).unwrap())
}

fn update() -> UpdatePayload {
    UpdatePayload { action_type: "geoRoam".into(), component_id: Some("g0".into()) }
}

fn svg_resource(reg: &GeoRegistry, map: &str) -> std::rc::Rc<std::cell::RefCell<mapdraw::resource::SvgResource>> {
    match reg.resolve(map) {
        Some(MapSource::Vector(res)) => res,
        _ => panic!("{map} is not a vector map"),
    }
}

fn down(x: f64, y: f64) -> PointerInput {
    PointerInput::Down { pt: Point::new(x, y), button: Button::Primary }
}

fn up(x: f64, y: f64) -> PointerInput {
    PointerInput::Up { pt: Point::new(x, y), button: Button::Primary }
}

fn moved(x: f64, y: f64) -> PointerInput {
    PointerInput::Move { pt: Point::new(x, y) }
}

fn wheel_in(x: f64, y: f64) -> PointerInput {
    PointerInput::Wheel { pt: Point::new(x, y), delta: WheelDelta { dx: 0.0, dy: -1.0 } }
}

fn toggles(actions: &[Action]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::ToggleSelect { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

// =============================================================
// Drawing
// =============================================================

#[test]
fn duplicate_names_yield_distinct_handles() {
    let reg = registry();
    let mut draw = MapDraw::new();
    let m = model("land", json!({}));
    draw.draw(&m, None, &reg, None);

    let handles = draw.find_graphics_by_region_name(Some("a"), &m);
    assert_eq!(handles.len(), 2);
    assert_ne!(handles[0], handles[1]);
    // Both occurrences share one region group.
    assert_eq!(draw.scene().children(&draw.regions_group()).len(), 2);
}

#[test]
fn redraw_is_idempotent() {
    let reg = registry();
    for map in ["land", "doc"] {
        let mut draw = MapDraw::new();
        let m = model(map, json!({"selectedMode": "multiple", "roam": true, "label": {"show": true}}));
        draw.draw(&m, None, &reg, None);
        let (nodes, listeners, labels) = (draw.scene().len(), draw.scene().listener_count(), draw.labels().len());

        draw.draw(&m, None, &reg, Some(&update()));
        draw.draw(&m, None, &reg, Some(&update()));
        assert_eq!(draw.scene().len(), nodes, "{map}: node count drifted");
        assert_eq!(draw.scene().listener_count(), listeners, "{map}: listener count drifted");
        assert_eq!(draw.labels().len(), labels, "{map}: label count drifted");
    }
}

#[test]
fn tooltip_only_without_data() {
    let reg = registry();
    let m = model("land", json!({"tooltip": {"show": true}}));
    let mut draw = MapDraw::new();
    draw.draw(&m, None, &reg, None);
    for g in draw.scene().children(&draw.regions_group()) {
        assert!(draw.scene().get(g).unwrap().tooltip.is_some());
    }

    let data = SeriesData::new("pop", vec![DataItem { name: "b".into(), value: Some(1.0), ..DataItem::default() }], false);
    draw.draw(&m, Some(&data), &reg, Some(&update()));
    for g in draw.scene().children(&draw.regions_group()) {
        assert!(draw.scene().get(g).unwrap().tooltip.is_none());
    }
}

#[test]
fn missing_value_still_labels_series_regions() {
    let reg = registry();
    let m = series_model("land", json!({"label": {"show": true}}));
    let data = SeriesData::new("pop", vec![DataItem { name: "b".into(), value: Some(3.0), ..DataItem::default() }], false);
    let mut draw = MapDraw::new();
    draw.draw(&m, Some(&data), &reg, None);

    let a = draw.find_graphics_by_region_name(Some("a"), &m);
    let b = draw.find_graphics_by_region_name(Some("b"), &m);
    assert!(draw.scene().get(&a[0]).unwrap().text_content.is_some(), "NaN value is labelled");
    assert!(draw.scene().get(&b[0]).unwrap().text_content.is_none(), "valued series region is not");

    let forced = SeriesData::new(
        "pop",
        vec![DataItem { name: "b".into(), value: Some(3.0), show_label: true, ..DataItem::default() }],
        false,
    );
    draw.draw(&m, Some(&forced), &reg, Some(&update()));
    let b = draw.find_graphics_by_region_name(Some("b"), &m);
    let text = draw.scene().get(&b[0]).unwrap().text_content.unwrap();
    assert!(matches!(&draw.scene().get(&text).unwrap().kind, NodeKind::Text { text } if text == "b"));
}

// =============================================================
// Shared vector resources
// =============================================================

#[test]
fn resource_disposed_after_last_release() {
    let reg = registry();
    let res = svg_resource(&reg, "doc");
    let m = model("doc", json!({}));
    let mut draws: Vec<MapDraw> = (0..3).map(|_| MapDraw::new()).collect();
    for d in &mut draws {
        d.draw(&m, None, &reg, None);
    }
    assert_eq!(res.borrow().ref_count(), 3);

    draws[0].remove();
    draws.pop();
    assert_eq!(res.borrow().ref_count(), 1);
    assert!(!res.borrow().is_disposed());

    draws.clear();
    assert_eq!(res.borrow().ref_count(), 0);
    assert!(res.borrow().is_disposed());
}

#[test]
fn map_change_releases_old_resource_once() {
    let reg = registry();
    let (doc, doc2) = (svg_resource(&reg, "doc"), svg_resource(&reg, "doc2"));
    let mut other = MapDraw::new();
    other.draw(&model("doc", json!({})), None, &reg, None);

    let mut draw = MapDraw::new();
    draw.draw(&model("doc", json!({})), None, &reg, None);
    assert_eq!(doc.borrow().ref_count(), 2);

    draw.draw(&model("doc2", json!({})), None, &reg, Some(&update()));
    draw.draw(&model("doc2", json!({})), None, &reg, Some(&update()));
    assert_eq!(doc.borrow().ref_count(), 1, "only this drawer's hold is released");
    assert_eq!(doc2.borrow().ref_count(), 1);
    assert_eq!(draw.scene().children(&draw.svg_group()).len(), 1);
}

// =============================================================
// Roam
// =============================================================

#[test]
fn pan_translates_exactly_and_labels_stay_upright() {
    let reg = registry();
    let mut m = model("land", json!({"roam": true, "label": {"show": true}}));
    m.transform.roam = Transform::new(0.0, 0.0, 2.0, 2.0);
    let mut draw = MapDraw::new();
    draw.draw(&m, None, &reg, None);

    let before = draw.scene().get(&draw.transform_group()).unwrap().transform;
    assert!(draw.handle_input(&down(5.0, 5.0)).is_empty());
    let actions = draw.handle_input(&moved(15.0, 0.0));
    assert_eq!(actions, vec![Action::RoamPan { component: geo(), dx: 10.0, dy: -5.0 }, Action::RenderNeeded]);

    let after = draw.scene().get(&draw.transform_group()).unwrap().transform;
    assert_eq!((after.x - before.x, after.y - before.y), (10.0, -5.0));
    assert_eq!(after.scale_x, before.scale_x);

    let b = draw.find_graphics_by_region_name(Some("b"), &m);
    let text = draw.scene().get(&b[0]).unwrap().text_content.unwrap();
    let node = draw.scene().get(&text).unwrap();
    assert_eq!(node.transform.scale_x, 0.5);
    assert_eq!((node.world.a, node.world.d), (1.0, 1.0));
}

#[test]
fn zoom_respects_scale_limit() {
    let reg = registry();
    let m = model("land", json!({"roam": "scale", "scaleLimit": {"min": 0.5, "max": 1.5}}));
    let mut draw = MapDraw::new();
    draw.draw(&m, None, &reg, None);

    let mut total = 0.0;
    for _ in 0..10 {
        for action in draw.handle_input(&wheel_in(5.0, 5.0)) {
            if let Action::RoamZoom { total_zoom, .. } = action {
                total = total_zoom;
            }
        }
    }
    assert_eq!(total, 1.5);
    let scale = draw.scene().get(&draw.transform_group()).unwrap().transform.scale_x;
    assert!((scale - 1.5).abs() < 1e-9);
}

#[test]
fn gestures_outside_view_or_on_chrome_are_ignored() {
    let mut reg = registry();
    reg.set_chrome_rects(vec![Rect::new(0.0, 0.0, 4.0, 4.0)]);
    let mut m = model("land", json!({"roam": true}));
    m.view_rect = Some(Rect::new(0.0, 0.0, 30.0, 30.0));
    let mut draw = MapDraw::new();
    draw.draw(&m, None, &reg, None);

    assert!(draw.handle_input(&wheel_in(50.0, 50.0)).is_empty());
    assert!(draw.handle_input(&wheel_in(2.0, 2.0)).is_empty());
    assert!(!draw.handle_input(&wheel_in(20.0, 20.0)).is_empty());
}

#[test]
fn without_view_rect_gestures_start_only_over_drawn_regions() {
    let reg = registry();
    let mut draw = MapDraw::new();
    draw.draw(&model("land", json!({"roam": true})), None, &reg, None);

    assert!(draw.handle_input(&wheel_in(5000.0, 5000.0)).is_empty());
    assert!(!draw.handle_input(&wheel_in(5.0, 5.0)).is_empty());
}

#[test]
fn gesture_area_moves_with_the_pan() {
    let reg = registry();
    let mut draw = MapDraw::new();
    draw.draw(&model("land", json!({"roam": true})), None, &reg, None);

    draw.handle_input(&down(5.0, 5.0));
    draw.handle_input(&moved(105.0, 5.0));
    draw.handle_input(&up(105.0, 5.0));

    assert!(draw.handle_input(&wheel_in(5.0, 5.0)).is_empty());
    assert!(!draw.handle_input(&wheel_in(105.0, 5.0)).is_empty());
}

// =============================================================
// Selection
// =============================================================

#[test]
fn click_toggles_but_drag_does_not() {
    let reg = registry();
    let m = model("land", json!({"roam": true, "selectedMode": "single"}));
    let mut draw = MapDraw::new();
    draw.draw(&m, None, &reg, None);

    draw.handle_input(&down(5.0, 5.0));
    let actions = draw.handle_input(&up(5.0, 5.0));
    assert_eq!(toggles(&actions), vec!["a".to_owned()]);
    assert_eq!(actions[0].to_payload(), json!({"kind": "toggle-select", "componentType": "geo", "geoId": "g0", "name": "a"}));

    draw.handle_input(&down(5.0, 5.0));
    draw.handle_input(&moved(7.0, 7.0));
    let actions = draw.handle_input(&up(7.0, 7.0));
    assert!(toggles(&actions).is_empty());
}

#[test]
fn no_toggle_without_selected_mode_or_off_region() {
    let reg = registry();
    let mut draw = MapDraw::new();
    draw.draw(&model("land", json!({})), None, &reg, None);
    draw.handle_input(&down(5.0, 5.0));
    assert!(draw.handle_input(&up(5.0, 5.0)).is_empty());

    draw.draw(&model("land", json!({"selectedMode": true})), None, &reg, Some(&update()));
    draw.handle_input(&down(15.0, 5.0));
    assert!(toggles(&draw.handle_input(&up(15.0, 5.0))).is_empty());
}

#[test]
fn vector_regions_toggle_by_name() {
    let reg = registry();
    let mut draw = MapDraw::new();
    draw.draw(&model("doc", json!({"selectedMode": true})), None, &reg, None);
    draw.handle_input(&down(10.0, 80.0));
    assert_eq!(toggles(&draw.handle_input(&up(10.0, 80.0))), vec!["south".to_owned()]);
    draw.handle_input(&down(10.0, 10.0));
    assert_eq!(toggles(&draw.handle_input(&up(10.0, 10.0))), vec!["north".to_owned()]);
}

// =============================================================
// Teardown
// =============================================================

#[test]
fn removed_drawer_ignores_input() {
    let reg = registry();
    let mut draw = MapDraw::new();
    draw.draw(&model("land", json!({"roam": true, "selectedMode": true})), None, &reg, None);
    draw.remove();

    for input in [down(5.0, 5.0), moved(20.0, 20.0), up(20.0, 20.0), wheel_in(5.0, 5.0), PointerInput::PinchEnd] {
        assert!(draw.handle_input(&input).is_empty());
    }
    draw.remove();
}
