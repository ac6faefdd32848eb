#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::data::{DataItem, SeriesData};
use crate::options::MapOptions;
use crate::scene::{NodeKind, PathShape, SubPath};

fn model(options: serde_json::Value, name: &str) -> RegionModel {
    serde_json::from_value::<MapOptions>(options).unwrap().region_model(name)
}

fn square_host(scene: &mut Scene) -> NodeId {
    let g = scene.add_group(scene.root());
    scene.add(
        g,
        NodeKind::Path(PathShape {
            subpaths: vec![SubPath {
                points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 20.0), Point::new(0.0, 20.0)],
                closed: true,
            }],
            segment_ignore_threshold: 1.0,
        }),
    )
}

fn geo_ctx() -> LabelContext<'static> {
    LabelContext { is_geo: true, data: None, data_index: None }
}

fn text_of(scene: &Scene, host: &NodeId) -> Option<String> {
    let id = scene.get(host)?.text_content?;
    match &scene.get(&id)?.kind {
        NodeKind::Text { text } => Some(text.clone()),
        _ => None,
    }
}

// =============================================================
// Eligibility and visibility
// =============================================================

#[test]
fn geo_label_created_when_emphasis_shows() {
    let mut scene = Scene::new();
    let mut labels = LabelTransforms::new();
    let host = square_host(&mut scene);
    reset_label(&mut scene, &mut labels, &host, &model(json!({}), "A"), &geo_ctx(), Some(Point::new(5.0, 10.0)));

    let text_id = scene.get(&host).unwrap().text_content.unwrap();
    let text = scene.get(&text_id).unwrap();
    assert_eq!(text_of(&scene, &host).as_deref(), Some("A"));
    assert!(text.ignore);
    assert_eq!(text.states.get(StateName::Emphasis).unwrap().ignore, Some(false));
    assert!(labels.get(&text_id).unwrap().raw_ignore);
}

#[test]
fn no_state_shows_means_no_text() {
    let mut scene = Scene::new();
    let mut labels = LabelTransforms::new();
    let host = square_host(&mut scene);
    let m = model(json!({ "emphasis": { "label": { "show": false } }, "select": { "label": { "show": false } } }), "A");
    reset_label(&mut scene, &mut labels, &host, &m, &geo_ctx(), None);
    assert!(scene.get(&host).unwrap().text_content.is_none());
    assert!(labels.is_empty());
}

#[test]
fn nan_value_keeps_label_even_without_show_label() {
    let data = SeriesData::new("s", vec![DataItem { name: "A".into(), ..Default::default() }], false);
    let ctx = LabelContext { is_geo: false, data: Some(&data), data_index: Some(0) };
    let mut scene = Scene::new();
    let mut labels = LabelTransforms::new();
    let host = square_host(&mut scene);
    reset_label(&mut scene, &mut labels, &host, &model(json!({ "label": { "show": true } }), "A"), &ctx, None);
    assert!(scene.get(&host).unwrap().text_content.is_some());
}

#[test]
fn valued_series_region_without_show_label_loses_label() {
    let items = vec![DataItem { name: "A".into(), value: Some(3.0), ..Default::default() }];
    let data = SeriesData::new("s", items, false);
    let ctx = LabelContext { is_geo: false, data: Some(&data), data_index: Some(0) };
    let mut scene = Scene::new();
    let mut labels = LabelTransforms::new();
    let host = square_host(&mut scene);
    let m = model(json!({ "label": { "show": true } }), "A");

    reset_label(&mut scene, &mut labels, &host, &m, &geo_ctx(), None);
    assert_eq!(labels.len(), 1);

    reset_label(&mut scene, &mut labels, &host, &m, &ctx, None);
    assert!(scene.get(&host).unwrap().text_content.is_none());
    assert!(scene.get(&host).unwrap().text_config.is_none());
    assert!(labels.is_empty());
}

#[test]
fn show_label_layout_forces_label() {
    let items = vec![DataItem { name: "A".into(), value: Some(3.0), show_label: true, ..Default::default() }];
    let data = SeriesData::new("s", items, false);
    let ctx = LabelContext { is_geo: false, data: Some(&data), data_index: Some(0) };
    let mut scene = Scene::new();
    let mut labels = LabelTransforms::new();
    let host = square_host(&mut scene);
    reset_label(&mut scene, &mut labels, &host, &model(json!({ "label": { "show": true } }), "A"), &ctx, None);
    assert!(scene.get(&host).unwrap().text_content.is_some());
}

// =============================================================
// Text and placement
// =============================================================

#[test]
fn formatter_substitutes_series_name_and_value() {
    let items = vec![DataItem { name: "A".into(), value: Some(7.0), show_label: true, ..Default::default() }];
    let data = SeriesData::new("Pop", items, false);
    let ctx = LabelContext { is_geo: false, data: Some(&data), data_index: Some(0) };
    let mut scene = Scene::new();
    let mut labels = LabelTransforms::new();
    let host = square_host(&mut scene);
    let m = model(json!({ "label": { "show": true, "formatter": "{a}: {b} = {c}" } }), "A");
    reset_label(&mut scene, &mut labels, &host, &m, &ctx, None);
    assert_eq!(text_of(&scene, &host).as_deref(), Some("Pop: A = 7"));
}

#[test]
fn anchor_becomes_percent_position() {
    let mut scene = Scene::new();
    let mut labels = LabelTransforms::new();
    let host = square_host(&mut scene);
    reset_label(&mut scene, &mut labels, &host, &model(json!({}), "A"), &geo_ctx(), Some(Point::new(5.0, 5.0)));

    let config = scene.get(&host).unwrap().text_config.unwrap();
    assert_eq!(config.position, TextPosition::Percent { x: 50.0, y: 25.0 });
    assert!(!config.relative_to_host_scale);
    assert!(scene.get(&host).unwrap().disable_label_animation);

    let text = scene.get(&host).unwrap().text_content.unwrap();
    let t = scene.get(&text).unwrap();
    assert_eq!((t.transform.x, t.transform.y), (5.0, 5.0));
    assert_eq!(t.style.align, Some(TextAlign::Center));
    assert_eq!(t.style.vertical_align, Some(VerticalAlign::Middle));
}

#[test]
fn without_anchor_label_sits_at_bbox_center() {
    let mut scene = Scene::new();
    let mut labels = LabelTransforms::new();
    let host = square_host(&mut scene);
    reset_label(&mut scene, &mut labels, &host, &model(json!({}), "A"), &geo_ctx(), None);
    let text = scene.get(&host).unwrap().text_content.unwrap();
    let t = scene.get(&text).unwrap();
    assert_eq!((t.transform.x, t.transform.y), (5.0, 10.0));
    assert_eq!(scene.get(&host).unwrap().text_config.unwrap().position, TextPosition::Inside);
}

// =============================================================
// Refresh
// =============================================================

#[test]
fn refresh_counter_scales_and_keeps_upright() {
    let mut scene = Scene::new();
    let mut labels = LabelTransforms::new();
    let host = square_host(&mut scene);
    let group = scene.get(&host).unwrap().parent.unwrap();
    let m = model(json!({ "label": { "show": true, "offset": [3, -2] } }), "A");
    reset_label(&mut scene, &mut labels, &host, &m, &geo_ctx(), Some(Point::new(5.0, 5.0)));

    scene.set_transform(&group, Transform::new(100.0, 50.0, 4.0, 2.0));
    refresh(&mut scene, &mut labels);

    let text = scene.get(&host).unwrap().text_content.unwrap();
    let t = scene.get(&text).unwrap();
    assert_eq!((t.transform.scale_x, t.transform.scale_y), (0.25, 0.5));
    assert_eq!(t.world.scale(), (1.0, 1.0));
    assert_eq!(t.world.apply(Point::new(0.0, 0.0)), Point::new(100.0 + 20.0 + 3.0, 50.0 + 10.0 - 2.0));
}

#[test]
fn refresh_prunes_dead_labels() {
    let mut scene = Scene::new();
    let mut labels = LabelTransforms::new();
    let host = square_host(&mut scene);
    reset_label(&mut scene, &mut labels, &host, &model(json!({}), "A"), &geo_ctx(), None);
    assert_eq!(labels.len(), 1);
    scene.remove(&host);
    refresh(&mut scene, &mut labels);
    assert!(labels.is_empty());
}
