use serde_json::json;

use super::*;

fn parse(value: serde_json::Value) -> MapOptions {
    serde_json::from_value(value).unwrap()
}

// =============================================================
// Modes
// =============================================================

#[test]
fn roam_accepts_flags_and_names() {
    assert_eq!(parse(json!({ "roam": true })).roam, RoamMode::Both);
    assert_eq!(parse(json!({ "roam": false })).roam, RoamMode::Off);
    assert_eq!(parse(json!({ "roam": "move" })).roam, RoamMode::Move);
    assert_eq!(parse(json!({ "roam": "scale" })).roam, RoamMode::Scale);
}

#[test]
fn roam_mode_capabilities() {
    assert!(RoamMode::Move.can_move());
    assert!(!RoamMode::Move.can_scale());
    assert!(RoamMode::Scale.can_scale());
    assert!(!RoamMode::Scale.can_move());
    assert!(!RoamMode::Off.is_enabled());
}

#[test]
fn selected_mode_accepts_flags_and_names() {
    assert_eq!(parse(json!({ "selectedMode": true })).selected_mode, SelectedMode::Single);
    assert_eq!(parse(json!({ "selectedMode": "multiple" })).selected_mode, SelectedMode::Multiple);
    assert_eq!(parse(json!({ "selectedMode": false })).selected_mode, SelectedMode::Off);
}

#[test]
fn defaults_when_empty() {
    let opts = parse(json!({}));
    assert_eq!(opts.roam, RoamMode::Off);
    assert!(opts.animation);
    assert_eq!(opts.animation_duration_update, DEFAULT_UPDATE_DURATION_MS);
    assert!(opts.regions.is_empty());
}

#[test]
fn emphasis_focus_and_scope_decode() {
    let opts = parse(json!({ "emphasis": { "focus": "self", "blurScope": "global", "disabled": true } }));
    assert_eq!(opts.emphasis.focus, Some(Focus::OnlySelf));
    assert_eq!(opts.emphasis.blur_scope, Some(BlurScope::Global));
    assert_eq!(opts.emphasis.disabled, Some(true));
}

#[test]
fn scale_limit_decodes() {
    let opts = parse(json!({ "scaleLimit": { "min": 0.5, "max": 4 } }));
    assert_eq!(opts.scale_limit, Some(ScaleLimit { min: Some(0.5), max: Some(4.0) }));
}

// =============================================================
// Region model merging
// =============================================================

#[test]
fn region_model_falls_back_to_builtin_defaults() {
    let model = parse(json!({})).region_model("Texas");
    assert_eq!(model.name, "Texas");
    assert_eq!(model.item_style.color.as_deref(), Some(DEFAULT_AREA_COLOR));
    assert_eq!(model.item_style.border_color.as_deref(), Some(DEFAULT_BORDER_COLOR));
    assert_eq!(model.item_style.border_width, Some(DEFAULT_BORDER_WIDTH));
    assert_eq!(model.label.show, Some(false));
    assert_eq!(model.emphasis.label.show, Some(true));
    assert_eq!(model.select.item_style.color.as_deref(), Some(DEFAULT_EMPHASIS_AREA_COLOR));
    assert_eq!(model.option.name, "Texas");
}

#[test]
fn component_options_override_defaults() {
    let model = parse(json!({ "itemStyle": { "borderColor": "#f00" } })).region_model("Texas");
    assert_eq!(model.item_style.border_color.as_deref(), Some("#f00"));
    assert_eq!(model.item_style.color.as_deref(), Some(DEFAULT_AREA_COLOR));
}

#[test]
fn region_options_override_component() {
    let opts = parse(json!({
        "itemStyle": { "areaColor": "#0f0" },
        "regions": [{ "name": "Texas", "itemStyle": { "areaColor": "#00f" }, "selected": true }]
    }));
    let texas = opts.region_model("Texas");
    let ohio = opts.region_model("Ohio");
    assert_eq!(texas.item_style.area_color.as_deref(), Some("#00f"));
    assert!(texas.selected);
    assert_eq!(ohio.item_style.area_color.as_deref(), Some("#0f0"));
    assert!(!ohio.selected);
}

#[test]
fn region_tooltip_wins_over_component_tooltip() {
    let opts = parse(json!({
        "tooltip": { "show": true },
        "regions": [{ "name": "Texas", "tooltip": { "show": false } }]
    }));
    assert_eq!(opts.region_model("Texas").tooltip, Some(json!({ "show": false })));
    assert_eq!(opts.region_model("Ohio").tooltip, Some(json!({ "show": true })));
}

#[test]
fn blur_has_no_builtin_defaults() {
    let model = parse(json!({})).region_model("Texas");
    assert_eq!(model.blur, StateOption::default());
}

#[test]
fn label_offset_decodes() {
    let opts = parse(json!({ "label": { "show": true, "offset": [4, -2] } }));
    assert_eq!(opts.label.offset, Some([4.0, -2.0]));
    assert!(opts.label.is_shown());
}
