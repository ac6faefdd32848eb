//! Region style resolution.
//!
//! Turns a merged [`RegionModel`] (plus the bound data item, when there is
//! one) into the four style records of a region graphic and installs them on
//! scene nodes. Only the normal style is applied; emphasis, select and blur
//! are installed as alternate states for the host to activate.

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

use crate::data::{DataBinding, DecalOption, Visual, VisualKey};
use crate::options::{ItemStyleOption, RegionModel};
use crate::scene::{NodeId, NodeState, Paint, Pattern, Scene, StateName, Style};

/// Device context patterns are sized for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternContext {
    pub dpr: f64,
}

impl Default for PatternContext {
    fn default() -> Self {
        Self { dpr: 1.0 }
    }
}

/// The four style records of one region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionStyles {
    pub normal: Style,
    pub emphasis: Style,
    pub select: Style,
    pub blur: Style,
}

/// Map an item-style option onto a node style. `areaColor` wins over
/// `color` for the fill.
#[must_use]
pub fn fixed_item_style(option: &ItemStyleOption) -> Style {
    Style {
        fill: option.area_color.clone().or_else(|| option.color.clone()).map(Paint::Color),
        stroke: option.border_color.clone(),
        line_width: option.border_width,
        opacity: option.opacity,
        shadow_blur: option.shadow_blur,
        shadow_color: option.shadow_color.clone(),
        ..Style::default()
    }
}

/// Materialize a decal into a pattern drawn over `background`.
#[must_use]
pub fn create_pattern(decal: &DecalOption, background: Option<String>, ctx: &PatternContext) -> Pattern {
    Pattern {
        symbol: decal.symbol.clone(),
        symbol_size: decal.symbol_size,
        color: decal.color.clone(),
        background: decal.background_color.clone().or(background),
        tile_width: decal.dash_array_x * ctx.dpr,
        tile_height: decal.dash_array_y * ctx.dpr,
        rotation: decal.rotation,
        dpr: ctx.dpr,
    }
}

/// Resolve every state's style for a region.
///
/// With a data item bound, a visual-map color replaces the normal fill, and
/// a decal replaces it again with a pattern whose background is the fill it
/// displaced.
#[must_use]
pub fn resolve_region_styles(
    model: &RegionModel,
    data: Option<&dyn DataBinding>,
    data_index: Option<usize>,
    ctx: &PatternContext,
) -> RegionStyles {
    let mut normal = fixed_item_style(&model.item_style);

    if let (Some(data), Some(index)) = (data, data_index) {
        if data.has_visual_meta() {
            if let Some(Visual::Color(color)) = data.item_visual(index, VisualKey::Color) {
                normal.fill = Some(Paint::Color(color));
            }
        }
        if let Some(Visual::Decal(decal)) = data.item_visual(index, VisualKey::Decal) {
            let background = match normal.fill.take() {
                Some(Paint::Color(c)) => Some(c),
                _ => None,
            };
            normal.fill = Some(Paint::Pattern(create_pattern(&decal, background, ctx)));
        }
    }

    RegionStyles {
        normal,
        emphasis: fixed_item_style(&model.emphasis.item_style),
        select: fixed_item_style(&model.select.item_style),
        blur: fixed_item_style(&model.blur.item_style),
    }
}

/// Apply the normal style to `el` and install the alternates without
/// activating them.
pub fn apply_region_styles(scene: &mut Scene, el: &NodeId, styles: &RegionStyles) {
    let Some(node) = scene.get_mut(el) else {
        return;
    };
    node.style = Style { stroke_no_scale: true, ..styles.normal.clone() };
    node.states.set(StateName::Emphasis, NodeState { style: styles.emphasis.clone(), ignore: None });
    node.states.set(StateName::Select, NodeState { style: styles.select.clone(), ignore: None });
    node.states.set(StateName::Blur, NodeState { style: styles.blur.clone(), ignore: None });
    node.state_proxy = true;
}

/// Give a non-region node of a focus-self document the states it needs to
/// take part in hover blur: an emphasis state and a blur state at the
/// component's blur opacity.
pub fn install_document_blur(scene: &mut Scene, el: &NodeId, blur_opacity: Option<f64>) {
    let Some(node) = scene.get_mut(el) else {
        return;
    };
    node.state_proxy = true;
    node.states.ensure(StateName::Emphasis);
    let blur = node.states.ensure(StateName::Blur);
    if blur.style.opacity.is_none() {
        blur.style.opacity = blur_opacity;
    }
}
