//! Region labels.
//!
//! Labels are text nodes hosted by a region graphic. They stay upright and
//! at constant screen size while the map is roamed: every label is recorded
//! in a [`LabelTransforms`] side table, and [`refresh`] counter-scales the
//! text against its ancestors and then pins the world matrix to pure
//! translation (plus the label's screen offset).
//!
//! The side table is keyed by text node id and never keeps a node alive:
//! entries whose node has left the scene are pruned on the next refresh.

#[cfg(test)]
#[path = "label_test.rs"]
mod label_test;

use std::collections::HashMap;

use crate::data::DataBinding;
use crate::options::{LabelOption, RegionModel};
use crate::scene::{NodeId, NodeState, Paint, Scene, StateName, Style, TextAlign, TextConfig, TextPosition, VerticalAlign};
use crate::transform::{Point, Transform};

/// Compensation recorded for one label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelEntry {
    /// Screen-space offset added after the upright transform.
    pub offset: Point,
    /// Visibility in the normal state.
    pub raw_ignore: bool,
}

/// Side table of live labels.
#[derive(Debug, Default)]
pub struct LabelTransforms {
    entries: HashMap<NodeId, LabelEntry>,
}

impl LabelTransforms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&LabelEntry> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: NodeId, entry: LabelEntry) {
        self.entries.insert(id, entry);
    }

    pub fn remove(&mut self, id: &NodeId) -> Option<LabelEntry> {
        self.entries.remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries whose text node no longer exists.
    pub fn prune(&mut self, scene: &Scene) {
        self.entries.retain(|id, _| scene.contains(id));
    }
}

/// What the label placer knows about the data side of a region.
#[derive(Clone, Copy)]
pub struct LabelContext<'a> {
    /// Drawing a geo component rather than a map series.
    pub is_geo: bool,
    pub data: Option<&'a dyn DataBinding>,
    pub data_index: Option<usize>,
}

impl LabelContext<'_> {
    fn value(&self) -> f64 {
        match (self.data, self.data_index) {
            (Some(data), Some(idx)) => data.value(idx),
            _ => f64::NAN,
        }
    }

    fn show_label_forced(&self) -> bool {
        match (self.data, self.data_index) {
            (Some(data), Some(idx)) => data.item_layout(idx).is_some_and(|l| l.show_label),
            _ => false,
        }
    }
}

/// Create, update or remove the label hosted by `host`.
///
/// `anchor` is the label position in the host's local space; without one
/// the label sits at the centre of the host's bounding rect.
pub fn reset_label(
    scene: &mut Scene,
    labels: &mut LabelTransforms,
    host: &NodeId,
    model: &RegionModel,
    ctx: &LabelContext<'_>,
    anchor: Option<Point>,
) {
    let value = ctx.value();
    let eligible = ctx.is_geo || value.is_nan() || ctx.show_label_forced();

    let normal_show = model.label.is_shown();
    let show = |label: &LabelOption| label.show.unwrap_or(normal_show);
    let shown = [normal_show, show(&model.emphasis.label), show(&model.select.label), show(&model.blur.label)];

    if !eligible || !shown.iter().any(|s| *s) {
        drop_label(scene, labels, host);
        return;
    }

    let text = format_label(model, ctx, value);
    let Some(text_id) = scene.set_text_content(host, &text) else {
        return;
    };

    let rect = scene.bounding_rect(host);
    let (config, position) = match (anchor, rect) {
        (Some(a), Some(r)) => {
            let percent = |v: f64, origin: f64, extent: f64| if extent == 0.0 { 50.0 } else { (v - origin) / extent * 100.0 };
            let config = TextConfig {
                position: TextPosition::Percent { x: percent(a.x, r.x, r.width), y: percent(a.y, r.y, r.height) },
                layout_rect: Some(r),
                relative_to_host_scale: false,
            };
            (config, a)
        }
        (Some(a), None) => {
            (TextConfig { position: TextPosition::Inside, layout_rect: None, relative_to_host_scale: false }, a)
        }
        (None, r) => (
            TextConfig { position: TextPosition::Inside, layout_rect: r, relative_to_host_scale: true },
            r.map(|r| r.center()).unwrap_or_default(),
        ),
    };

    if let Some(h) = scene.get_mut(host) {
        h.text_config = Some(config);
        h.disable_label_animation = true;
    }
    scene.set_transform(&text_id, Transform::new(position.x, position.y, 1.0, 1.0));

    if let Some(t) = scene.get_mut(&text_id) {
        t.style = text_style(&model.label);
        t.ignore = !shown[0];
        let states = [
            (StateName::Emphasis, &model.emphasis.label, shown[1]),
            (StateName::Select, &model.select.label, shown[2]),
            (StateName::Blur, &model.blur.label, shown[3]),
        ];
        for (name, option, visible) in states {
            t.states.set(name, NodeState { style: text_style(&option.merged_over(&model.label)), ignore: Some(!visible) });
        }
    }

    let offset = model.label.offset.map_or(Point::default(), |[x, y]| Point::new(x, y));
    labels.insert(text_id, LabelEntry { offset, raw_ignore: !shown[0] });
}

fn drop_label(scene: &mut Scene, labels: &mut LabelTransforms, host: &NodeId) {
    if let Some(text) = scene.get(host).and_then(|h| h.text_content) {
        labels.remove(&text);
    }
    scene.remove_text_content(host);
}

/// Label text: the formatter template with `{a}` series name, `{b}` region
/// name and `{c}` value substituted, else the region name.
fn format_label(model: &RegionModel, ctx: &LabelContext<'_>, value: f64) -> String {
    let Some(template) = &model.label.formatter else {
        return model.name.clone();
    };
    let series = ctx.data.map_or("", |d| d.series_name());
    let value = if value.is_nan() { "-".to_owned() } else { value.to_string() };
    template.replace("{a}", series).replace("{b}", &model.name).replace("{c}", &value)
}

fn text_style(label: &LabelOption) -> Style {
    Style {
        fill: label.color.clone().map(Paint::Color),
        font_size: label.font_size,
        font_weight: label.font_weight.clone(),
        font_family: label.font_family.clone(),
        align: Some(TextAlign::Center),
        vertical_align: Some(VerticalAlign::Middle),
        ..Style::default()
    }
}

/// Re-apply upright compensation to every label after a transform change.
pub fn refresh(scene: &mut Scene, labels: &mut LabelTransforms) {
    labels.prune(scene);

    let ids: Vec<NodeId> = labels.entries.keys().copied().collect();
    for id in ids {
        let Some(parent) = scene.get(&id).and_then(|n| n.parent) else {
            continue;
        };
        let (sx, sy) = scene.world_scale(&parent);
        if let Some(node) = scene.get_mut(&id) {
            node.transform.scale_x = if sx == 0.0 { 1.0 } else { 1.0 / sx };
            node.transform.scale_y = if sy == 0.0 { 1.0 } else { 1.0 / sy };
        }
    }

    let entries = &labels.entries;
    scene.update_transforms_with(|id, m| {
        if let Some(entry) = entries.get(&id) {
            m.a = 1.0;
            m.b = 0.0;
            m.c = 0.0;
            m.d = 1.0;
            m.e += entry.offset.x;
            m.f += entry.offset.y;
        }
    });
}
