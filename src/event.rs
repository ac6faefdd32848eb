//! Event, tooltip and hover bindings for region graphics.
//!
//! A region graphic is either bound to a data item (the host resolves events
//! through the data index) or, without data, carries a synthetic payload
//! naming the component and region. Tooltip configs are attached only in
//! the second case.

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::options::{BlurScope, Focus, RegionModel, RegionOption};
use crate::scene::{NodeId, Scene};

/// Kind of component that owns a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Geo,
    Series,
}

impl ComponentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Geo => "geo",
            Self::Series => "series",
        }
    }

    /// Payload key carrying the component id in outbound actions.
    #[must_use]
    pub fn id_key(self) -> &'static str {
        match self {
            Self::Geo => "geoId",
            Self::Series => "seriesId",
        }
    }
}

/// Identity of the component being drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    pub main_type: ComponentType,
    pub id: String,
    pub index: usize,
}

/// Payload attached to a region graphic when no data is bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub component_type: ComponentType,
    pub component_index: usize,
    pub component_id: String,
    pub name: String,
    /// The raw `regions` entry for this region.
    pub region: RegionOption,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipConfig {
    pub component_main_type: ComponentType,
    pub component_index: usize,
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<Value>,
}

/// Hover behaviour of a region host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverEmphasis {
    pub focus: Focus,
    pub blur_scope: BlurScope,
    pub disabled: bool,
    /// Name under which geo components highlight/downplay the region.
    pub high_down_name: Option<String>,
}

/// How a region graphic relates to the bound series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// No series is bound to the map.
    NoData,
    /// A series is bound; the region's item index, if it has one.
    Data(Option<usize>),
}

impl Binding {
    #[must_use]
    pub fn has_data(self) -> bool {
        matches!(self, Self::Data(_))
    }
}

/// Bind `el` to its data item, or attach the synthetic payload when there
/// is no data. With data, `el` becomes the item's graphic (last write wins
/// when several graphics share the item).
pub fn reset_event_trigger(
    scene: &mut Scene,
    el: &NodeId,
    model: &RegionModel,
    component: &ComponentRef,
    binding: Binding,
    item_graphics: &mut HashMap<usize, NodeId>,
) {
    let Some(node) = scene.get_mut(el) else {
        return;
    };
    match binding {
        Binding::Data(data_index) => {
            node.event_data = None;
            node.data_index = data_index;
            if let Some(idx) = data_index {
                item_graphics.insert(idx, *el);
            }
        }
        Binding::NoData => {
            node.data_index = None;
            node.event_data = Some(EventData {
                component_type: component.main_type,
                component_index: component.index,
                component_id: component.id.clone(),
                name: model.name.clone(),
                region: model.option.clone(),
            });
        }
    }
}

/// Attach the tooltip config iff no data is bound.
pub fn reset_tooltip(scene: &mut Scene, el: &NodeId, model: &RegionModel, component: &ComponentRef, has_data: bool) {
    let Some(node) = scene.get_mut(el) else {
        return;
    };
    node.tooltip = (!has_data).then(|| TooltipConfig {
        component_main_type: component.main_type,
        component_index: component.index,
        item_name: model.name.clone(),
        option: model.tooltip.clone(),
    });
}

/// Install hover emphasis on `el` from the region's emphasis options and
/// return its focus.
pub fn reset_state_trigger(scene: &mut Scene, el: &NodeId, model: &RegionModel, component: &ComponentRef) -> Focus {
    let focus = model.emphasis.focus.unwrap_or_default();
    if let Some(node) = scene.get_mut(el) {
        node.hover = Some(HoverEmphasis {
            focus,
            blur_scope: model.emphasis.blur_scope.unwrap_or_default(),
            disabled: model.emphasis.disabled.unwrap_or(false),
            high_down_name: (component.main_type == ComponentType::Geo).then(|| model.name.clone()),
        });
    }
    focus
}
