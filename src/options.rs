//! Component and per-region options.
//!
//! DESIGN
//! ======
//! Options arrive as camelCase JSON and are decoded with serde. Every leaf is
//! optional so that three layers can be merged field by field when a region
//! model is requested: the region's own entry in `regions`, then the
//! component-level option, then the built-in defaults. The merged
//! [`RegionModel`] is what the style, label and event passes read.

#[cfg(test)]
#[path = "options_test.rs"]
mod options_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_AREA_COLOR, DEFAULT_BORDER_COLOR, DEFAULT_BORDER_WIDTH, DEFAULT_EMPHASIS_AREA_COLOR,
    DEFAULT_EMPHASIS_LABEL_COLOR, DEFAULT_LABEL_COLOR, DEFAULT_UPDATE_DURATION_MS,
};

// =============================================================================
// MODES
// =============================================================================

/// Which roam gestures are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "FlagOrName")]
pub enum RoamMode {
    #[default]
    Off,
    /// Pan only (`"move"`).
    Move,
    /// Zoom only (`"scale"`).
    Scale,
    /// Pan and zoom (`true`).
    Both,
}

impl RoamMode {
    #[must_use]
    pub fn can_move(self) -> bool {
        matches!(self, Self::Move | Self::Both)
    }

    #[must_use]
    pub fn can_scale(self) -> bool {
        matches!(self, Self::Scale | Self::Both)
    }

    #[must_use]
    pub fn is_enabled(self) -> bool {
        self != Self::Off
    }
}

/// Region selection behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "FlagOrName")]
pub enum SelectedMode {
    #[default]
    Off,
    Single,
    Multiple,
}

impl SelectedMode {
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self != Self::Off
    }
}

/// `true`/`false` or a mode name, as accepted by `roam` and `selectedMode`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagOrName {
    Flag(bool),
    Name(String),
}

impl From<FlagOrName> for RoamMode {
    fn from(raw: FlagOrName) -> Self {
        match raw {
            FlagOrName::Flag(false) => Self::Off,
            FlagOrName::Flag(true) => Self::Both,
            FlagOrName::Name(name) => match name.as_str() {
                "move" | "pan" => Self::Move,
                "scale" | "zoom" => Self::Scale,
                "" => Self::Off,
                _ => Self::Both,
            },
        }
    }
}

impl From<FlagOrName> for SelectedMode {
    fn from(raw: FlagOrName) -> Self {
        match raw {
            FlagOrName::Flag(false) => Self::Off,
            FlagOrName::Flag(true) => Self::Single,
            FlagOrName::Name(name) => match name.as_str() {
                "multiple" => Self::Multiple,
                "" => Self::Off,
                _ => Self::Single,
            },
        }
    }
}

/// Which elements hovering a region emphasizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Focus {
    #[default]
    None,
    /// Blur everything except the hovered region.
    #[serde(rename = "self")]
    OnlySelf,
    Series,
}

/// How far the blur of a focused hover reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlurScope {
    #[default]
    CoordinateSystem,
    Series,
    Global,
}

/// Zoom clamp for roam.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct ScaleLimit {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

// =============================================================================
// STYLE OPTIONS
// =============================================================================

/// Item style of a region in one state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemStyleOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Region fill; wins over `color` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<String>,
}

impl ItemStyleOption {
    /// Field-wise merge: values set on `self` win over `base`.
    #[must_use]
    pub fn merged_over(&self, base: &Self) -> Self {
        Self {
            color: self.color.clone().or_else(|| base.color.clone()),
            area_color: self.area_color.clone().or_else(|| base.area_color.clone()),
            border_color: self.border_color.clone().or_else(|| base.border_color.clone()),
            border_width: self.border_width.or(base.border_width),
            opacity: self.opacity.or(base.opacity),
            shadow_blur: self.shadow_blur.or(base.shadow_blur),
            shadow_color: self.shadow_color.clone().or_else(|| base.shadow_color.clone()),
        }
    }
}

/// Label options of a region in one state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Template with `{a}` series name, `{b}` region name, `{c}` value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<String>,
    /// Screen-space offset `[dx, dy]` applied after upright compensation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<[f64; 2]>,
}

impl LabelOption {
    #[must_use]
    pub fn merged_over(&self, base: &Self) -> Self {
        Self {
            show: self.show.or(base.show),
            color: self.color.clone().or_else(|| base.color.clone()),
            font_size: self.font_size.or(base.font_size),
            font_weight: self.font_weight.clone().or_else(|| base.font_weight.clone()),
            font_family: self.font_family.clone().or_else(|| base.font_family.clone()),
            formatter: self.formatter.clone().or_else(|| base.formatter.clone()),
            offset: self.offset.or(base.offset),
        }
    }

    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.show.unwrap_or(false)
    }
}

/// Options for the `select` and `blur` states.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StateOption {
    pub item_style: ItemStyleOption,
    pub label: LabelOption,
}

impl StateOption {
    #[must_use]
    pub fn merged_over(&self, base: &Self) -> Self {
        Self { item_style: self.item_style.merged_over(&base.item_style), label: self.label.merged_over(&base.label) }
    }
}

/// Options for the `emphasis` (hover) state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmphasisOption {
    pub item_style: ItemStyleOption,
    pub label: LabelOption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<Focus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur_scope: Option<BlurScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl EmphasisOption {
    #[must_use]
    pub fn merged_over(&self, base: &Self) -> Self {
        Self {
            item_style: self.item_style.merged_over(&base.item_style),
            label: self.label.merged_over(&base.label),
            focus: self.focus.or(base.focus),
            blur_scope: self.blur_scope.or(base.blur_scope),
            disabled: self.disabled.or(base.disabled),
        }
    }
}

// =============================================================================
// REGION + COMPONENT OPTIONS
// =============================================================================

/// Per-region override entry from the `regions` list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegionOption {
    pub name: String,
    pub item_style: ItemStyleOption,
    pub label: LabelOption,
    pub emphasis: EmphasisOption,
    pub select: StateOption,
    pub blur: StateOption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<serde_json::Value>,
    pub selected: bool,
}

/// Options of a geo component or map series.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapOptions {
    /// Series name, used as `{a}` in label formatters.
    pub name: Option<String>,
    pub roam: RoamMode,
    pub scale_limit: Option<ScaleLimit>,
    pub selected_mode: SelectedMode,
    pub item_style: ItemStyleOption,
    pub label: LabelOption,
    pub emphasis: EmphasisOption,
    pub select: StateOption,
    pub blur: StateOption,
    pub tooltip: Option<serde_json::Value>,
    pub regions: Vec<RegionOption>,
    pub animation: bool,
    pub animation_duration_update: u32,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            name: None,
            roam: RoamMode::Off,
            scale_limit: None,
            selected_mode: SelectedMode::Off,
            item_style: ItemStyleOption::default(),
            label: LabelOption::default(),
            emphasis: EmphasisOption::default(),
            select: StateOption::default(),
            blur: StateOption::default(),
            tooltip: None,
            regions: Vec::new(),
            animation: true,
            animation_duration_update: DEFAULT_UPDATE_DURATION_MS,
        }
    }
}

/// Fully merged options for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionModel {
    pub name: String,
    /// The region's raw `regions` entry, or an empty one carrying the name.
    pub option: RegionOption,
    pub item_style: ItemStyleOption,
    pub label: LabelOption,
    pub emphasis: EmphasisOption,
    pub select: StateOption,
    pub blur: StateOption,
    pub tooltip: Option<serde_json::Value>,
    pub selected: bool,
}

impl MapOptions {
    /// Region entry by name, if the option lists one.
    #[must_use]
    pub fn region_option(&self, name: &str) -> Option<&RegionOption> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Merge region → component → built-in defaults for `name`.
    #[must_use]
    pub fn region_model(&self, name: &str) -> RegionModel {
        let option = self
            .region_option(name)
            .cloned()
            .unwrap_or_else(|| RegionOption { name: name.to_owned(), ..RegionOption::default() });
        let defaults = Defaults::get();

        let item_style = option.item_style.merged_over(&self.item_style.merged_over(&defaults.item_style));
        let label = option.label.merged_over(&self.label.merged_over(&defaults.label));
        let emphasis = option.emphasis.merged_over(&self.emphasis.merged_over(&defaults.emphasis));
        let select = option.select.merged_over(&self.select.merged_over(&defaults.select));
        let blur = option.blur.merged_over(&self.blur);
        let tooltip = option.tooltip.clone().or_else(|| self.tooltip.clone());
        let selected = option.selected;

        RegionModel { name: name.to_owned(), option, item_style, label, emphasis, select, blur, tooltip, selected }
    }
}

/// Built-in option layer beneath every component.
struct Defaults {
    item_style: ItemStyleOption,
    label: LabelOption,
    emphasis: EmphasisOption,
    select: StateOption,
}

impl Defaults {
    fn get() -> Self {
        let highlight_item = ItemStyleOption { color: Some(DEFAULT_EMPHASIS_AREA_COLOR.into()), ..Default::default() };
        let highlight_label =
            LabelOption { show: Some(true), color: Some(DEFAULT_EMPHASIS_LABEL_COLOR.into()), ..Default::default() };
        Self {
            item_style: ItemStyleOption {
                color: Some(DEFAULT_AREA_COLOR.into()),
                border_color: Some(DEFAULT_BORDER_COLOR.into()),
                border_width: Some(DEFAULT_BORDER_WIDTH),
                ..Default::default()
            },
            label: LabelOption { show: Some(false), color: Some(DEFAULT_LABEL_COLOR.into()), ..Default::default() },
            emphasis: EmphasisOption {
                item_style: highlight_item.clone(),
                label: highlight_label.clone(),
                ..Default::default()
            },
            select: StateOption { item_style: highlight_item, label: highlight_label },
        }
    }
}
