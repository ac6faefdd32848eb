//! Data binding: the optional series that drives per-region values and
//! visuals.
//!
//! The drawer only reads through [`DataBinding`]. [`SeriesData`] is a plain
//! table implementation that hosts can deserialize directly.

#[cfg(test)]
#[path = "data_test.rs"]
mod data_test;

use std::collections::HashMap;

use serde::Deserialize;

/// Per-item visual channels the drawer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKey {
    Color,
    Decal,
}

/// A decal description to be materialized into a pattern fill.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecalOption {
    pub symbol: String,
    pub symbol_size: f64,
    pub color: String,
    pub background_color: Option<String>,
    pub dash_array_x: f64,
    pub dash_array_y: f64,
    /// Radians.
    pub rotation: f64,
}

impl Default for DecalOption {
    fn default() -> Self {
        Self {
            symbol: "rect".into(),
            symbol_size: 1.0,
            color: "rgba(0, 0, 0, 0.2)".into(),
            background_color: None,
            dash_array_x: 5.0,
            dash_array_y: 5.0,
            rotation: 0.0,
        }
    }
}

/// Value of a visual channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    Color(String),
    Decal(DecalOption),
}

/// Layout facts about a data item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemLayout {
    /// Force the label on regardless of the bound value.
    pub show_label: bool,
}

/// Read access to the series bound to a map.
pub trait DataBinding {
    /// Index of the item named `name`.
    fn index_of_name(&self, name: &str) -> Option<usize>;

    /// Bound value, NaN when missing.
    fn value(&self, index: usize) -> f64;

    fn item_visual(&self, index: usize, key: VisualKey) -> Option<Visual>;

    fn item_layout(&self, index: usize) -> Option<ItemLayout>;

    /// Whether visuals were encoded by a visual map (so item colors override
    /// configured fills).
    fn has_visual_meta(&self) -> bool;

    /// Series name, substituted for `{a}` in label templates.
    fn series_name(&self) -> &str;
}

/// One row of [`SeriesData`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataItem {
    pub name: String,
    pub value: Option<f64>,
    pub color: Option<String>,
    pub decal: Option<DecalOption>,
    pub show_label: bool,
}

/// A deserializable series table.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "RawSeries")]
pub struct SeriesData {
    pub name: String,
    pub items: Vec<DataItem>,
    pub visual_meta: bool,
    by_name: HashMap<String, usize>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawSeries {
    name: String,
    #[serde(alias = "data")]
    items: Vec<DataItem>,
    visual_meta: bool,
}

impl From<RawSeries> for SeriesData {
    fn from(raw: RawSeries) -> Self {
        Self::new(raw.name, raw.items, raw.visual_meta)
    }
}

impl SeriesData {
    /// Build a table. When names repeat, the first item wins the name lookup.
    #[must_use]
    pub fn new(name: impl Into<String>, items: Vec<DataItem>, visual_meta: bool) -> Self {
        let mut by_name = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            by_name.entry(item.name.clone()).or_insert(i);
        }
        Self { name: name.into(), items, visual_meta, by_name }
    }
}

impl DataBinding for SeriesData {
    fn index_of_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    fn value(&self, index: usize) -> f64 {
        self.items.get(index).and_then(|i| i.value).unwrap_or(f64::NAN)
    }

    fn item_visual(&self, index: usize, key: VisualKey) -> Option<Visual> {
        let item = self.items.get(index)?;
        match key {
            VisualKey::Color => item.color.clone().map(Visual::Color),
            VisualKey::Decal => item.decal.clone().map(Visual::Decal),
        }
    }

    fn item_layout(&self, index: usize) -> Option<ItemLayout> {
        self.items.get(index).map(|i| ItemLayout { show_label: i.show_label })
    }

    fn has_visual_meta(&self) -> bool {
        self.visual_meta
    }

    fn series_name(&self) -> &str {
        &self.name
    }
}
