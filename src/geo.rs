//! Boundary region sets and the GeoJSON loader.
//!
//! A boundary region is a name plus polygons (exterior ring and holes) and
//! optional polylines, all in source units. Each GeoJSON feature becomes one
//! region; features that share a name stay separate regions.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::MapError;
use crate::transform::{Point, Rect};

/// One polygon: an exterior ring and zero or more interior rings (holes).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    pub interiors: Vec<Vec<Point>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    LineString(Vec<Point>),
}

/// A named area made of one or more geometries.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRegion {
    pub name: String,
    pub geometries: Vec<Geometry>,
    /// Label anchor in source units.
    pub center: Point,
}

impl BoundaryRegion {
    /// Build a region, computing its center unless one is supplied.
    #[must_use]
    pub fn new(name: impl Into<String>, geometries: Vec<Geometry>, center: Option<Point>) -> Self {
        let center = center.unwrap_or_else(|| compute_center(&geometries));
        Self { name: name.into(), geometries, center }
    }

    /// Bounding rect of every vertex in source units.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(self.geometries.iter().flat_map(|g| match g {
            Geometry::Polygon(p) => p.exterior.iter(),
            Geometry::LineString(l) => l.iter(),
        }))
    }
}

/// All regions of one map, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryRegionSet {
    pub regions: Vec<BoundaryRegion>,
}

/// How GeoJSON features are named.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeoJsonOptions {
    /// Feature property holding the region name.
    pub name_property: String,
    /// Renames applied after reading `name_property`.
    pub name_map: HashMap<String, String>,
}

impl Default for GeoJsonOptions {
    fn default() -> Self {
        Self { name_property: "name".into(), name_map: HashMap::new() }
    }
}

impl BoundaryRegionSet {
    #[must_use]
    pub fn new(regions: Vec<BoundaryRegion>) -> Self {
        Self { regions }
    }

    /// Decode a GeoJSON `FeatureCollection` (or single `Feature`).
    ///
    /// # Errors
    ///
    /// Returns [`MapError::GeoJson`] for malformed JSON or geometry and
    /// [`MapError::UnsupportedGeometry`] for any other root type.
    pub fn from_geojson(text: &str, options: &GeoJsonOptions) -> Result<Self, MapError> {
        let root: Value = serde_json::from_str(text)?;
        let features = match root.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => serde_json::from_value::<FeatureCollection>(root)?.features,
            Some("Feature") => vec![serde_json::from_value::<Feature>(root)?],
            other => return Err(MapError::UnsupportedGeometry(other.unwrap_or("<missing>").to_owned())),
        };

        let regions = features
            .into_iter()
            .map(|feature| feature_to_region(feature, options))
            .collect();
        Ok(Self { regions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Bounding rect of every region in source units.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect> {
        self.regions
            .iter()
            .filter_map(BoundaryRegion::bounding_rect)
            .reduce(|a, b| a.union(&b))
    }
}

// =============================================================================
// GEOJSON WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<GeometryJson>,
}

type Position = Vec<f64>;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum GeometryJson {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    #[serde(other)]
    Unsupported,
}

fn feature_to_region(feature: Feature, options: &GeoJsonOptions) -> BoundaryRegion {
    let properties = feature.properties.unwrap_or_default();
    let raw_name = match properties.get(&options.name_property) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let name = options.name_map.get(&raw_name).cloned().unwrap_or(raw_name);

    let geometries = match feature.geometry {
        Some(GeometryJson::Polygon { coordinates }) => vec![Geometry::Polygon(rings_to_polygon(&coordinates))],
        Some(GeometryJson::MultiPolygon { coordinates }) => coordinates
            .iter()
            .map(|rings| Geometry::Polygon(rings_to_polygon(rings)))
            .collect(),
        Some(GeometryJson::LineString { coordinates }) => vec![Geometry::LineString(to_points(&coordinates))],
        Some(GeometryJson::MultiLineString { coordinates }) => coordinates
            .iter()
            .map(|line| Geometry::LineString(to_points(line)))
            .collect(),
        Some(GeometryJson::Unsupported) | None => Vec::new(),
    };

    let cp = properties
        .get("cp")
        .and_then(Value::as_array)
        .and_then(|arr| match arr.as_slice() {
            [x, y, ..] => Some(Point::new(x.as_f64()?, y.as_f64()?)),
            _ => None,
        });

    BoundaryRegion::new(name, geometries, cp)
}

fn to_points(positions: &[Position]) -> Vec<Point> {
    positions
        .iter()
        .filter_map(|pos| match pos.as_slice() {
            [x, y, ..] => Some(Point::new(*x, *y)),
            _ => None,
        })
        .collect()
}

fn rings_to_polygon(rings: &[Vec<Position>]) -> Polygon {
    let mut iter = rings.iter();
    let exterior = iter.next().map(|r| to_points(r)).unwrap_or_default();
    let interiors = iter.map(|r| to_points(r)).collect();
    Polygon { exterior, interiors }
}

// =============================================================================
// CENTERS
// =============================================================================

/// Signed shoelace area of a ring.
#[must_use]
pub fn ring_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Area centroid of a ring, falling back to its bounding-rect center when
/// the ring is degenerate.
#[must_use]
pub fn ring_centroid(ring: &[Point]) -> Option<Point> {
    let area = ring_area(ring);
    if area.abs() < f64::EPSILON {
        return Rect::from_points(ring).map(|r| r.center());
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    let k = 1.0 / (6.0 * area);
    Some(Point::new(cx * k, cy * k))
}

/// Centroid of the largest polygon, else the center of all line vertices.
fn compute_center(geometries: &[Geometry]) -> Point {
    let largest = geometries
        .iter()
        .filter_map(|g| match g {
            Geometry::Polygon(p) => Some(p),
            Geometry::LineString(_) => None,
        })
        .max_by(|a, b| ring_area(&a.exterior).abs().total_cmp(&ring_area(&b.exterior).abs()));

    if let Some(center) = largest.and_then(|p| ring_centroid(&p.exterior)) {
        return center;
    }

    Rect::from_points(geometries.iter().flat_map(|g| match g {
        Geometry::Polygon(p) => p.exterior.iter(),
        Geometry::LineString(l) => l.iter(),
    }))
    .map(|r| r.center())
    .unwrap_or_default()
}
