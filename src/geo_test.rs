#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
    vec![Point::new(x, y), Point::new(x + size, y), Point::new(x + size, y + size), Point::new(x, y + size)]
}

fn load(value: &serde_json::Value) -> BoundaryRegionSet {
    BoundaryRegionSet::from_geojson(&value.to_string(), &GeoJsonOptions::default()).unwrap()
}

// =============================================================
// Areas and centers
// =============================================================

#[test]
fn ring_area_is_signed() {
    let ccw = square(0.0, 0.0, 2.0);
    let mut cw = ccw.clone();
    cw.reverse();
    assert_eq!(ring_area(&ccw), 4.0);
    assert_eq!(ring_area(&cw), -4.0);
}

#[test]
fn ring_centroid_of_square() {
    assert_eq!(ring_centroid(&square(2.0, 2.0, 4.0)), Some(Point::new(4.0, 4.0)));
}

#[test]
fn ring_centroid_of_degenerate_ring_uses_bbox() {
    let line = vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)];
    assert_eq!(ring_centroid(&line), Some(Point::new(2.0, 0.0)));
}

#[test]
fn region_center_uses_largest_polygon() {
    let small = Geometry::Polygon(Polygon { exterior: square(0.0, 0.0, 1.0), interiors: vec![] });
    let big = Geometry::Polygon(Polygon { exterior: square(10.0, 10.0, 10.0), interiors: vec![] });
    let region = BoundaryRegion::new("a", vec![small, big], None);
    assert_eq!(region.center, Point::new(15.0, 15.0));
}

#[test]
fn explicit_center_wins() {
    let poly = Geometry::Polygon(Polygon { exterior: square(0.0, 0.0, 1.0), interiors: vec![] });
    let region = BoundaryRegion::new("a", vec![poly], Some(Point::new(9.0, 9.0)));
    assert_eq!(region.center, Point::new(9.0, 9.0));
}

#[test]
fn line_only_region_centers_on_bbox() {
    let line = Geometry::LineString(vec![Point::new(0.0, 0.0), Point::new(10.0, 4.0)]);
    let region = BoundaryRegion::new("river", vec![line], None);
    assert_eq!(region.center, Point::new(5.0, 2.0));
}

// =============================================================
// GeoJSON
// =============================================================

#[test]
fn feature_collection_keeps_every_feature() {
    let set = load(&json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "name": "A" },
              "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1]]] } },
            { "type": "Feature", "properties": { "name": "A" },
              "geometry": { "type": "Polygon", "coordinates": [[[5,5],[6,5],[6,6],[5,6]]] } }
        ]
    }));
    assert_eq!(set.len(), 2);
    assert!(set.regions.iter().all(|r| r.name == "A"));
}

#[test]
fn polygon_with_hole_keeps_interior() {
    let set = load(&json!({
        "type": "Feature",
        "properties": { "name": "Ring" },
        "geometry": { "type": "Polygon", "coordinates": [
            [[0,0],[10,0],[10,10],[0,10]],
            [[4,4],[6,4],[6,6],[4,6]]
        ] }
    }));
    let Geometry::Polygon(poly) = &set.regions[0].geometries[0] else {
        panic!("expected polygon");
    };
    assert_eq!(poly.exterior.len(), 4);
    assert_eq!(poly.interiors.len(), 1);
}

#[test]
fn multipolygon_and_lines_decode() {
    let set = load(&json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "name": "Isles" },
              "geometry": { "type": "MultiPolygon", "coordinates": [
                  [[[0,0],[1,0],[1,1]]],
                  [[[3,3],[4,3],[4,4]]]
              ] } },
            { "type": "Feature", "properties": { "name": "Road" },
              "geometry": { "type": "MultiLineString", "coordinates": [[[0,0],[1,1]], [[2,2],[3,3,99]]] } }
        ]
    }));
    assert_eq!(set.regions[0].geometries.len(), 2);
    assert_eq!(set.regions[1].geometries.len(), 2);
    assert!(matches!(set.regions[1].geometries[1], Geometry::LineString(ref l) if l[1] == Point::new(3.0, 3.0)));
}

#[test]
fn unsupported_geometry_yields_empty_region() {
    let set = load(&json!({
        "type": "Feature",
        "properties": { "name": "Dot" },
        "geometry": { "type": "Point", "coordinates": [1, 2] }
    }));
    assert_eq!(set.regions[0].name, "Dot");
    assert!(set.regions[0].geometries.is_empty());
}

#[test]
fn cp_property_sets_center() {
    let set = load(&json!({
        "type": "Feature",
        "properties": { "name": "A", "cp": [0.25, 0.75] },
        "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1]]] }
    }));
    assert_eq!(set.regions[0].center, Point::new(0.25, 0.75));
}

#[test]
fn name_property_and_name_map_apply() {
    let options = GeoJsonOptions {
        name_property: "NAME_EN".into(),
        name_map: HashMap::from([("Texas".to_owned(), "TX".to_owned())]),
    };
    let text = json!({
        "type": "Feature",
        "properties": { "NAME_EN": "Texas" },
        "geometry": null
    })
    .to_string();
    let set = BoundaryRegionSet::from_geojson(&text, &options).unwrap();
    assert_eq!(set.regions[0].name, "TX");
}

#[test]
fn bare_geometry_root_is_rejected() {
    let text = json!({ "type": "Polygon", "coordinates": [] }).to_string();
    let err = BoundaryRegionSet::from_geojson(&text, &GeoJsonOptions::default()).unwrap_err();
    assert!(matches!(err, MapError::UnsupportedGeometry(ref t) if t == "Polygon"));
}

#[test]
fn malformed_json_is_rejected() {
    let err = BoundaryRegionSet::from_geojson("{ nope", &GeoJsonOptions::default()).unwrap_err();
    assert!(matches!(err, MapError::GeoJson(_)));
}

#[test]
fn set_bounding_rect_unions_regions() {
    let set = load(&json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "name": "A" },
              "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1]]] } },
            { "type": "Feature", "properties": { "name": "B" },
              "geometry": { "type": "Polygon", "coordinates": [[[5,5],[6,5],[6,6],[5,6]]] } }
        ]
    }));
    assert_eq!(set.bounding_rect(), Some(Rect::new(0.0, 0.0, 6.0, 6.0)));
}
