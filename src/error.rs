//! Errors raised at the registry boundary.
//!
//! Nothing in here escapes `MapDraw::draw`: a map that failed to register is
//! simply absent from the registry, and the draw path treats that as an
//! unavailable resource.

/// Error returned when registering a geometry source.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The map identifier was empty.
    #[error("map identifier must not be empty")]
    EmptyMapId,
    /// The GeoJSON text could not be decoded.
    #[error("failed to decode GeoJSON: {0}")]
    GeoJson(#[from] serde_json::Error),
    /// The SVG text is not well-formed XML.
    #[error("failed to parse SVG document: {0}")]
    Svg(#[from] roxmltree::Error),
    /// The GeoJSON root is neither a `FeatureCollection` nor a `Feature`.
    #[error("unsupported GeoJSON root type: {0}")]
    UnsupportedGeometry(String),
}
