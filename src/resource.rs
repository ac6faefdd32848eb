//! Map sources and the shared vector-document resource.
//!
//! DESIGN
//! ======
//! A vector map is parsed once and shared by every drawer that shows it.
//! Each drawer (a consumer, keyed by its `Uuid`) checks the document out
//! with [`SvgResource::acquire`] and receives its own graphic record built
//! from the single parse. The parse is dropped when the last consumer calls
//! [`SvgResource::release`] and rebuilt from the retained source on the next
//! acquire.
//!
//! Sharing is single-threaded: sources are handed out as
//! `Rc<RefCell<SvgResource>>` and mutated only through acquire and release.

#[cfg(test)]
#[path = "resource_test.rs"]
mod resource_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::MapError;
use crate::geo::{BoundaryRegionSet, GeoJsonOptions};
use crate::scene::{NodeId, Scene};
use crate::svg::SvgDocument;
use crate::transform::Rect;

/// Identity of a resource consumer.
pub type ConsumerId = Uuid;

/// A region entry of a consumer's graphic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedItem {
    pub name: String,
    /// Set when the name was inherited from an enclosing named group.
    pub named_from: Option<String>,
    /// Lower-case tag of the source element.
    pub tag: String,
    pub el: NodeId,
}

/// One consumer's instance of a shared vector document.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicRecord {
    pub root: NodeId,
    /// Every instantiated node, root first.
    pub nodes: Vec<NodeId>,
    pub named: Vec<NamedItem>,
    pub bounding_rect: Option<Rect>,
}

/// A vector document shared across consumers by reference count.
#[derive(Debug)]
pub struct SvgResource {
    map_id: String,
    source: String,
    parsed: Option<Rc<SvgDocument>>,
    used: HashMap<ConsumerId, GraphicRecord>,
}

impl SvgResource {
    /// Create a resource that parses lazily on first acquire.
    #[must_use]
    pub fn new(map_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self { map_id: map_id.into(), source: source.into(), parsed: None, used: HashMap::new() }
    }

    /// Create a resource and parse it now, so malformed sources are rejected
    /// at registration.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Svg`] when the source is not well-formed XML.
    pub fn parse(map_id: impl Into<String>, source: impl Into<String>) -> Result<Self, MapError> {
        let mut resource = Self::new(map_id, source);
        resource.parsed = Some(Rc::new(SvgDocument::parse(&resource.source)?));
        Ok(resource)
    }

    #[must_use]
    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    /// Number of consumers currently holding a record.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.used.len()
    }

    /// Whether the parsed document has been dropped.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.parsed.is_none()
    }

    #[must_use]
    pub fn record(&self, consumer: &ConsumerId) -> Option<&GraphicRecord> {
        self.used.get(consumer)
    }

    /// Check out a graphic record for `consumer`, instantiated under `parent`.
    ///
    /// A consumer that already holds a record gets the same record back and
    /// the count is unchanged. Returns `None` only when the retained source
    /// fails to re-parse.
    pub fn acquire(&mut self, consumer: ConsumerId, scene: &mut Scene, parent: NodeId) -> Option<GraphicRecord> {
        if let Some(record) = self.used.get(&consumer) {
            return Some(record.clone());
        }

        let doc = match &self.parsed {
            Some(doc) => Rc::clone(doc),
            None => match SvgDocument::parse(&self.source) {
                Ok(doc) => {
                    let doc = Rc::new(doc);
                    self.parsed = Some(Rc::clone(&doc));
                    doc
                }
                Err(error) => {
                    warn!(map_id = %self.map_id, %error, "svg re-parse failed");
                    return None;
                }
            },
        };

        let nodes = doc.instantiate(scene, parent);
        let named = doc
            .named
            .iter()
            .filter_map(|n| {
                Some(NamedItem {
                    name: n.name.clone(),
                    named_from: n.named_from.clone(),
                    tag: doc.node(n.node)?.tag.clone(),
                    el: *nodes.get(n.node)?,
                })
            })
            .collect();
        let record = GraphicRecord {
            root: nodes.first().copied().unwrap_or(parent),
            nodes,
            named,
            bounding_rect: doc.bounding_rect,
        };

        self.used.insert(consumer, record.clone());
        debug!(map_id = %self.map_id, %consumer, refs = self.used.len(), "svg resource acquired");
        Some(record)
    }

    /// Return `consumer`'s record: its graphics are detached from `scene`.
    /// The parse is dropped when no consumers remain. Unknown consumers are
    /// ignored.
    pub fn release(&mut self, consumer: &ConsumerId, scene: &mut Scene) {
        let Some(record) = self.used.remove(consumer) else {
            debug!(map_id = %self.map_id, %consumer, "release of unknown consumer ignored");
            return;
        };
        scene.remove(&record.root);
        debug!(map_id = %self.map_id, %consumer, refs = self.used.len(), "svg resource released");

        if self.used.is_empty() && self.parsed.take().is_some() {
            info!(map_id = %self.map_id, "svg document disposed");
        }
    }
}

// =============================================================================
// MAP SOURCES
// =============================================================================

/// Geometry behind a map identifier.
#[derive(Debug, Clone)]
pub enum MapSource {
    Boundary(Rc<BoundaryRegionSet>),
    Vector(Rc<RefCell<SvgResource>>),
}

/// Host services the drawer needs.
pub trait MapHost {
    /// Geometry registered under `map_id`, if any.
    fn resolve(&self, map_id: &str) -> Option<MapSource>;

    /// Screen rects of host chrome (toolbars, legends) that swallow pointer
    /// input before it reaches the map.
    fn chrome_rects(&self) -> Vec<Rect> {
        Vec::new()
    }
}

/// In-memory map registry.
#[derive(Debug, Default)]
pub struct GeoRegistry {
    maps: HashMap<String, MapSource>,
    chrome: Vec<Rect>,
}

impl GeoRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a GeoJSON boundary map.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::EmptyMapId`] for an empty identifier and any
    /// error from [`BoundaryRegionSet::from_geojson`].
    pub fn register_geojson(&mut self, map_id: &str, text: &str, options: &GeoJsonOptions) -> Result<(), MapError> {
        if map_id.is_empty() {
            return Err(MapError::EmptyMapId);
        }
        let set = BoundaryRegionSet::from_geojson(text, options)?;
        info!(map_id, regions = set.len(), "geojson map registered");
        self.maps.insert(map_id.to_owned(), MapSource::Boundary(Rc::new(set)));
        Ok(())
    }

    /// Register an already-built boundary map.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::EmptyMapId`] for an empty identifier.
    pub fn register_boundary(&mut self, map_id: &str, set: BoundaryRegionSet) -> Result<(), MapError> {
        if map_id.is_empty() {
            return Err(MapError::EmptyMapId);
        }
        self.maps.insert(map_id.to_owned(), MapSource::Boundary(Rc::new(set)));
        Ok(())
    }

    /// Register an SVG map. The source is parsed now to validate it.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::EmptyMapId`] for an empty identifier and
    /// [`MapError::Svg`] for malformed XML.
    pub fn register_svg(&mut self, map_id: &str, text: &str) -> Result<(), MapError> {
        if map_id.is_empty() {
            return Err(MapError::EmptyMapId);
        }
        let resource = SvgResource::parse(map_id, text)?;
        info!(map_id, "svg map registered");
        self.maps.insert(map_id.to_owned(), MapSource::Vector(Rc::new(RefCell::new(resource))));
        Ok(())
    }

    /// Drop a map. Consumers holding its source keep it alive.
    pub fn unregister(&mut self, map_id: &str) -> Option<MapSource> {
        self.maps.remove(map_id)
    }

    pub fn set_chrome_rects(&mut self, rects: Vec<Rect>) {
        self.chrome = rects;
    }
}

impl MapHost for GeoRegistry {
    fn resolve(&self, map_id: &str) -> Option<MapSource> {
        self.maps.get(map_id).cloned()
    }

    fn chrome_rects(&self) -> Vec<Rect> {
        self.chrome.clone()
    }
}
