//! Vector document parsing.
//!
//! An SVG source is parsed once into an [`SvgDocument`]: a flat arena of
//! drawable nodes (groups, flattened shapes, text, images) plus the list of
//! named nodes that act as map regions. Consumers then [`instantiate`] the
//! document into their own scene; the parse itself is never repeated.
//!
//! Naming rules:
//! - an element carrying a `name` attribute is a named region node when its
//!   tag is region-available;
//! - unnamed shape descendants of a named `g` are listed under the group's
//!   name with `named_from` set to that name.
//!
//! Element transforms are stored decomposed (translate, scale, rotation).
//! Skew on shapes is folded into their points; skew on groups, text and
//! images is dropped.
//!
//! [`instantiate`]: SvgDocument::instantiate

#[cfg(test)]
#[path = "svg_test.rs"]
mod svg_test;

use std::f64::consts::TAU;

use svgtypes::{PathParser, PathSegment};
use tracing::info;

use crate::consts::{CURVE_SAMPLES, ELLIPSE_SEGMENTS, SEGMENT_IGNORE_THRESHOLD, is_region_available_tag, is_style_enabled_tag};
use crate::error::MapError;
use crate::scene::{NodeId, NodeKind, Paint, PathShape, Scene, Style, SubPath};
use crate::transform::{Matrix, Point, Rect, Transform};

/// Index of a node inside an [`SvgDocument`].
pub type SvgIndex = usize;

/// One drawable element of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgNode {
    /// Lower-case tag name.
    pub tag: String,
    pub name: Option<String>,
    pub parent: Option<SvgIndex>,
    pub children: Vec<SvgIndex>,
    pub kind: NodeKind,
    /// Presentation style with inherited values folded in.
    pub style: Style,
    pub transform: Transform,
}

/// A region entry in the named list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgNamed {
    pub name: String,
    /// Name of the enclosing group this entry inherited its name from.
    pub named_from: Option<String>,
    pub node: SvgIndex,
}

/// A parsed vector document. Node 0 is the root group.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    pub nodes: Vec<SvgNode>,
    pub named: Vec<SvgNamed>,
    /// From `viewBox`, else `width`/`height`.
    pub bounding_rect: Option<Rect>,
}

impl SvgDocument {
    pub const ROOT: SvgIndex = 0;

    /// Parse an SVG source.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Svg`] when the source is not well-formed XML.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let xml = roxmltree::Document::parse(text)?;
        let root_el = xml.root_element();

        let mut doc = SvgDocument {
            nodes: vec![SvgNode {
                tag: "g".into(),
                name: None,
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Group,
                style: element_style(root_el, &Style::default()),
                transform: Transform::default(),
            }],
            named: Vec::new(),
            bounding_rect: root_rect(root_el),
        };

        for child in root_el.children().filter(roxmltree::Node::is_element) {
            doc.visit(child, Self::ROOT, None);
        }

        info!(nodes = doc.nodes.len(), named = doc.named.len(), "svg document parsed");
        Ok(doc)
    }

    fn visit(&mut self, el: roxmltree::Node<'_, '_>, parent: SvgIndex, named_from: Option<&str>) {
        let tag = el.tag_name().name().to_ascii_lowercase();
        let Some(mut kind) = element_kind(el, &tag) else {
            return;
        };
        let matrix = element_matrix(el, &tag);
        let transform = matrix.decompose();
        if let NodeKind::Path(shape) = &mut kind {
            bake_skew(shape, &matrix, &transform);
        }

        let inherited = self.nodes[parent].style.clone();
        let index = self.nodes.len();
        let name = el.attribute("name").map(str::to_owned);
        self.nodes.push(SvgNode {
            tag: tag.clone(),
            name: name.clone(),
            parent: Some(parent),
            children: Vec::new(),
            kind,
            style: element_style(el, &inherited),
            transform,
        });
        self.nodes[parent].children.push(index);

        match (&name, named_from) {
            (Some(n), _) if is_region_available_tag(&tag) => {
                self.named.push(SvgNamed { name: n.clone(), named_from: None, node: index });
            }
            (None, Some(from)) if is_style_enabled_tag(&tag) => {
                self.named.push(SvgNamed { name: from.to_owned(), named_from: Some(from.to_owned()), node: index });
            }
            _ => {}
        }

        if tag == "g" {
            let sub_from = match &name {
                Some(n) => Some(n.clone()),
                None => named_from.map(str::to_owned),
            };
            for child in el.children().filter(roxmltree::Node::is_element) {
                self.visit(child, index, sub_from.as_deref());
            }
        }
    }

    #[must_use]
    pub fn node(&self, index: SvgIndex) -> Option<&SvgNode> {
        self.nodes.get(index)
    }

    /// Build a fresh copy of the document under `parent`. The returned vec
    /// maps every document index to its scene node.
    pub fn instantiate(&self, scene: &mut Scene, parent: NodeId) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let scene_parent = node.parent.and_then(|p| ids.get(p).copied()).unwrap_or(parent);
            let id = scene.add(scene_parent, node.kind.clone());
            if let Some(n) = scene.get_mut(&id) {
                n.name.clone_from(&node.name);
                n.style = node.style.clone();
                n.transform = node.transform;
            }
            ids.push(id);
        }
        ids
    }
}

// =============================================================================
// ATTRIBUTES
// =============================================================================

fn attr_f64(el: roxmltree::Node<'_, '_>, name: &str) -> Option<f64> {
    match el.attribute(name)?.parse::<svgtypes::Length>() {
        Ok(length) => Some(length.number),
        Err(_) => None,
    }
}

fn num(el: roxmltree::Node<'_, '_>, name: &str) -> f64 {
    attr_f64(el, name).unwrap_or(0.0)
}

fn root_rect(el: roxmltree::Node<'_, '_>) -> Option<Rect> {
    if let Some(raw) = el.attribute("viewBox") {
        if let Ok(vb) = raw.parse::<svgtypes::ViewBox>() {
            return Some(Rect::new(vb.x, vb.y, vb.w, vb.h));
        }
    }
    match (attr_f64(el, "width"), attr_f64(el, "height")) {
        (Some(w), Some(h)) => Some(Rect::new(0.0, 0.0, w, h)),
        _ => None,
    }
}

/// Presentation attributes, inline `style` declarations winning, over the
/// parent's effective style.
fn element_style(el: roxmltree::Node<'_, '_>, inherited: &Style) -> Style {
    let mut style = Style {
        fill: inherited.fill.clone(),
        stroke: inherited.stroke.clone(),
        line_width: inherited.line_width,
        ..Style::default()
    };

    let mut apply = |key: &str, value: &str| {
        let value = value.trim();
        match key.trim() {
            "fill" => style.fill = Some(Paint::Color(value.to_owned())),
            "stroke" => style.stroke = Some(value.to_owned()),
            "stroke-width" => {
                if let Ok(w) = value.parse::<svgtypes::Length>() {
                    style.line_width = Some(w.number);
                }
            }
            "opacity" => {
                if let Ok(o) = value.parse::<f64>() {
                    style.opacity = Some(o);
                }
            }
            "font-size" => {
                if let Ok(s) = value.parse::<svgtypes::Length>() {
                    style.font_size = Some(s.number);
                }
            }
            _ => {}
        }
    };

    for attr in el.attributes() {
        apply(attr.name(), attr.value());
    }
    if let Some(inline) = el.attribute("style") {
        for decl in inline.split(';') {
            if let Some((k, v)) = decl.split_once(':') {
                apply(k, v);
            }
        }
    }
    style
}

fn element_matrix(el: roxmltree::Node<'_, '_>, tag: &str) -> Matrix {
    let mut m = match el.attribute("transform").map(str::parse::<svgtypes::Transform>) {
        Some(Ok(t)) => Matrix { a: t.a, b: t.b, c: t.c, d: t.d, e: t.e, f: t.f },
        _ => Matrix::IDENTITY,
    };
    if tag == "text" {
        let offset = Matrix { e: num(el, "x"), f: num(el, "y"), ..Matrix::IDENTITY };
        m = m.multiply(&offset);
    }
    m
}

/// Fold whatever `transform` cannot express (skew) into the shape's points,
/// so the node's transform applied to them reproduces `matrix` exactly.
fn bake_skew(shape: &mut PathShape, matrix: &Matrix, transform: &Transform) {
    let Some(inverse) = Matrix::from_transform(transform).invert() else {
        return;
    };
    let residual = inverse.multiply(matrix);
    if residual.c.abs() < 1e-9 && (residual.d - 1.0).abs() < 1e-9 {
        return;
    }
    for sub in &mut shape.subpaths {
        for p in &mut sub.points {
            *p = residual.apply(*p);
        }
    }
}

// =============================================================================
// SHAPES
// =============================================================================

fn element_kind(el: roxmltree::Node<'_, '_>, tag: &str) -> Option<NodeKind> {
    let subpaths = match tag {
        "g" => return Some(NodeKind::Group),
        "text" => {
            let text: String = el.descendants().filter(roxmltree::Node::is_text).filter_map(|n| n.text()).collect();
            return Some(NodeKind::Text { text: text.trim().to_owned() });
        }
        "image" => {
            let href = el
                .attribute(("http://www.w3.org/1999/xlink", "href"))
                .or_else(|| el.attribute("href"))
                .unwrap_or_default();
            let rect = Rect::new(num(el, "x"), num(el, "y"), num(el, "width"), num(el, "height"));
            return Some(NodeKind::Image { href: href.to_owned(), rect });
        }
        "rect" => {
            let (x, y, w, h) = (num(el, "x"), num(el, "y"), num(el, "width"), num(el, "height"));
            vec![SubPath {
                points: vec![Point::new(x, y), Point::new(x + w, y), Point::new(x + w, y + h), Point::new(x, y + h)],
                closed: true,
            }]
        }
        "circle" => {
            let r = num(el, "r");
            vec![ellipse(num(el, "cx"), num(el, "cy"), r, r)]
        }
        "ellipse" => vec![ellipse(num(el, "cx"), num(el, "cy"), num(el, "rx"), num(el, "ry"))],
        "line" => vec![SubPath {
            points: vec![Point::new(num(el, "x1"), num(el, "y1")), Point::new(num(el, "x2"), num(el, "y2"))],
            closed: false,
        }],
        "polygon" | "polyline" => vec![SubPath {
            points: parse_points(el.attribute("points").unwrap_or_default()),
            closed: tag == "polygon",
        }],
        "path" => flatten_path(el.attribute("d").unwrap_or_default()),
        _ => return None,
    };
    Some(NodeKind::Path(PathShape { subpaths, segment_ignore_threshold: SEGMENT_IGNORE_THRESHOLD }))
}

#[allow(clippy::cast_precision_loss)]
fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> SubPath {
    let points = (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            let angle = TAU * i as f64 / ELLIPSE_SEGMENTS as f64;
            Point::new(cx + rx * angle.cos(), cy + ry * angle.sin())
        })
        .collect();
    SubPath { points, closed: true }
}

/// Parse a `points` attribute: numbers separated by whitespace or commas,
/// taken in pairs. A trailing odd number is dropped.
pub(crate) fn parse_points(raw: &str) -> Vec<Point> {
    let numbers: Vec<f64> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .flat_map(str::parse::<f64>)
        .collect();
    numbers.chunks_exact(2).map(|pair| Point::new(pair[0], pair[1])).collect()
}

/// Flatten path data into polylines. Curves are sampled; arcs are replaced
/// by their chord.
pub(crate) fn flatten_path(d: &str) -> Vec<SubPath> {
    let mut out = Vec::new();
    let mut current = SubPath::default();
    let mut pos = Point::default();
    let mut start = pos;
    let mut last_cubic: Option<Point> = None;
    let mut last_quad: Option<Point> = None;

    let resolve = |abs: bool, pos: Point, x: f64, y: f64| if abs { Point::new(x, y) } else { Point::new(pos.x + x, pos.y + y) };

    for segment in PathParser::from(d) {
        let Ok(segment) = segment else {
            break;
        };
        if !matches!(segment, PathSegment::MoveTo { .. }) && current.points.is_empty() {
            current.points.push(pos);
        }
        let (mut cubic, mut quad) = (None, None);

        match segment {
            PathSegment::MoveTo { abs, x, y } => {
                flush(&mut out, &mut current);
                pos = resolve(abs, pos, x, y);
                start = pos;
                current.points.push(pos);
            }
            PathSegment::LineTo { abs, x, y } => {
                pos = resolve(abs, pos, x, y);
                current.points.push(pos);
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                pos = Point::new(if abs { x } else { pos.x + x }, pos.y);
                current.points.push(pos);
            }
            PathSegment::VerticalLineTo { abs, y } => {
                pos = Point::new(pos.x, if abs { y } else { pos.y + y });
                current.points.push(pos);
            }
            PathSegment::CurveTo { abs, x1, y1, x2, y2, x, y } => {
                let c1 = resolve(abs, pos, x1, y1);
                let c2 = resolve(abs, pos, x2, y2);
                let end = resolve(abs, pos, x, y);
                sample_cubic(&mut current.points, pos, c1, c2, end);
                cubic = Some(c2);
                pos = end;
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                let c1 = last_cubic.map_or(pos, |c| reflect(c, pos));
                let c2 = resolve(abs, pos, x2, y2);
                let end = resolve(abs, pos, x, y);
                sample_cubic(&mut current.points, pos, c1, c2, end);
                cubic = Some(c2);
                pos = end;
            }
            PathSegment::Quadratic { abs, x1, y1, x, y } => {
                let c = resolve(abs, pos, x1, y1);
                let end = resolve(abs, pos, x, y);
                sample_quad(&mut current.points, pos, c, end);
                quad = Some(c);
                pos = end;
            }
            PathSegment::SmoothQuadratic { abs, x, y } => {
                let c = last_quad.map_or(pos, |q| reflect(q, pos));
                let end = resolve(abs, pos, x, y);
                sample_quad(&mut current.points, pos, c, end);
                quad = Some(c);
                pos = end;
            }
            PathSegment::EllipticalArc { abs, x, y, .. } => {
                pos = resolve(abs, pos, x, y);
                current.points.push(pos);
            }
            PathSegment::ClosePath { .. } => {
                current.closed = true;
                flush(&mut out, &mut current);
                pos = start;
            }
        }
        last_cubic = cubic;
        last_quad = quad;
    }
    flush(&mut out, &mut current);
    out
}

fn flush(out: &mut Vec<SubPath>, current: &mut SubPath) {
    let done = std::mem::take(current);
    if done.points.len() >= 2 {
        out.push(done);
    }
}

fn reflect(control: Point, about: Point) -> Point {
    Point::new(2.0 * about.x - control.x, 2.0 * about.y - control.y)
}

#[allow(clippy::cast_precision_loss)]
fn sample_cubic(points: &mut Vec<Point>, p0: Point, p1: Point, p2: Point, p3: Point) {
    for i in 1..=CURVE_SAMPLES {
        let t = i as f64 / CURVE_SAMPLES as f64;
        let mt = 1.0 - t;
        let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
        points.push(Point::new(
            a * p0.x + b * p1.x + c * p2.x + d * p3.x,
            a * p0.y + b * p1.y + c * p2.y + d * p3.y,
        ));
    }
}

#[allow(clippy::cast_precision_loss)]
fn sample_quad(points: &mut Vec<Point>, p0: Point, p1: Point, p2: Point) {
    for i in 1..=CURVE_SAMPLES {
        let t = i as f64 / CURVE_SAMPLES as f64;
        let mt = 1.0 - t;
        let (a, b, c) = (mt * mt, 2.0 * mt * t, t * t);
        points.push(Point::new(a * p0.x + b * p1.x + c * p2.x, a * p0.y + b * p1.y + c * p2.y));
    }
}
