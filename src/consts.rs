//! Shared constants for the map drawing core.

// ── Vector document tags ────────────────────────────────────────

/// Tags whose nodes accept region item styling.
pub const OPTION_STYLE_ENABLED_TAGS: &[&str] = &["rect", "circle", "line", "ellipse", "polygon", "polyline", "path"];

/// Tags whose nodes can host a region label, event payload and hover state.
pub const REGION_AVAILABLE_TAGS: &[&str] =
    &["rect", "circle", "line", "ellipse", "polygon", "polyline", "path", "g"];

/// Whether a lower-case tag accepts region item styling.
#[must_use]
pub fn is_style_enabled_tag(tag: &str) -> bool {
    OPTION_STYLE_ENABLED_TAGS.contains(&tag)
}

/// Whether a lower-case tag can act as a region host.
#[must_use]
pub fn is_region_available_tag(tag: &str) -> bool {
    REGION_AVAILABLE_TAGS.contains(&tag)
}

// ── Roam ────────────────────────────────────────────────────────

/// Zoom multiplier applied per wheel event (inverse when zooming out).
pub const WHEEL_ZOOM_FACTOR: f64 = 1.1;

/// Default `animationDurationUpdate` in milliseconds.
pub const DEFAULT_UPDATE_DURATION_MS: u32 = 300;

// ── Scene ───────────────────────────────────────────────────────

/// Default z2 lift applied by the scene when a node enters emphasis.
pub const DEFAULT_Z2_EMPHASIS_LIFT: i32 = 10;

/// Compound paths skip sub-paths smaller than this many pixels.
pub const SEGMENT_IGNORE_THRESHOLD: f64 = 1.0;

/// Segments used to flatten circles and ellipses from vector documents.
pub const ELLIPSE_SEGMENTS: usize = 32;

/// Samples taken along each curve segment when flattening vector paths.
pub const CURVE_SAMPLES: usize = 8;

// ── Built-in option defaults ────────────────────────────────────

pub const DEFAULT_AREA_COLOR: &str = "#eee";
pub const DEFAULT_BORDER_COLOR: &str = "#444";
pub const DEFAULT_BORDER_WIDTH: f64 = 0.5;
pub const DEFAULT_LABEL_COLOR: &str = "#000";
pub const DEFAULT_EMPHASIS_AREA_COLOR: &str = "rgba(255,215,0,0.8)";
pub const DEFAULT_EMPHASIS_LABEL_COLOR: &str = "rgb(100,0,0)";
