//! Region map drawing core.
//!
//! Renders named geographic or vector regions into a scene graph and keeps
//! that scene in sync with an optional per-region data binding, roam
//! (pan/zoom) gestures, and multi-state styling (normal, emphasis, select,
//! blur). Geometry comes either from a boundary region set (GeoJSON) or from
//! a vector-graphic document (SVG) that is parsed once and shared between
//! consumers by reference count.
//!
//! The host owns the frame loop: it calls [`draw::MapDraw::draw`] whenever the
//! model changes, forwards pointer input to [`draw::MapDraw::handle_input`],
//! and processes the returned [`draw::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`draw`] | Top-level `MapDraw`: draw, remove, dispatcher lookup, input |
//! | [`scene`] | Arena scene graph the regions are built into |
//! | [`transform`] | Points, rects, affine transforms |
//! | [`geo`] | Boundary region sets and the GeoJSON loader |
//! | [`svg`] | Vector document parser and named-node index |
//! | [`resource`] | Shared, ref-counted vector resource and the map registry |
//! | [`data`] | Data binding trait and a plain series table |
//! | [`options`] | Component/region options and their merge rules |
//! | [`style`] | Per-state region style resolution |
//! | [`label`] | Label placement and upright/counter-scale bookkeeping |
//! | [`event`] | Event payload, tooltip and hover-state binding |
//! | [`input`] | Pointer input types and gesture state machines |
//! | [`roam`] | Roam controller and view update helpers |
//! | [`hit`] | Hit-testing pointer positions against region graphics |
//! | [`consts`] | Shared constants (tag sets, zoom factors, defaults) |
//! | [`error`] | Registry-boundary error type |

pub mod consts;
pub mod data;
pub mod draw;
pub mod error;
pub mod event;
pub mod geo;
pub mod hit;
pub mod input;
pub mod label;
pub mod options;
pub mod resource;
pub mod roam;
pub mod scene;
pub mod style;
pub mod svg;
pub mod transform;

pub use draw::{Action, MapDraw, MapModel, UpdatePayload};
pub use error::MapError;
pub use resource::{GeoRegistry, MapHost, MapSource};
