//! GISView measurement tools
//!
//! Geodesic distance and area computation, unit formatting and the
//! interactive measurement controller driven by the host map's draw
//! lifecycle.

pub mod controller;
pub mod format;
pub mod geodesic;

pub use controller::{
    DrawSurface, GeometryKind, MeasureKind, MeasureResult, Measurement, MeasurementController,
    MeasurementEvent, OverlayId, PointerEvent, Positioning, Sketch, Tooltip, TooltipStyle,
};
pub use format::{format_area, format_length, help_text};
pub use geodesic::{
    haversine_distance, path_length, points_from_geometry, points_from_json, ring_area,
};
pub use gisview_core::config::MeasurementOptions;
