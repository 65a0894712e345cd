//! # GISView Core
//!
//! Core types, error handling, and configuration for the GISView map viewer.
//!
//! This crate provides the foundational building blocks shared by the
//! measurement toolbox and the map server client:
//!
//! - **Types**: Geographic (`LonLat`) and projected (`MapCoord`) coordinates,
//!   extents, the `Projection` transforms, and the layer catalog records.
//! - **Units**: Distance and area units with their conversion factors and
//!   localized labels.
//! - **Errors**: Error types using `thiserror` for network, parse, and
//!   configuration failures.
//! - **Configuration**: YAML files with environment variable overrides and
//!   validation.
//! - **Logging**: `tracing` subscriber bootstrap driven by configuration.
//!
//! ## Example
//!
//! ```
//! use gisview_core::types::{LonLat, Projection};
//!
//! let moscow = LonLat::new(37.6173, 55.7558);
//! let projected = Projection::WebMercator.project(moscow);
//! let back = Projection::WebMercator.unproject(projected);
//!
//! assert!((back.lon - moscow.lon).abs() < 1e-9);
//! assert!((back.lat - moscow.lat).abs() < 1e-9);
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod types;
pub mod units;

// Re-export commonly used types for convenience
pub use config::ViewerConfig;
pub use error::{GisError, Result};
pub use types::{Category, Extent, Layer, LayerKind, LonLat, MapCoord, Panorama, Projection};
pub use units::{AreaUnit, DistanceUnit, Language};
