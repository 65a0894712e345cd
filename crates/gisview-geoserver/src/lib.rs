//! GISView GeoServer access
//!
//! This crate talks to the GeoServer instances behind the viewer:
//! - WMS capabilities parsing (layer tree, bounds, metadata)
//! - GetFeatureInfo point queries across several layers
//! - the read-only REST catalog

pub mod capabilities;
pub mod client;
pub mod feature_info;
pub mod rest;

pub use capabilities::{
    layer_extent, parse_capabilities, GeographicBoundingBox, LayerMetadata, ServiceInfo,
    WmsCapabilities, WmsLayer,
};
pub use client::GeoServerClient;
pub use feature_info::{
    Feature, FeatureCollection, FeatureInfoRequest, FeatureTarget, LayerFeatureInfo,
};
pub use rest::{CatalogEntry, LayerDetails, RestCatalog};
