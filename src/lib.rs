//! GISView
//!
//! Web map viewer core: layer switching, point identification and metadata
//! lookups against GeoServer, panorama markers, and the distance/area
//! measuring tools.
//!
//! The map itself is rendered by a host library; it is attached through
//! [`DrawSurface`] and reports drawing progress back to the
//! [`MeasurementController`] owned by the [`Viewer`].

pub mod layers;
pub mod notice;
pub mod panorama;
pub mod viewer;

pub use layers::{LayerRegistry, LayerStatus};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use panorama::{PanoramaMarker, PanoramaRegistry};
pub use viewer::Viewer;

pub use gisview_core::{
    AreaUnit, Category, DistanceUnit, Extent, GisError, Language, Layer, LayerKind, LonLat,
    MapCoord, Panorama, Projection, Result, ViewerConfig,
};
pub use gisview_geoserver::{GeoServerClient, LayerFeatureInfo, LayerMetadata};
pub use gisview_measure::{
    DrawSurface, GeometryKind, MeasureKind, Measurement, MeasurementController,
    MeasurementEvent, MeasurementOptions, OverlayId, PointerEvent, Tooltip,
};
