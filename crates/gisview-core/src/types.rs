//! Core types for the GISView map viewer.
//!
//! This module defines the coordinate and extent types shared by the
//! measurement toolbox and the map server client, the two projections the
//! viewer works in, and the records that make up the layer catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Equatorial radius of the WGS84 ellipsoid used by Web Mercator (meters).
pub const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Latitude beyond which Web Mercator is undefined; inputs are clamped to it.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Geographic position in degrees (EPSG:4326 axis order longitude, latitude).
///
/// # Examples
///
/// ```
/// use gisview_core::types::LonLat;
///
/// let point = LonLat::new(30.3158, 59.9391);
/// assert_eq!(point.lon, 30.3158);
/// assert!(point.is_finite());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl LonLat {
    /// Creates a new geographic position.
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns true if both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for LonLat {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lon, self.lat)
    }
}

/// Position in the map's projected coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapCoord {
    pub x: f64,
    pub y: f64,
}

impl MapCoord {
    /// Creates a new projected position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for MapCoord {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box `[min_x, min_y, max_x, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Creates a new extent.
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains(&self, point: MapCoord) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

/// Coordinate reference systems the viewer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Projection {
    /// Geographic longitude/latitude in degrees
    #[serde(rename = "EPSG:4326")]
    Wgs84,
    /// Spherical (Web) Mercator in meters
    #[default]
    #[serde(rename = "EPSG:3857")]
    WebMercator,
}

impl Projection {
    /// Returns the EPSG code string of this projection.
    pub fn code(&self) -> &'static str {
        match self {
            Projection::Wgs84 => "EPSG:4326",
            Projection::WebMercator => "EPSG:3857",
        }
    }

    /// Converts a map coordinate in this projection to longitude/latitude.
    pub fn unproject(&self, coord: MapCoord) -> LonLat {
        match self {
            Projection::Wgs84 => LonLat::new(coord.x, coord.y),
            Projection::WebMercator => {
                let lon = (coord.x / WEB_MERCATOR_RADIUS_M).to_degrees();
                let lat = (2.0 * (coord.y / WEB_MERCATOR_RADIUS_M).exp().atan()
                    - std::f64::consts::FRAC_PI_2)
                    .to_degrees();
                LonLat::new(lon, lat)
            }
        }
    }

    /// Converts longitude/latitude to a map coordinate in this projection.
    pub fn project(&self, point: LonLat) -> MapCoord {
        match self {
            Projection::Wgs84 => MapCoord::new(point.lon, point.lat),
            Projection::WebMercator => {
                let lat = point
                    .lat
                    .clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT)
                    .to_radians();
                let x = WEB_MERCATOR_RADIUS_M * point.lon.to_radians();
                let y = WEB_MERCATOR_RADIUS_M
                    * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
                MapCoord::new(x, y)
            }
        }
    }

    /// Transforms a coordinate from this projection into `target`.
    pub fn transform(&self, coord: MapCoord, target: Projection) -> MapCoord {
        if *self == target {
            return coord;
        }
        target.project(self.unproject(coord))
    }

    /// Transforms an extent from this projection into `target`.
    ///
    /// Both supported projections are axis-aligned and monotonic, so the
    /// transformed corners bound the transformed box.
    pub fn transform_extent(&self, extent: Extent, target: Projection) -> Extent {
        let min = self.transform(MapCoord::new(extent.min_x, extent.min_y), target);
        let max = self.transform(MapCoord::new(extent.max_x, extent.max_y), target);
        Extent::new(min.x, min.y, max.x, max.y)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Storage backend of a published layer.
///
/// Vector layers are served by the vector map server instance; raster and
/// ECW mosaics by the raster instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Vector,
    Raster,
    Ecw,
}

impl LayerKind {
    /// Returns true for layers published by the vector instance.
    pub fn is_vector(&self) -> bool {
        matches!(self, LayerKind::Vector)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Vector => write!(f, "vector"),
            LayerKind::Raster => write!(f, "raster"),
            LayerKind::Ecw => write!(f, "ecw"),
        }
    }
}

/// A layer published on the map server and listed in the viewer's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Catalog identifier
    pub id: u32,

    /// System name of the layer on the map server
    pub name: String,

    /// Display title
    pub title: String,

    /// Map server workspace containing the layer
    pub workspace: String,

    /// Storage backend
    #[serde(rename = "layer_type")]
    pub kind: LayerKind,

    /// Category ids this layer belongs to
    #[serde(default)]
    pub categories: Vec<u32>,

    /// Whether the layer is available for viewing
    #[serde(default = "default_true")]
    pub is_published: bool,

    /// Whether the layer answers feature-info queries
    #[serde(default = "default_true")]
    pub queryable: bool,
}

fn default_true() -> bool {
    true
}

impl Layer {
    /// Creates a published, queryable layer with no categories.
    pub fn new(
        id: u32,
        workspace: impl Into<String>,
        name: impl Into<String>,
        title: impl Into<String>,
        kind: LayerKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            title: title.into(),
            workspace: workspace.into(),
            kind,
            categories: Vec::new(),
            is_published: true,
            queryable: true,
        }
    }

    /// Adds this layer to a category.
    pub fn with_category(mut self, category: u32) -> Self {
        self.categories.push(category);
        self
    }

    /// Returns the `workspace:name` form used by the capabilities protocol.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.workspace, self.name)
    }
}

/// A group of layers shown together in the layer switcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A street-level panorama photographed at a point on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panorama {
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Where the panorama was taken; entries without a position cannot be
    /// placed on the map
    #[serde(default)]
    pub coordinates: Option<LonLat>,

    /// Image URL
    pub url: String,

    /// Projection of the image, e.g. `equirectangular`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Initial view direction in degrees
    #[serde(default)]
    pub heading: Option<f64>,
}

impl Panorama {
    /// Name shown on the marker.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Панорама")
    }
}
