//! WMS GetFeatureInfo requests and their GeoJSON responses.

use geojson::feature::Id;
use geojson::{GeoJson, Geometry, JsonObject};
use gisview_core::error::{NetworkError, ParseError, Result};
use gisview_core::types::{Extent, MapCoord, Projection};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Width and height of the virtual map image a point query is made against.
pub const FEATURE_INFO_IMAGE_SIZE: u32 = 101;

/// Format requested for feature query responses.
pub const INFO_FORMAT: &str = "application/json";

/// A point query against one or more layers of a WMS endpoint.
///
/// The query pretends the map is a 101x101 pixel image centred on the
/// clicked coordinate at the current view resolution, and asks for the
/// features under its centre pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInfoRequest {
    /// WMS endpoint, e.g. `http://host/geoserver/vector/wms`
    pub endpoint: String,
    /// Qualified layer names to query
    pub layers: Vec<String>,
    /// Clicked position in Web Mercator
    pub coordinate: MapCoord,
    /// Map units per pixel of the current view
    pub resolution: f64,
    pub feature_count: u32,
    pub version: String,
}

impl FeatureInfoRequest {
    pub fn new(
        endpoint: impl Into<String>,
        layers: Vec<String>,
        coordinate: MapCoord,
        resolution: f64,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            layers,
            coordinate,
            resolution,
            feature_count: 10,
            version: "1.3.0".to_string(),
        }
    }

    pub fn with_feature_count(mut self, feature_count: u32) -> Self {
        self.feature_count = feature_count;
        self
    }

    /// Extent of the virtual image, centred on the coordinate.
    pub fn bbox(&self) -> Extent {
        let half = self.resolution * f64::from(FEATURE_INFO_IMAGE_SIZE) / 2.0;
        Extent::new(
            self.coordinate.x - half,
            self.coordinate.y - half,
            self.coordinate.x + half,
            self.coordinate.y + half,
        )
    }

    /// Pixel column and row of the coordinate inside the virtual image.
    pub fn pixel(&self) -> (u32, u32) {
        let center = FEATURE_INFO_IMAGE_SIZE / 2;
        (center, center)
    }

    /// Query parameters, in request order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let bbox = self.bbox();
        let (i, j) = self.pixel();
        let layers = self.layers.join(",");

        vec![
            ("SERVICE", "WMS".to_string()),
            ("VERSION", self.version.clone()),
            ("REQUEST", "GetFeatureInfo".to_string()),
            ("FORMAT", "image/png".to_string()),
            ("TRANSPARENT", "true".to_string()),
            ("QUERY_LAYERS", layers.clone()),
            ("LAYERS", layers),
            ("STYLES", String::new()),
            ("INFO_FORMAT", INFO_FORMAT.to_string()),
            ("FEATURE_COUNT", self.feature_count.to_string()),
            ("I", i.to_string()),
            ("J", j.to_string()),
            ("WIDTH", FEATURE_INFO_IMAGE_SIZE.to_string()),
            ("HEIGHT", FEATURE_INFO_IMAGE_SIZE.to_string()),
            ("CRS", Projection::WebMercator.code().to_string()),
            (
                "BBOX",
                format!(
                    "{},{},{},{}",
                    bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
                ),
            ),
        ]
    }

    /// Full request URL with encoded parameters.
    pub fn url(&self) -> Result<Url> {
        Url::parse_with_params(&self.endpoint, self.params()).map_err(|e| {
            NetworkError::InvalidUrl {
                url: self.endpoint.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Features returned by a feature query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Parses a GeoJSON response body.
    ///
    /// A single feature is accepted as a collection of one; a bare geometry
    /// is rejected.
    pub fn from_geojson(body: &str) -> Result<Self> {
        match body.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => Ok(collection.into()),
            GeoJson::Feature(feature) => Ok(Self {
                features: vec![feature.into()],
            }),
            GeoJson::Geometry(_) => Err(ParseError::invalid_value(
                "type",
                "expected a FeatureCollection, got a Geometry",
            )
            .into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl From<geojson::FeatureCollection> for FeatureCollection {
    fn from(collection: geojson::FeatureCollection) -> Self {
        Self {
            features: collection.features.into_iter().map(Feature::from).collect(),
        }
    }
}

/// One feature; only its attributes matter to the viewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature id; numeric ids are kept in their decimal form
    pub id: Option<String>,
    pub properties: Option<JsonObject>,
    pub geometry: Option<Geometry>,
}

impl From<geojson::Feature> for Feature {
    fn from(feature: geojson::Feature) -> Self {
        let id = feature.id.map(|id| match id {
            Id::String(s) => s,
            Id::Number(n) => n.to_string(),
        });

        Self {
            id,
            properties: feature.properties,
            geometry: feature.geometry,
        }
    }
}

impl Feature {
    /// Attributes as display pairs; strings are shown without quotes.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.properties
            .iter()
            .flatten()
            .map(|(key, value)| {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key.clone(), shown)
            })
            .collect()
    }
}

/// A layer that may be queried at a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTarget {
    /// Map server instance publishing the layer
    pub instance: String,
    /// Qualified layer name
    pub layer: String,
    /// Display title
    pub title: String,
}

/// Features found under a point on one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerFeatureInfo {
    pub layer: String,
    pub title: String,
    pub features: Vec<Feature>,
}
