//! WMS GetCapabilities document parsing.
//!
//! Only the parts the viewer needs are kept: service identification and the
//! layer tree with names, titles, abstracts, keywords, supported CRS and the
//! geographic bounding box. Both the WMS 1.3.0 `EX_GeographicBoundingBox`
//! element and the WMS 1.1.1 `LatLonBoundingBox` attributes are understood.
//!
//! Child layers inherit the bounding box, CRS list and queryable flag of
//! their parent when they do not declare their own.

use gisview_core::error::{ParseError, Result};
use gisview_core::types::{Extent, Projection};
use gisview_core::units::Language;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Parsed capabilities document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WmsCapabilities {
    pub version: String,
    pub service: ServiceInfo,
    pub root_layer: Option<WmsLayer>,
}

/// `<Service>` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub title: String,
    pub abstract_text: Option<String>,
}

/// One `<Layer>` element and its nested layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WmsLayer {
    /// Qualified name (`workspace:layer`); absent for pure grouping layers
    pub name: Option<String>,
    pub title: String,
    pub abstract_text: Option<String>,
    pub keywords: Vec<String>,
    pub crs: Vec<String>,
    pub geographic_bbox: Option<GeographicBoundingBox>,
    pub queryable: bool,
    pub layers: Vec<WmsLayer>,
}

/// Layer bounds in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographicBoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeographicBoundingBox {
    /// Returns the box as a WGS84 extent.
    pub fn to_extent(&self) -> Extent {
        Extent::new(self.west, self.south, self.east, self.north)
    }
}

impl WmsCapabilities {
    /// Top-level layers: the children of the root layer.
    pub fn layers(&self) -> &[WmsLayer] {
        self.root_layer
            .as_ref()
            .map(|root| root.layers.as_slice())
            .unwrap_or_default()
    }

    /// Finds the layer named `workspace:name` anywhere in the tree.
    pub fn find_layer(&self, workspace: &str, name: &str) -> Option<&WmsLayer> {
        let qualified = format!("{workspace}:{name}");
        self.root_layer.as_ref()?.find(&qualified)
    }
}

impl WmsLayer {
    /// Depth-first search for a layer by its full name, starting with `self`.
    pub fn find(&self, name: &str) -> Option<&WmsLayer> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.layers.iter().find_map(|child| child.find(name))
    }
}

/// Extent of a published layer in Web Mercator, for zooming the map to it.
///
/// Returns `None` (and logs a warning) when the layer is unknown or has no
/// geographic bounds.
pub fn layer_extent(caps: &WmsCapabilities, workspace: &str, name: &str) -> Option<Extent> {
    if caps.layers().is_empty() {
        warn!("No layers found in GetCapabilities response");
        return None;
    }

    match caps
        .find_layer(workspace, name)
        .and_then(|layer| layer.geographic_bbox)
    {
        Some(bbox) => {
            Some(Projection::Wgs84.transform_extent(bbox.to_extent(), Projection::WebMercator))
        }
        None => {
            warn!(
                workspace = %workspace,
                layer = %name,
                "Layer not found or has no geographic bounds"
            );
            None
        }
    }
}

/// Descriptive metadata of one layer, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadata {
    pub title: String,
    pub abstract_text: Option<String>,
    pub keywords: Vec<String>,
    pub bbox: Option<GeographicBoundingBox>,
}

impl LayerMetadata {
    pub fn from_layer(layer: &WmsLayer) -> Self {
        let title = if layer.title.is_empty() {
            layer.name.clone().unwrap_or_default()
        } else {
            layer.title.clone()
        };

        Self {
            title,
            abstract_text: layer.abstract_text.clone(),
            keywords: layer.keywords.clone(),
            bbox: layer.geographic_bbox,
        }
    }

    /// Renders a plain-text summary with labels in `language`.
    pub fn render(&self, language: Language) -> String {
        let labels = match language {
            Language::Ru => ["Ключевые слова", "Координаты", "Запад", "Юг", "Восток", "Север"],
            Language::En => ["Keywords", "Coordinates", "West", "South", "East", "North"],
        };

        let mut out = self.title.clone();
        if let Some(text) = &self.abstract_text {
            out.push('\n');
            out.push_str(text);
        }
        if !self.keywords.is_empty() {
            out.push_str(&format!("\n{}: {}", labels[0], self.keywords.join(", ")));
        }
        if let Some(bbox) = &self.bbox {
            out.push_str(&format!(
                "\n{}:\n{}: {:.6}\n{}: {:.6}\n{}: {:.6}\n{}: {:.6}",
                labels[1],
                labels[2],
                bbox.west,
                labels[3],
                bbox.south,
                labels[4],
                bbox.east,
                labels[5],
                bbox.north
            ));
        }
        out
    }
}

impl fmt::Display for LayerMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Language::default()))
    }
}

/// Parses a GetCapabilities response.
///
/// A `ServiceExceptionReport` in place of the capabilities document is
/// reported as an invalid value carrying the server's message.
pub fn parse_capabilities(xml: &str) -> Result<WmsCapabilities> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder = CapabilitiesBuilder::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                let name = local_name(&e);
                builder.open(&name, &e, position)?;
                path.push(name);
                text.clear();
            }
            Ok(XmlEvent::Empty(e)) => {
                let name = local_name(&e);
                builder.open(&name, &e, position)?;
                builder.close(&name, &path, "", position)?;
            }
            Ok(XmlEvent::Text(t)) => {
                let value = t
                    .unescape()
                    .map_err(|e| ParseError::xml(position, e.to_string()))?;
                text.push_str(&value);
            }
            Ok(XmlEvent::CData(t)) => {
                text.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(XmlEvent::End(_)) => {
                let Some(name) = path.pop() else {
                    return Err(ParseError::xml(position, "unexpected closing tag").into());
                };
                builder.close(&name, &path, text.trim(), position)?;
                text.clear();
            }
            Ok(XmlEvent::Eof) => {
                if !path.is_empty() {
                    return Err(ParseError::xml(position, "unexpected end of document").into());
                }
                break;
            }
            Ok(_) => {}
            Err(e) => return Err(ParseError::xml(position, e.to_string()).into()),
        }
    }

    builder.finish()
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key.as_bytes())
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true")
}

struct PendingLayer {
    layer: WmsLayer,
    queryable: Option<bool>,
}

#[derive(Default)]
enum Root {
    #[default]
    Unknown,
    Capabilities,
    ExceptionReport,
}

#[derive(Default)]
struct CapabilitiesBuilder {
    root: Root,
    caps: WmsCapabilities,
    layers: Vec<PendingLayer>,
    bbox: [Option<f64>; 4],
    exceptions: Vec<String>,
}

impl CapabilitiesBuilder {
    fn open(&mut self, name: &str, e: &BytesStart<'_>, position: u64) -> Result<()> {
        match name {
            "WMS_Capabilities" | "WMT_MS_Capabilities" => {
                self.root = Root::Capabilities;
                self.caps.version = attribute(e, "version").unwrap_or_default();
            }
            "ServiceExceptionReport" => self.root = Root::ExceptionReport,
            "Layer" => {
                let parent = self.layers.last();
                let layer = WmsLayer {
                    crs: parent.map(|p| p.layer.crs.clone()).unwrap_or_default(),
                    geographic_bbox: parent.and_then(|p| p.layer.geographic_bbox),
                    ..Default::default()
                };
                let queryable = attribute(e, "queryable")
                    .map(|v| parse_flag(&v))
                    .or_else(|| parent.and_then(|p| p.queryable));
                self.layers.push(PendingLayer { layer, queryable });
            }
            "EX_GeographicBoundingBox" => self.bbox = [None; 4],
            "LatLonBoundingBox" => {
                let mut corners = [0.0; 4];
                for (slot, key) in corners.iter_mut().zip(["minx", "miny", "maxx", "maxy"]) {
                    let raw = attribute(e, key).ok_or_else(|| {
                        ParseError::xml(position, format!("LatLonBoundingBox without {key}"))
                    })?;
                    *slot = parse_coordinate(key, &raw)?;
                }
                if let Some(top) = self.layers.last_mut() {
                    top.layer.geographic_bbox = Some(GeographicBoundingBox {
                        west: corners[0],
                        south: corners[1],
                        east: corners[2],
                        north: corners[3],
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// `path` holds the ancestors of the element being closed.
    fn close(&mut self, name: &str, path: &[String], text: &str, position: u64) -> Result<()> {
        let parent = path.last().map(String::as_str).unwrap_or_default();
        let grandparent = path
            .len()
            .checked_sub(2)
            .and_then(|i| path.get(i))
            .map(String::as_str)
            .unwrap_or_default();

        match (parent, name) {
            ("Service", "Name") => self.caps.service.name = text.to_string(),
            ("Service", "Title") => self.caps.service.title = text.to_string(),
            ("Service", "Abstract") => self.caps.service.abstract_text = non_empty(text),
            ("Layer", "Name") => self.with_top(|l| l.name = non_empty(text)),
            ("Layer", "Title") => self.with_top(|l| l.title = text.to_string()),
            ("Layer", "Abstract") => self.with_top(|l| l.abstract_text = non_empty(text)),
            ("Layer", "CRS" | "SRS") => self.with_top(|l| {
                if !text.is_empty() && !l.crs.iter().any(|c| c == text) {
                    l.crs.push(text.to_string());
                }
            }),
            ("KeywordList", "Keyword") if grandparent == "Layer" => {
                if !text.is_empty() {
                    self.with_top(|l| l.keywords.push(text.to_string()));
                }
            }
            ("EX_GeographicBoundingBox", side) => {
                let slot = match side {
                    "westBoundLongitude" => 0,
                    "southBoundLatitude" => 1,
                    "eastBoundLongitude" => 2,
                    "northBoundLatitude" => 3,
                    _ => return Ok(()),
                };
                self.bbox[slot] = Some(parse_coordinate(side, text)?);
            }
            ("ServiceExceptionReport", "ServiceException") => {
                self.exceptions.push(text.to_string());
            }
            (_, "EX_GeographicBoundingBox") => {
                if let [Some(west), Some(south), Some(east), Some(north)] = self.bbox {
                    self.with_top(|l| {
                        l.geographic_bbox = Some(GeographicBoundingBox {
                            west,
                            south,
                            east,
                            north,
                        })
                    });
                } else {
                    debug!(position, "Incomplete EX_GeographicBoundingBox ignored");
                }
            }
            (_, "Layer") => self.close_layer(),
            _ => {}
        }
        Ok(())
    }

    fn with_top(&mut self, f: impl FnOnce(&mut WmsLayer)) {
        if let Some(top) = self.layers.last_mut() {
            f(&mut top.layer);
        }
    }

    fn close_layer(&mut self) {
        let Some(PendingLayer {
            mut layer,
            queryable,
        }) = self.layers.pop()
        else {
            return;
        };
        layer.queryable = queryable.unwrap_or(false);

        match self.layers.last_mut() {
            Some(parent) => parent.layer.layers.push(layer),
            None => self.caps.root_layer = Some(layer),
        }
    }

    fn finish(self) -> Result<WmsCapabilities> {
        match self.root {
            Root::Capabilities => Ok(self.caps),
            Root::ExceptionReport => Err(ParseError::invalid_value(
                "ServiceExceptionReport",
                self.exceptions.join("; "),
            )
            .into()),
            Root::Unknown => Err(ParseError::missing_field("WMS_Capabilities").into()),
        }
    }
}

fn parse_coordinate(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| ParseError::invalid_value(field, format!("'{raw}': {e}")).into())
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gisview_core::error::GisError;

    const CAPABILITIES_130: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms">
  <Service>
    <Name>WMS</Name>
    <Title>City GeoServer</Title>
    <Abstract>Orthophoto &amp; base maps</Abstract>
  </Service>
  <Capability>
    <Layer>
      <Title>City GeoServer</Title>
      <CRS>EPSG:4326</CRS>
      <CRS>EPSG:3857</CRS>
      <EX_GeographicBoundingBox>
        <westBoundLongitude>-180.0</westBoundLongitude>
        <eastBoundLongitude>180.0</eastBoundLongitude>
        <southBoundLatitude>-90.0</southBoundLatitude>
        <northBoundLatitude>90.0</northBoundLatitude>
      </EX_GeographicBoundingBox>
      <Layer queryable="1">
        <Name>ecw:city_orthophoto</Name>
        <Title>City orthophoto</Title>
        <Abstract>Orthophoto mosaic, 2023</Abstract>
        <KeywordList>
          <Keyword>orthophoto</Keyword>
          <Keyword>ECW</Keyword>
        </KeywordList>
        <EX_GeographicBoundingBox>
          <westBoundLongitude>37.3</westBoundLongitude>
          <eastBoundLongitude>37.9</eastBoundLongitude>
          <southBoundLatitude>55.5</southBoundLatitude>
          <northBoundLatitude>55.95</northBoundLatitude>
        </EX_GeographicBoundingBox>
      </Layer>
      <Layer queryable="0">
        <Title>Basemaps</Title>
        <Layer>
          <Name>ecw:relief</Name>
          <Title>Relief</Title>
        </Layer>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

    #[test]
    fn test_parse_service_and_version() {
        let caps = parse_capabilities(CAPABILITIES_130).unwrap();
        assert_eq!(caps.version, "1.3.0");
        assert_eq!(caps.service.name, "WMS");
        assert_eq!(caps.service.title, "City GeoServer");
        assert_eq!(
            caps.service.abstract_text.as_deref(),
            Some("Orthophoto & base maps")
        );
    }

    #[test]
    fn test_parse_layer_tree() {
        let caps = parse_capabilities(CAPABILITIES_130).unwrap();
        let root = caps.root_layer.as_ref().unwrap();
        assert!(root.name.is_none());
        assert_eq!(caps.layers().len(), 2);

        let ortho = &caps.layers()[0];
        assert_eq!(ortho.name.as_deref(), Some("ecw:city_orthophoto"));
        assert_eq!(ortho.keywords, vec!["orthophoto", "ECW"]);
        assert!(ortho.queryable);
        assert_eq!(ortho.crs, vec!["EPSG:4326", "EPSG:3857"]);
        assert_eq!(
            ortho.geographic_bbox,
            Some(GeographicBoundingBox {
                west: 37.3,
                south: 55.5,
                east: 37.9,
                north: 55.95
            })
        );
    }

    #[test]
    fn test_nested_layer_inherits_from_parent() {
        let caps = parse_capabilities(CAPABILITIES_130).unwrap();
        let relief = caps.find_layer("ecw", "relief").unwrap();
        assert_eq!(relief.title, "Relief");
        assert!(!relief.queryable);
        assert_eq!(relief.geographic_bbox.unwrap().west, -180.0);
    }

    #[test]
    fn test_find_layer_missing() {
        let caps = parse_capabilities(CAPABILITIES_130).unwrap();
        assert!(caps.find_layer("ecw", "nope").is_none());
        assert!(caps.find_layer("vector", "city_orthophoto").is_none());
    }

    #[test]
    fn test_parse_111_lat_lon_bounding_box() {
        let xml = r#"<WMT_MS_Capabilities version="1.1.1">
  <Capability>
    <Layer>
      <Title>root</Title>
      <Layer queryable="1">
        <Name>vector:roads</Name>
        <Title>Roads</Title>
        <SRS>EPSG:4326</SRS>
        <LatLonBoundingBox minx="30.1" miny="59.8" maxx="30.6" maxy="60.1"/>
      </Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;
        let caps = parse_capabilities(xml).unwrap();
        assert_eq!(caps.version, "1.1.1");
        let roads = caps.find_layer("vector", "roads").unwrap();
        assert_eq!(roads.crs, vec!["EPSG:4326"]);
        assert_eq!(
            roads.geographic_bbox,
            Some(GeographicBoundingBox {
                west: 30.1,
                south: 59.8,
                east: 30.6,
                north: 60.1
            })
        );
    }

    #[test]
    fn test_layer_extent_in_web_mercator() {
        let caps = parse_capabilities(CAPABILITIES_130).unwrap();
        let extent = layer_extent(&caps, "ecw", "city_orthophoto").unwrap();

        let expected = Projection::Wgs84
            .transform_extent(Extent::new(37.3, 55.5, 37.9, 55.95), Projection::WebMercator);
        assert_eq!(extent, expected);
        assert!(extent.min_x > 4_150_000.0 && extent.max_x < 4_220_000.0);
    }

    #[test]
    fn test_layer_extent_missing() {
        let caps = parse_capabilities(CAPABILITIES_130).unwrap();
        assert!(layer_extent(&caps, "ecw", "nope").is_none());
        assert!(layer_extent(&WmsCapabilities::default(), "ecw", "city_orthophoto").is_none());
    }

    #[test]
    fn test_metadata_rendering() {
        let caps = parse_capabilities(CAPABILITIES_130).unwrap();
        let meta = LayerMetadata::from_layer(caps.find_layer("ecw", "city_orthophoto").unwrap());

        let en = meta.render(Language::En);
        assert!(en.starts_with("City orthophoto\nOrthophoto mosaic, 2023"));
        assert!(en.contains("Keywords: orthophoto, ECW"));
        assert!(en.contains("West: 37.300000"));
        assert!(en.contains("North: 55.950000"));

        let ru = meta.to_string();
        assert!(ru.contains("Ключевые слова: orthophoto, ECW"));
        assert!(ru.contains("Восток: 37.900000"));
    }

    #[test]
    fn test_metadata_title_falls_back_to_name() {
        let layer = WmsLayer {
            name: Some("vector:buildings".to_string()),
            ..Default::default()
        };
        let meta = LayerMetadata::from_layer(&layer);
        assert_eq!(meta.to_string(), "vector:buildings");
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse_capabilities("<WMS_Capabilities><Capability><Layer></Capability>")
            .unwrap_err();
        assert!(matches!(err, GisError::Parse(ParseError::Xml { .. })));

        let err = parse_capabilities("<WMS_Capabilities><Capability>").unwrap_err();
        assert!(matches!(err, GisError::Parse(ParseError::Xml { .. })));
    }

    #[test]
    fn test_invalid_bbox_value() {
        let xml = r#"<WMS_Capabilities version="1.3.0"><Capability><Layer>
            <EX_GeographicBoundingBox><westBoundLongitude>west</westBoundLongitude></EX_GeographicBoundingBox>
        </Layer></Capability></WMS_Capabilities>"#;
        let err = parse_capabilities(xml).unwrap_err();
        assert!(matches!(err, GisError::Parse(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn test_service_exception_report() {
        let xml = r#"<ServiceExceptionReport version="1.3.0">
  <ServiceException code="LayerNotDefined">Unknown layer</ServiceException>
</ServiceExceptionReport>"#;
        match parse_capabilities(xml).unwrap_err() {
            GisError::Parse(ParseError::InvalidValue { reason, .. }) => {
                assert_eq!(reason, "Unknown layer")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_a_capabilities_document() {
        let err = parse_capabilities("<html><body>Login</body></html>").unwrap_err();
        assert!(matches!(err, GisError::Parse(ParseError::MissingField { .. })));
    }
}
