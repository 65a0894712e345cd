//! Panorama markers placed on the map.

use gisview_core::error::{GisError, ParseError, Result};
use gisview_core::types::{Extent, MapCoord, Panorama, Projection};
use tracing::{debug, error, info};

/// A panorama and where its marker sits in map coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaMarker {
    pub panorama: Panorama,
    pub position: MapCoord,
}

/// Panoramas shown as markers on one map layer.
///
/// Markers are kept in insertion order. Hiding the layer keeps the
/// panoramas but makes them unreachable from map clicks.
#[derive(Debug, Clone)]
pub struct PanoramaRegistry {
    markers: Vec<PanoramaMarker>,
    projection: Projection,
    visible: bool,
}

impl Default for PanoramaRegistry {
    fn default() -> Self {
        Self::new(Projection::WebMercator)
    }
}

impl PanoramaRegistry {
    /// Creates an empty, visible registry for a map in `projection`.
    pub fn new(projection: Projection) -> Self {
        Self {
            markers: Vec::new(),
            projection,
            visible: true,
        }
    }

    /// Places a panorama on the map and returns its marker position.
    ///
    /// # Errors
    ///
    /// Fails when the panorama has no finite coordinates.
    pub fn add(&mut self, panorama: Panorama) -> Result<MapCoord> {
        let coordinates = match panorama.coordinates {
            Some(c) if c.is_finite() => c,
            Some(c) => {
                error!(panorama = %panorama.id, coordinates = %c, "Invalid panorama coordinates");
                return Err(GisError::Parse(ParseError::invalid_value(
                    "coordinates",
                    format!("not finite: {c}"),
                )));
            }
            None => {
                error!(panorama = %panorama.id, "Panorama without coordinates");
                return Err(GisError::Parse(ParseError::missing_field("coordinates")));
            }
        };

        let position = self.projection.project(coordinates);
        debug!(panorama = %panorama.id, name = panorama.display_name(), "Panorama added");
        self.markers.push(PanoramaMarker { panorama, position });
        Ok(position)
    }

    /// Adds every valid panorama; returns how many were placed.
    pub fn add_all(&mut self, panoramas: impl IntoIterator<Item = Panorama>) -> usize {
        let added = panoramas
            .into_iter()
            .map(|p| self.add(p))
            .filter(|placed| placed.is_ok())
            .count();
        info!(added, total = self.markers.len(), "Panoramas loaded");
        added
    }

    /// Removes a panorama; returns false when no panorama has this id.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.markers.iter().position(|m| m.panorama.id == id) else {
            return false;
        };
        self.markers.remove(index);
        debug!(panorama = %id, "Panorama removed");
        true
    }

    pub fn get(&self, id: &str) -> Option<&Panorama> {
        self.markers
            .iter()
            .find(|m| m.panorama.id == id)
            .map(|m| &m.panorama)
    }

    /// Every panorama, in insertion order.
    pub fn panoramas(&self) -> Vec<&Panorama> {
        self.markers.iter().map(|m| &m.panorama).collect()
    }

    pub fn markers(&self) -> &[PanoramaMarker] {
        &self.markers
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// The marker hit by a click at `coordinate`, if the layer is shown.
    ///
    /// `tolerance` is the half-size of the hit box in map units; the most
    /// recently added marker wins when several overlap.
    pub fn marker_at(&self, coordinate: MapCoord, tolerance: f64) -> Option<&PanoramaMarker> {
        if !self.visible {
            return None;
        }

        let hit_box = Extent::new(
            coordinate.x - tolerance,
            coordinate.y - tolerance,
            coordinate.x + tolerance,
            coordinate.y + tolerance,
        );
        self.markers
            .iter()
            .rev()
            .find(|m| hit_box.contains(m.position))
    }
}
