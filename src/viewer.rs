//! The viewer: one map with its layers, measuring tools and server access.

use crate::layers::LayerRegistry;
use crate::notice::NoticeBoard;
use crate::panorama::PanoramaRegistry;
use futures::future::join_all;
use gisview_core::config::ViewerConfig;
use gisview_core::error::{GisError, Result};
use gisview_core::logging::init_tracing;
use gisview_core::types::{Extent, Layer, MapCoord};
use gisview_core::units::Language;
use gisview_geoserver::{FeatureTarget, GeoServerClient, LayerFeatureInfo, LayerMetadata};
use gisview_measure::{DrawSurface, Measurement, MeasurementController};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Owner of all per-map state.
///
/// Server lookups never fail outward: errors are logged, posted to the
/// notice board and reported as `None` or an empty result.
pub struct Viewer<S: DrawSurface> {
    config: ViewerConfig,
    registry: LayerRegistry,
    measurement: MeasurementController<S>,
    geoserver: GeoServerClient,
    notices: NoticeBoard,
    panoramas: PanoramaRegistry,
}

impl<S: DrawSurface> Viewer<S> {
    /// Creates a viewer drawing measurements on `surface`.
    pub fn new(config: ViewerConfig, surface: S) -> Result<Self> {
        config.validate()?;

        let geoserver = GeoServerClient::new(config.geoserver.clone())?;
        let mut registry = LayerRegistry::new();
        registry.load(&config.catalog)?;
        let measurement = MeasurementController::new(surface, config.measurement);
        let mut panoramas = PanoramaRegistry::new(config.map.projection);
        panoramas.add_all(config.panoramas.iter().cloned());

        info!(
            geoserver = %config.geoserver.base_url,
            layers = registry.layers().len(),
            panoramas = panoramas.len(),
            "Viewer created"
        );

        Ok(Self {
            config,
            registry,
            measurement,
            geoserver,
            notices: NoticeBoard::new(),
            panoramas,
        })
    }

    /// Loads the configuration file, installs logging and creates the viewer.
    pub fn from_file(path: impl AsRef<Path>, surface: S) -> Result<Self> {
        let config = ViewerConfig::from_file(path)?;
        init_tracing(&config.logging)?;
        Self::new(config, surface)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut LayerRegistry {
        &mut self.registry
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    pub fn panoramas(&self) -> &PanoramaRegistry {
        &self.panoramas
    }

    pub fn panoramas_mut(&mut self) -> &mut PanoramaRegistry {
        &mut self.panoramas
    }

    pub fn geoserver(&self) -> &GeoServerClient {
        &self.geoserver
    }

    /// The measuring tools; the map adapter feeds draw events through here.
    pub fn measurement(&self) -> &MeasurementController<S> {
        &self.measurement
    }

    pub fn measurement_mut(&mut self) -> &mut MeasurementController<S> {
        &mut self.measurement
    }

    pub fn start_measure_distance(&mut self) {
        self.measurement.start_measure_distance();
    }

    pub fn start_measure_area(&mut self) {
        self.measurement.start_measure_area();
    }

    pub fn stop_measure(&mut self) {
        self.measurement.stop_measure();
    }

    pub fn clear_measurements(&mut self) {
        self.measurement.clear_measurements();
    }

    pub fn measurements(&self) -> &[Measurement] {
        self.measurement.measurements()
    }

    /// Shows or hides a layer; returns whether it is now shown.
    pub fn toggle_layer(&mut self, id: u32) -> Option<bool> {
        match self.registry.toggle_layer_visibility(id) {
            Ok(shown) => Some(shown),
            Err(e) => {
                warn!(layer = id, error = %e, "Cannot toggle layer");
                None
            }
        }
    }

    /// Web Mercator extent to zoom the map to, if the server knows the layer.
    ///
    /// A hidden layer is switched on first. When no extent comes back the
    /// user is warned and the layer's availability is checked again.
    pub async fn zoom_to_layer(&mut self, id: u32) -> Option<Extent> {
        let layer = self.known_layer(id)?;
        if let Ok(true) = self.registry.activate_layer(id) {
            debug!(layer = id, "Layer switched on for zoom");
        }

        let instance = self.config.geoserver.instance_for(layer.kind).to_string();
        match self
            .geoserver
            .layer_extent(&instance, &layer.workspace, &layer.name)
            .await
        {
            Ok(Some(extent)) => return Some(extent),
            Ok(None) => {
                let message = match self.language() {
                    Language::Ru => format!("Не удалось получить границы слоя \"{}\"", layer.title),
                    Language::En => format!("Could not get the bounds of layer \"{}\"", layer.title),
                };
                self.notices.warn(message);
            }
            Err(e) => self.report_failure(&layer, &e),
        }

        self.check_layer_availability(id).await;
        None
    }

    /// Looks the layer up in its instance's capabilities and records
    /// whether it is published. Any failure counts as unavailable.
    pub async fn check_layer_availability(&mut self, id: u32) -> Option<bool> {
        let layer = self.known_layer(id)?;
        let available = self.layer_is_published(&layer).await;
        self.registry.set_layer_available(id, available).ok()?;
        Some(available)
    }

    /// Checks every catalog layer concurrently; returns the ids of the
    /// layers found unavailable.
    pub async fn check_layers_availability(&mut self) -> Vec<u32> {
        let layers: Vec<Layer> = self.registry.layers().to_vec();
        let results = join_all(layers.iter().map(|layer| self.layer_is_published(layer))).await;

        let mut unavailable = Vec::new();
        for (layer, available) in layers.iter().zip(results) {
            if self.registry.set_layer_available(layer.id, available).is_ok() && !available {
                unavailable.push(layer.id);
            }
        }

        info!(
            checked = layers.len(),
            unavailable = unavailable.len(),
            "Layer availability checked"
        );
        unavailable
    }

    async fn layer_is_published(&self, layer: &Layer) -> bool {
        let instance = self.config.geoserver.instance_for(layer.kind);
        debug!(layer = %layer.qualified_name(), instance, "Checking layer availability");

        match self.geoserver.fetch_capabilities(instance).await {
            Ok(caps) => caps.find_layer(&layer.workspace, &layer.name).is_some(),
            Err(e) => {
                error!(layer = %layer.qualified_name(), error = %e, "Availability check failed");
                false
            }
        }
    }

    /// Descriptive metadata of a layer from the capabilities document.
    pub async fn show_layer_metadata(&mut self, id: u32) -> Option<LayerMetadata> {
        let layer = self.known_layer(id)?;
        let instance = self.config.geoserver.instance_for(layer.kind).to_string();

        match self
            .geoserver
            .layer_metadata(&instance, &layer.workspace, &layer.name)
            .await
        {
            Ok(metadata) => Some(metadata),
            Err(GisError::NotFound { .. }) => {
                let qualified = layer.qualified_name();
                warn!(layer = %qualified, "Layer not found on the map server");
                let message = match self.language() {
                    Language::Ru => format!(
                        "Слой {qualified} не найден в GeoServer. Проверьте, что слой опубликован."
                    ),
                    Language::En => format!(
                        "Layer {qualified} was not found in GeoServer. Check that it is published."
                    ),
                };
                self.notices.warn(message);
                None
            }
            Err(e) => {
                self.report_failure(&layer, &e);
                None
            }
        }
    }

    /// Features under `coordinate` on every shown, queryable layer.
    pub async fn identify(&mut self, coordinate: MapCoord, resolution: f64) -> Vec<LayerFeatureInfo> {
        let targets: Vec<FeatureTarget> = self
            .registry
            .visible_layers()
            .into_iter()
            .filter(|l| l.queryable && l.is_published)
            .map(|l| FeatureTarget {
                instance: self.config.geoserver.instance_for(l.kind).to_string(),
                layer: l.qualified_name(),
                title: l.title.clone(),
            })
            .collect();

        if targets.is_empty() {
            return Vec::new();
        }

        self.geoserver
            .point_info(&targets, coordinate, resolution)
            .await
    }

    fn known_layer(&self, id: u32) -> Option<Layer> {
        let layer = self.registry.layer(id).cloned();
        if layer.is_none() {
            warn!(layer = id, "Unknown layer id");
        }
        layer
    }

    fn language(&self) -> Language {
        self.config.measurement.language
    }

    fn report_failure(&mut self, layer: &Layer, e: &GisError) {
        let qualified = layer.qualified_name();
        error!(layer = %qualified, error = %e, "Map server request failed");
        let message = match self.language() {
            Language::Ru => format!(
                "Ошибка при получении данных слоя {qualified}. Проверьте соединение с GeoServer."
            ),
            Language::En => format!(
                "Failed to load data for layer {qualified}. Check the connection to GeoServer."
            ),
        };
        self.notices.error(message);
    }
}
