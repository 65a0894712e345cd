//! Layer catalog and visibility state.

use gisview_core::config::CatalogConfig;
use gisview_core::error::{GisError, Result};
use gisview_core::types::{Category, Layer};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Whether the map server was last found to publish a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerStatus {
    /// Not checked yet
    #[default]
    Unknown,
    Available,
    Unavailable,
}

/// Layers and categories known to the viewer, and which layers are shown.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
    categories: Vec<Category>,
    /// Shown layers, in the order they were switched on
    active: Vec<u32>,
    selected_category: Option<u32>,
    status: HashMap<u32, LayerStatus>,
    error: Option<String>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the catalog.
    ///
    /// An invalid catalog leaves the registry untouched and records the
    /// failure as the last error. Active layers that no longer exist are
    /// switched off.
    pub fn load(&mut self, catalog: &CatalogConfig) -> Result<()> {
        if let Err(e) = catalog.validate() {
            error!(error = %e, "Failed to load layer catalog");
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.layers = catalog.layers.clone();
        self.categories = catalog.categories.clone();
        let layers = &self.layers;
        self.active.retain(|id| layers.iter().any(|l| l.id == *id));
        self.status.retain(|id, _| layers.iter().any(|l| l.id == *id));
        if let Some(selected) = self.selected_category {
            if !self.categories.iter().any(|c| c.id == selected) {
                self.selected_category = None;
            }
        }
        self.error = None;

        info!(
            layers = self.layers.len(),
            categories = self.categories.len(),
            "Layer catalog loaded"
        );
        Ok(())
    }

    /// Every known layer, in catalog order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: u32) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Shown layers, in catalog order.
    pub fn visible_layers(&self) -> Vec<&Layer> {
        self.layers
            .iter()
            .filter(|l| self.active.contains(&l.id))
            .collect()
    }

    /// Ids of the shown layers, in the order they were switched on.
    pub fn active_layer_ids(&self) -> &[u32] {
        &self.active
    }

    /// Layers in `category`, or every layer when no category is given.
    pub fn layers_by_category(&self, category: Option<u32>) -> Vec<&Layer> {
        match category {
            None => self.layers.iter().collect(),
            Some(id) => self
                .layers
                .iter()
                .filter(|l| l.categories.contains(&id))
                .collect(),
        }
    }

    pub fn is_layer_active(&self, id: u32) -> bool {
        self.active.contains(&id)
    }

    /// Shows a hidden layer or hides a shown one; returns the new state.
    pub fn toggle_layer_visibility(&mut self, id: u32) -> Result<bool> {
        if self.layer(id).is_none() {
            return Err(GisError::not_found(format!("layer {id}")));
        }

        let shown = match self.active.iter().position(|active| *active == id) {
            Some(index) => {
                self.active.remove(index);
                false
            }
            None => {
                self.active.push(id);
                true
            }
        };

        debug!(layer = id, shown, "Layer visibility toggled");
        Ok(shown)
    }

    /// Shows a layer if it is hidden; returns true if it was switched on now.
    pub fn activate_layer(&mut self, id: u32) -> Result<bool> {
        if self.is_layer_active(id) {
            return Ok(false);
        }
        self.toggle_layer_visibility(id)
    }

    /// Last known availability of a layer on the map server.
    pub fn layer_status(&self, id: u32) -> LayerStatus {
        self.status.get(&id).copied().unwrap_or_default()
    }

    /// Records whether the map server publishes a layer.
    pub fn set_layer_available(&mut self, id: u32, available: bool) -> Result<()> {
        if self.layer(id).is_none() {
            return Err(GisError::not_found(format!("layer {id}")));
        }

        let status = if available {
            LayerStatus::Available
        } else {
            warn!(layer = id, "Layer unavailable on the map server");
            LayerStatus::Unavailable
        };
        self.status.insert(id, status);
        Ok(())
    }

    /// Layers last found missing on the map server, in catalog order.
    pub fn unavailable_layers(&self) -> Vec<&Layer> {
        self.layers
            .iter()
            .filter(|l| self.layer_status(l.id) == LayerStatus::Unavailable)
            .collect()
    }

    pub fn selected_category(&self) -> Option<u32> {
        self.selected_category
    }

    pub fn set_selected_category(&mut self, category: Option<u32>) {
        self.selected_category = category;
    }

    /// Layers of the selected category.
    pub fn selected_layers(&self) -> Vec<&Layer> {
        self.layers_by_category(self.selected_category)
    }

    /// Message of the last failed load, if the last load failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
