//! Read-only access to the GeoServer REST catalog.
//!
//! Calls carry HTTP basic credentials when the configuration provides a
//! username.

use crate::client::GeoServerClient;
use gisview_core::error::Result;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name and link of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub href: Option<String>,
}

/// Detailed description of a published layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDetails {
    pub name: String,
    /// `VECTOR` or `RASTER`
    #[serde(rename = "type", default)]
    pub layer_type: Option<String>,
    #[serde(default)]
    pub default_style: Option<CatalogEntry>,
    #[serde(default)]
    pub resource: Option<CatalogEntry>,
    #[serde(default)]
    pub queryable: Option<bool>,
    #[serde(default)]
    pub opaque: Option<bool>,
}

// The catalog answers an empty listing with `""` instead of an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Items(T),
    Empty(#[allow(dead_code)] String),
}

impl<T: Default> Listing<T> {
    fn into_inner(self) -> T {
        match self {
            Listing::Items(items) => items,
            Listing::Empty(_) => T::default(),
        }
    }
}

#[derive(Deserialize)]
struct WorkspacesEnvelope {
    workspaces: Listing<WorkspaceItems>,
}

#[derive(Deserialize, Default)]
struct WorkspaceItems {
    #[serde(default)]
    workspace: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct LayersEnvelope {
    layers: Listing<LayerItems>,
}

#[derive(Deserialize, Default)]
struct LayerItems {
    #[serde(default)]
    layer: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct LayerEnvelope {
    layer: LayerDetails,
}

/// REST catalog of one instance.
pub struct RestCatalog<'a> {
    client: &'a GeoServerClient,
    instance_url: String,
}

impl<'a> RestCatalog<'a> {
    pub(crate) fn new(client: &'a GeoServerClient, instance_url: String) -> Self {
        Self {
            client,
            instance_url,
        }
    }

    /// Lists the workspaces.
    pub async fn list_workspaces(&self) -> Result<Vec<CatalogEntry>> {
        let envelope: WorkspacesEnvelope = self.get("workspaces").await?;
        Ok(envelope.workspaces.into_inner().workspace)
    }

    /// Lists the layers of one workspace, or of every workspace.
    pub async fn list_layers(&self, workspace: Option<&str>) -> Result<Vec<CatalogEntry>> {
        let path = match workspace {
            Some(ws) => format!("workspaces/{ws}/layers"),
            None => "layers".to_string(),
        };
        let envelope: LayersEnvelope = self.get(&path).await?;
        Ok(envelope.layers.into_inner().layer)
    }

    /// Describes one layer.
    pub async fn layer_details(&self, workspace: &str, layer: &str) -> Result<LayerDetails> {
        let envelope: LayerEnvelope = self
            .get(&format!("workspaces/{workspace}/layers/{layer}"))
            .await?;
        Ok(envelope.layer)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/rest/{}", self.instance_url, path);
        debug!(url = %url, "REST catalog request");

        let config = self.client.config();
        let mut request = self
            .client
            .http()
            .get(&url)
            .header(ACCEPT, "application/json");
        if let Some(username) = &config.username {
            request = request.basic_auth(username, config.password.as_ref());
        }

        let response = self.client.send(&url, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| self.client.map_error(&url, e))
    }
}
