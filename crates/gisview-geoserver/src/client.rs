//! Async HTTP client for the GeoServer instances.

use crate::capabilities::{self, parse_capabilities, LayerMetadata, WmsCapabilities};
use crate::feature_info::{FeatureCollection, FeatureInfoRequest, FeatureTarget, LayerFeatureInfo};
use crate::rest::RestCatalog;
use futures::future::join_all;
use gisview_core::config::GeoServerConfig;
use gisview_core::error::{GisError, NetworkError, ParseError, Result};
use gisview_core::types::{Extent, MapCoord};
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, error, info};

/// Client for the WMS endpoints and REST catalog of every instance under
/// one GeoServer base URL.
#[derive(Debug, Clone)]
pub struct GeoServerClient {
    config: GeoServerConfig,
    client: Client,
}

impl GeoServerClient {
    /// Creates a client with the configured request timeout.
    pub fn new(config: GeoServerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GisError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GeoServerConfig {
        &self.config
    }

    /// Root URL of one instance, e.g. `http://host/geoserver/ecw`.
    pub fn instance_url(&self, instance: &str) -> String {
        format!("{}/{}", self.config.trimmed_base_url(), instance)
    }

    /// WMS endpoint of one instance.
    pub fn wms_url(&self, instance: &str) -> String {
        format!("{}/wms", self.instance_url(instance))
    }

    /// GetCapabilities URL of one instance.
    pub fn capabilities_url(&self, instance: &str) -> String {
        format!(
            "{}?SERVICE=WMS&VERSION={}&REQUEST=GetCapabilities",
            self.wms_url(instance),
            self.config.wms_version
        )
    }

    /// Downloads and parses the capabilities document of one instance.
    pub async fn fetch_capabilities(&self, instance: &str) -> Result<WmsCapabilities> {
        let url = self.capabilities_url(instance);
        debug!(url = %url, "Fetching capabilities");

        let response = self.send(&url, self.client.get(&url)).await?;
        let body = response
            .text()
            .await
            .map_err(|e| self.map_error(&url, e))?;

        let caps = parse_capabilities(&body)?;
        info!(
            instance = %instance,
            layers = caps.layers().len(),
            "Capabilities loaded"
        );
        Ok(caps)
    }

    /// Web Mercator extent of a layer, `None` when it is unknown or unbounded.
    pub async fn layer_extent(
        &self,
        instance: &str,
        workspace: &str,
        layer: &str,
    ) -> Result<Option<Extent>> {
        let caps = self.fetch_capabilities(instance).await?;
        Ok(capabilities::layer_extent(&caps, workspace, layer))
    }

    /// Descriptive metadata of a layer.
    pub async fn layer_metadata(
        &self,
        instance: &str,
        workspace: &str,
        layer: &str,
    ) -> Result<LayerMetadata> {
        let caps = self.fetch_capabilities(instance).await?;
        caps.find_layer(workspace, layer)
            .map(LayerMetadata::from_layer)
            .ok_or_else(|| GisError::not_found(format!("layer {workspace}:{layer}")))
    }

    /// Runs one feature query.
    pub async fn feature_info(&self, request: &FeatureInfoRequest) -> Result<FeatureCollection> {
        let url = request.url()?;
        let display = url.to_string();

        let response = self.send(&display, self.client.get(url)).await?;
        let body = response
            .text()
            .await
            .map_err(|e| self.map_error(&display, e))?;

        FeatureCollection::from_geojson(&body)
    }

    /// Queries every target at `coordinate` concurrently.
    ///
    /// Failed layers are logged and skipped; layers without features are
    /// dropped.
    pub async fn point_info(
        &self,
        targets: &[FeatureTarget],
        coordinate: MapCoord,
        resolution: f64,
    ) -> Vec<LayerFeatureInfo> {
        let queries = targets.iter().map(|target| async move {
            let request = FeatureInfoRequest::new(
                self.wms_url(&target.instance),
                vec![target.layer.clone()],
                coordinate,
                resolution,
            )
            .with_feature_count(self.config.feature_count);

            match self.feature_info(&request).await {
                Ok(collection) => Some(LayerFeatureInfo {
                    layer: target.layer.clone(),
                    title: target.title.clone(),
                    features: collection.features,
                }),
                Err(e) => {
                    error!(layer = %target.layer, error = %e, "Feature query failed");
                    None
                }
            }
        });

        let found: Vec<LayerFeatureInfo> = join_all(queries)
            .await
            .into_iter()
            .flatten()
            .filter(|info| !info.features.is_empty())
            .collect();

        debug!(
            queried = targets.len(),
            with_features = found.len(),
            "Point query finished"
        );
        found
    }

    /// Read-only REST catalog of one instance.
    pub fn rest(&self, instance: &str) -> RestCatalog<'_> {
        RestCatalog::new(self, self.instance_url(instance))
    }

    /// Sends a request and rejects non-success statuses.
    pub(crate) async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| self.map_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::http_status(url, status.as_u16()).into());
        }

        Ok(response)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    pub(crate) fn map_error(&self, url: &str, e: reqwest::Error) -> GisError {
        if e.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.request_timeout_secs,
            }
            .into()
        } else if e.is_decode() {
            ParseError::invalid_value("response body", e.to_string()).into()
        } else {
            NetworkError::request_failed(url, e.to_string()).into()
        }
    }
}
