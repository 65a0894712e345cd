//! Common test utilities and helpers for integration tests

use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use gisview::{DrawSurface, GeometryKind, OverlayId, Projection, Tooltip};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Get the path to test fixtures
pub fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("tests").join("fixtures")
}

/// Get the path to the sample viewer configuration
pub fn sample_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join("gisview.yaml")
}

fn capabilities() -> String {
    let path = fixtures_dir().join("capabilities_ecw.xml");
    std::fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Failed to read capabilities fixture from {:?}", path))
}

async fn ecw_wms(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    match params.get("REQUEST").map(String::as_str) {
        Some("GetCapabilities") => {
            ([(header::CONTENT_TYPE, "text/xml")], capabilities()).into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn vector_wms(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("REQUEST").map(String::as_str) != Some("GetFeatureInfo") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match params.get("QUERY_LAYERS").map(String::as_str) {
        Some("vector:buildings") => Json(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "id": "buildings.7",
                "geometry": null,
                "properties": {"name": "Городская библиотека", "floors": 3}
            }]
        }))
        .into_response(),
        Some("vector:roads") => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        _ => Json(json!({"type": "FeatureCollection", "features": []})).into_response(),
    }
}

/// Starts a stub GeoServer with a `vector` and an `ecw` instance and
/// returns its base URL.
pub async fn spawn_geoserver() -> String {
    let app = Router::new()
        .route("/geoserver/ecw/wms", get(ecw_wms))
        .route("/geoserver/vector/wms", get(vector_wms));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Stub server has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server failed");
    });

    format!("http://{addr}/geoserver")
}

/// Map adapter that records what the viewer asked it to draw.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub interactions: Vec<GeometryKind>,
    pub overlays: HashMap<OverlayId, Tooltip>,
    pub pinned: Vec<(Uuid, Tooltip)>,
}

impl DrawSurface for RecordingSurface {
    fn projection(&self) -> Projection {
        Projection::WebMercator
    }

    fn add_draw_interaction(&mut self, geometry: GeometryKind) {
        self.interactions.push(geometry);
    }

    fn remove_draw_interaction(&mut self) {
        self.interactions.pop();
    }

    fn show_overlay(&mut self, overlay: OverlayId, tooltip: &Tooltip) {
        self.overlays.insert(overlay, tooltip.clone());
    }

    fn hide_overlay(&mut self, overlay: OverlayId) {
        self.overlays.remove(&overlay);
    }

    fn pin_overlay(&mut self, measurement: Uuid, tooltip: &Tooltip) {
        self.pinned.push((measurement, tooltip.clone()));
    }

    fn clear_measurements(&mut self) {
        self.pinned.clear();
    }
}
