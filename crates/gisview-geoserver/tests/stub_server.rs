//! Client tests against a local stub GeoServer.

use axum::extract::Query;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use gisview_core::config::GeoServerConfig;
use gisview_core::error::{GisError, NetworkError};
use gisview_core::types::MapCoord;
use gisview_geoserver::{FeatureInfoRequest, FeatureTarget, GeoServerClient};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

const CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0">
  <Service><Name>WMS</Name><Title>Stub</Title></Service>
  <Capability>
    <Layer>
      <Title>Stub</Title>
      <Layer queryable="1">
        <Name>ecw:city_orthophoto</Name>
        <Title>City orthophoto</Title>
        <KeywordList><Keyword>orthophoto</Keyword></KeywordList>
        <EX_GeographicBoundingBox>
          <westBoundLongitude>37.3</westBoundLongitude>
          <eastBoundLongitude>37.9</eastBoundLongitude>
          <southBoundLatitude>55.5</southBoundLatitude>
          <northBoundLatitude>55.95</northBoundLatitude>
        </EX_GeographicBoundingBox>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

async fn wms(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    match params.get("REQUEST").map(String::as_str) {
        Some("GetCapabilities") => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/xml")],
            CAPABILITIES.to_string(),
        )
            .into_response(),
        Some("GetFeatureInfo") => {
            let layer = params.get("QUERY_LAYERS").cloned().unwrap_or_default();
            if params.get("I").map(String::as_str) != Some("50") {
                return StatusCode::BAD_REQUEST.into_response();
            }
            let features = match layer.as_str() {
                "vector:buildings" => json!([{
                    "type": "Feature",
                    "id": "buildings.1",
                    "geometry": null,
                    "properties": {"name": "Main Hall", "floors": 4}
                }]),
                "vector:piers" => json!([{
                    "type": "Feature",
                    "id": 7,
                    "geometry": {"type": "Point", "coordinates": [4187000.0, 7508000.0]},
                    "properties": {"name": "North pier"}
                }]),
                _ => json!([]),
            };
            Json(json!({"type": "FeatureCollection", "features": features})).into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn broken_wms() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn slow_wms() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(3)).await;
    StatusCode::OK
}

async fn workspaces(headers: HeaderMap) -> impl IntoResponse {
    // admin:geoserver
    let expected = "Basic YWRtaW46Z2Vvc2VydmVy";
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"workspaces": {"workspace": [{"name": "vector"}, {"name": "ecw"}]}}))
        .into_response()
}

async fn vector_layers() -> impl IntoResponse {
    Json(json!({"layers": {"layer": [{"name": "vector:buildings"}, {"name": "vector:roads"}]}}))
}

async fn empty_layers() -> impl IntoResponse {
    Json(json!({"layers": ""}))
}

async fn building_details() -> impl IntoResponse {
    Json(json!({"layer": {"name": "buildings", "type": "VECTOR", "queryable": true}}))
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/geoserver/ecw/wms", get(wms))
        .route("/geoserver/vector/wms", get(wms))
        .route("/geoserver/broken/wms", get(broken_wms))
        .route("/geoserver/slow/wms", get(slow_wms))
        .route("/geoserver/vector/rest/workspaces", get(workspaces))
        .route("/geoserver/vector/rest/workspaces/vector/layers", get(vector_layers))
        .route("/geoserver/vector/rest/layers", get(empty_layers))
        .route(
            "/geoserver/vector/rest/workspaces/vector/layers/buildings",
            get(building_details),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/geoserver")
}

fn client(base_url: String) -> GeoServerClient {
    GeoServerClient::new(GeoServerConfig {
        base_url,
        username: Some("admin".to_string()),
        password: Some("geoserver".to_string()),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_capabilities_and_extent() {
    let client = client(spawn_stub().await);

    let caps = client.fetch_capabilities("ecw").await.unwrap();
    assert_eq!(caps.service.title, "Stub");
    assert_eq!(caps.layers().len(), 1);

    let extent = client
        .layer_extent("ecw", "ecw", "city_orthophoto")
        .await
        .unwrap()
        .unwrap();
    assert!(extent.min_x > 4_150_000.0 && extent.max_x < 4_220_000.0);

    let missing = client.layer_extent("ecw", "ecw", "nope").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_layer_metadata() {
    let client = client(spawn_stub().await);

    let meta = client
        .layer_metadata("ecw", "ecw", "city_orthophoto")
        .await
        .unwrap();
    assert_eq!(meta.title, "City orthophoto");
    assert_eq!(meta.keywords, vec!["orthophoto"]);

    let err = client
        .layer_metadata("ecw", "ecw", "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, GisError::NotFound { .. }));
}

#[tokio::test]
async fn test_http_status_error() {
    let client = client(spawn_stub().await);

    let err = client.fetch_capabilities("broken").await.unwrap_err();
    assert!(err.is_transient());
    match err {
        GisError::Network(NetworkError::HttpStatus { status, .. }) => assert_eq!(status, 500),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_error() {
    let base_url = spawn_stub().await;
    let client = GeoServerClient::new(GeoServerConfig {
        base_url,
        request_timeout_secs: 1,
        ..Default::default()
    })
    .unwrap();

    let err = client.fetch_capabilities("slow").await.unwrap_err();
    assert!(matches!(
        err,
        GisError::Network(NetworkError::Timeout { timeout_secs: 1, .. })
    ));
}

#[tokio::test]
async fn test_connection_refused() {
    let client = client("http://127.0.0.1:9/geoserver".to_string());
    let err = client.fetch_capabilities("ecw").await.unwrap_err();
    assert!(matches!(
        err,
        GisError::Network(NetworkError::RequestFailed { .. })
    ));
}

#[tokio::test]
async fn test_feature_info() {
    let client = client(spawn_stub().await);

    let request = FeatureInfoRequest::new(
        client.wms_url("vector"),
        vec!["vector:buildings".to_string()],
        MapCoord::new(4_187_000.0, 7_508_000.0),
        1.5,
    );
    let collection = client.feature_info(&request).await.unwrap();
    assert_eq!(collection.features.len(), 1);
    assert_eq!(collection.features[0].id.as_deref(), Some("buildings.1"));
}

#[tokio::test]
async fn test_point_info_keeps_numeric_ids_and_drops_failed_layers() {
    let client = client(spawn_stub().await);

    let targets = vec![
        FeatureTarget {
            instance: "vector".to_string(),
            layer: "vector:buildings".to_string(),
            title: "Buildings".to_string(),
        },
        FeatureTarget {
            instance: "vector".to_string(),
            layer: "vector:roads".to_string(),
            title: "Roads".to_string(),
        },
        FeatureTarget {
            instance: "vector".to_string(),
            layer: "vector:piers".to_string(),
            title: "Piers".to_string(),
        },
        FeatureTarget {
            instance: "broken".to_string(),
            layer: "broken:parcels".to_string(),
            title: "Parcels".to_string(),
        },
    ];

    let found = client
        .point_info(&targets, MapCoord::new(4_187_000.0, 7_508_000.0), 1.5)
        .await;
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].title, "Buildings");
    assert_eq!(found[0].features[0].attributes().len(), 2);
    assert_eq!(found[1].title, "Piers");
    assert_eq!(found[1].features[0].id.as_deref(), Some("7"));
    assert!(found[1].features[0].geometry.is_some());

    assert!(client
        .point_info(&[], MapCoord::new(0.0, 0.0), 1.0)
        .await
        .is_empty());
}

#[tokio::test]
async fn test_rest_catalog() {
    let client = client(spawn_stub().await);
    let rest = client.rest("vector");

    let workspaces = rest.list_workspaces().await.unwrap();
    let names: Vec<&str> = workspaces.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["vector", "ecw"]);

    let layers = rest.list_layers(Some("vector")).await.unwrap();
    assert_eq!(layers.len(), 2);
    assert!(rest.list_layers(None).await.unwrap().is_empty());

    let details = rest.layer_details("vector", "buildings").await.unwrap();
    assert_eq!(details.layer_type.as_deref(), Some("VECTOR"));
}

#[tokio::test]
async fn test_rest_without_credentials_is_rejected() {
    let base_url = spawn_stub().await;
    let anonymous = GeoServerClient::new(GeoServerConfig {
        base_url,
        ..Default::default()
    })
    .unwrap();

    let err = anonymous.rest("vector").list_workspaces().await.unwrap_err();
    match err {
        GisError::Network(NetworkError::HttpStatus { status, .. }) => assert_eq!(status, 401),
        other => panic!("unexpected error: {other:?}"),
    }
}
