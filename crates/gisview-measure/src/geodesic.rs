//! Geodesic length and area on a spherical Earth.
//!
//! Points are longitude/latitude pairs in degrees. Every function here is
//! total: degenerate or malformed input yields zero, never an error.

use gisview_core::types::{LonLat, MapCoord, Projection};
use geojson::{Geometry, LineStringType, Position, Value as GeoValue};
use serde_json::Value;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points using the haversine formula.
///
/// # Examples
///
/// ```
/// use gisview_core::types::LonLat;
/// use gisview_measure::geodesic::haversine_distance;
///
/// let d = haversine_distance(LonLat::new(0.0, 0.0), LonLat::new(1.0, 0.0));
/// assert!((d - 111_195.0).abs() < 1.0);
/// ```
pub fn haversine_distance(a: LonLat, b: LonLat) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Total length of the polyline through `points`, in meters.
pub fn path_length(points: &[LonLat]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance(pair[0], pair[1]))
        .sum()
}

/// Area enclosed by a ring, in square meters.
///
/// The ring is closed implicitly (last vertex to first); an explicitly
/// repeated closing vertex contributes a zero-length edge. Fewer than three
/// points enclose nothing.
pub fn ring_area(points: &[LonLat]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let total: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p1, p2)| {
            let lat1 = p1.lat.to_radians();
            let lat2 = p2.lat.to_radians();
            (p2.lon - p1.lon).to_radians() * (2.0 + lat1.sin() + lat2.sin())
        })
        .sum();

    (total * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
}

/// Length of a line drawn in map coordinates of `projection`.
pub fn line_length_projected(coords: &[MapCoord], projection: Projection) -> f64 {
    let points: Vec<LonLat> = coords.iter().map(|c| projection.unproject(*c)).collect();
    path_length(&points)
}

/// Area of a polygon ring drawn in map coordinates of `projection`.
pub fn polygon_area_projected(coords: &[MapCoord], projection: Projection) -> f64 {
    let points: Vec<LonLat> = coords.iter().map(|c| projection.unproject(*c)).collect();
    ring_area(&points)
}

/// Reads a coordinate collection: either a bare GeoJSON `coordinates`
/// array of a line or ring, or a whole GeoJSON geometry object.
///
/// The whole collection is rejected (an empty vector is returned) when it is
/// empty, is not a line-like geometry, or holds any position without two
/// finite numbers.
pub fn points_from_json(value: &Value) -> Vec<LonLat> {
    if value.is_object() {
        return match Geometry::from_json_value(value.clone()) {
            Ok(geometry) => points_from_geometry(&geometry),
            Err(_) => Vec::new(),
        };
    }

    match serde_json::from_value::<LineStringType>(value.clone()) {
        Ok(positions) => points_from_positions(&positions),
        Err(_) => Vec::new(),
    }
}

/// Vertices of a line-like geometry; a polygon yields its exterior ring.
pub fn points_from_geometry(geometry: &Geometry) -> Vec<LonLat> {
    match &geometry.value {
        GeoValue::LineString(positions) | GeoValue::MultiPoint(positions) => {
            points_from_positions(positions)
        }
        GeoValue::Polygon(rings) => rings
            .first()
            .map(|ring| points_from_positions(ring))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn points_from_positions(positions: &[Position]) -> Vec<LonLat> {
    let mut points = Vec::with_capacity(positions.len());
    for position in positions {
        match position.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => {
                points.push(LonLat::new(*lon, *lat))
            }
            _ => return Vec::new(),
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EQUATOR_DEGREE_M: f64 = 111_194.926_644_558_73;

    fn square(lon0: f64, lat0: f64, side_deg: f64) -> Vec<LonLat> {
        vec![
            LonLat::new(lon0, lat0),
            LonLat::new(lon0 + side_deg, lat0),
            LonLat::new(lon0 + side_deg, lat0 + side_deg),
            LonLat::new(lon0, lat0 + side_deg),
        ]
    }

    #[test]
    fn test_same_point_is_zero() {
        let p = LonLat::new(37.6173, 55.7558);
        assert_eq!(haversine_distance(p, p), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = LonLat::new(37.6173, 55.7558);
        let b = LonLat::new(30.3158, 59.9391);
        assert_eq!(haversine_distance(a, b), haversine_distance(b, a));
    }

    #[test]
    fn test_one_degree_along_equator() {
        let d = haversine_distance(LonLat::new(0.0, 0.0), LonLat::new(1.0, 0.0));
        assert!((d - EQUATOR_DEGREE_M).abs() < 1e-6);
        assert!((d - 111_195.0).abs() < 1.0);
    }

    #[test]
    fn test_one_degree_along_meridian() {
        let d = haversine_distance(LonLat::new(10.0, 45.0), LonLat::new(10.0, 46.0));
        assert!((d - EQUATOR_DEGREE_M).abs() < 1e-6);
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = haversine_distance(LonLat::new(0.0, 0.0), LonLat::new(180.0, 0.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1e-6);
    }

    #[test]
    fn test_path_length_additive() {
        let a = LonLat::new(37.0, 55.0);
        let b = LonLat::new(37.5, 55.2);
        let c = LonLat::new(38.1, 55.1);
        let whole = path_length(&[a, b, c]);
        let parts = haversine_distance(a, b) + haversine_distance(b, c);
        assert!((whole - parts).abs() < 1e-9);
    }

    #[test]
    fn test_path_length_degenerate() {
        assert_eq!(path_length(&[]), 0.0);
        assert_eq!(path_length(&[LonLat::new(1.0, 2.0)]), 0.0);
    }

    #[test]
    fn test_ring_area_too_few_points() {
        assert_eq!(ring_area(&[]), 0.0);
        assert_eq!(ring_area(&[LonLat::new(0.0, 0.0)]), 0.0);
        assert_eq!(ring_area(&[LonLat::new(0.0, 0.0), LonLat::new(1.0, 1.0)]), 0.0);
    }

    #[test]
    fn test_ring_area_rotation_invariant() {
        let ring = square(37.0, 55.0, 0.1);
        let area = ring_area(&ring);
        for shift in 1..ring.len() {
            let mut rotated = ring.clone();
            rotated.rotate_left(shift);
            assert!((ring_area(&rotated) - area).abs() < 1e-6 * area);
        }
    }

    #[test]
    fn test_ring_area_winding_invariant() {
        let ring = square(37.0, 55.0, 0.1);
        let mut reversed = ring.clone();
        reversed.reverse();
        assert!((ring_area(&ring) - ring_area(&reversed)).abs() < 1e-6);
    }

    #[test]
    fn test_small_equatorial_square_close_to_planar() {
        let side_deg = 0.01;
        let side_m = EQUATOR_DEGREE_M * side_deg;
        let area = ring_area(&square(0.0, 0.0, side_deg));
        let planar = side_m * side_m;
        assert!(((area - planar) / planar).abs() < 0.02);
    }

    #[test]
    fn test_explicit_closing_vertex_does_not_change_area() {
        let mut ring = square(20.0, 10.0, 0.5);
        let open = ring_area(&ring);
        ring.push(ring[0]);
        assert!((ring_area(&ring) - open).abs() < 1e-6);
    }

    #[test]
    fn test_projected_helpers_match_geographic() {
        let points = vec![LonLat::new(37.0, 55.0), LonLat::new(37.5, 55.2), LonLat::new(37.2, 55.6)];
        let coords: Vec<MapCoord> = points
            .iter()
            .map(|p| Projection::WebMercator.project(*p))
            .collect();

        let length = line_length_projected(&coords, Projection::WebMercator);
        assert!((length - path_length(&points)).abs() < 1e-3);

        let area = polygon_area_projected(&coords, Projection::WebMercator);
        assert!((area - ring_area(&points)).abs() < 1.0);
    }

    #[test]
    fn test_points_from_json() {
        let value = json!([[37.0, 55.0], [37.5, 55.2, 120.0]]);
        let points = points_from_json(&value);
        assert_eq!(points, vec![LonLat::new(37.0, 55.0), LonLat::new(37.5, 55.2)]);
    }

    #[test]
    fn test_points_from_json_malformed_is_empty() {
        assert!(points_from_json(&json!({"type": "LineString"})).is_empty());
        assert!(points_from_json(&json!([])).is_empty());
        assert!(points_from_json(&json!([[1.0, 2.0], [3.0]])).is_empty());
        assert!(points_from_json(&json!([[1.0, 2.0], ["a", "b"]])).is_empty());
        assert!(points_from_json(&json!("1,2")).is_empty());
        assert_eq!(path_length(&points_from_json(&json!(null))), 0.0);
    }

    #[test]
    fn test_points_from_geometry_object() {
        let line = json!({"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 0.0]]});
        let points = points_from_json(&line);
        assert!((path_length(&points) - EQUATOR_DEGREE_M).abs() < 1e-6);

        let polygon = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        });
        assert_eq!(points_from_json(&polygon).len(), 4);

        let point = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        assert!(points_from_json(&point).is_empty());
    }
}
