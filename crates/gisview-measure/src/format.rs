//! Human-readable labels for measurement results.

use gisview_core::config::MeasurementOptions;
use gisview_core::units::Language;

/// Formats a length in meters, e.g. `1.23 км`.
pub fn format_length(meters: f64, options: &MeasurementOptions) -> String {
    let value = options.distance_unit.from_meters(meters);
    format!(
        "{:.*} {}",
        options.precision,
        value,
        options.distance_unit.label(options.language)
    )
}

/// Formats an area in square meters, e.g. `4.50 га`.
pub fn format_area(square_meters: f64, options: &MeasurementOptions) -> String {
    let value = options.area_unit.from_square_meters(square_meters);
    format!(
        "{:.*} {}",
        options.precision,
        value,
        options.area_unit.label(options.language)
    )
}

/// Hint shown next to the pointer while drawing.
pub fn help_text(polygon: bool, language: Language) -> &'static str {
    match (polygon, language) {
        (true, Language::Ru) => "Кликните для добавления вершины полигона",
        (false, Language::Ru) => "Кликните для добавления точки",
        (true, Language::En) => "Click to add a polygon vertex",
        (false, Language::En) => "Click to add a point",
    }
}
