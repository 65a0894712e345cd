//! Units of length and area used to present measurement results.

use serde::{Deserialize, Serialize};

/// Meters in one international mile as used by the measurement labels.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Language of unit labels and measurement hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

/// Unit in which distances are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceUnit {
    Meters,
    #[default]
    Kilometers,
    Miles,
}

impl DistanceUnit {
    /// Number of meters in one of this unit.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            DistanceUnit::Meters => 1.0,
            DistanceUnit::Kilometers => 1000.0,
            DistanceUnit::Miles => METERS_PER_MILE,
        }
    }

    /// Converts a length in meters into this unit.
    pub fn from_meters(&self, meters: f64) -> f64 {
        meters / self.meters_per_unit()
    }

    /// Converts a length in this unit back into meters.
    pub fn to_meters(&self, value: f64) -> f64 {
        value * self.meters_per_unit()
    }

    /// Short label for this unit.
    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (DistanceUnit::Meters, Language::Ru) => "м",
            (DistanceUnit::Kilometers, Language::Ru) => "км",
            (DistanceUnit::Miles, Language::Ru) => "миль",
            (DistanceUnit::Meters, Language::En) => "m",
            (DistanceUnit::Kilometers, Language::En) => "km",
            (DistanceUnit::Miles, Language::En) => "mi",
        }
    }
}

/// Unit in which areas are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AreaUnit {
    SquareMeters,
    #[default]
    Hectares,
    SquareKilometers,
}

impl AreaUnit {
    /// Number of square meters in one of this unit.
    pub fn square_meters_per_unit(&self) -> f64 {
        match self {
            AreaUnit::SquareMeters => 1.0,
            AreaUnit::Hectares => 10_000.0,
            AreaUnit::SquareKilometers => 1_000_000.0,
        }
    }

    /// Converts an area in square meters into this unit.
    pub fn from_square_meters(&self, square_meters: f64) -> f64 {
        square_meters / self.square_meters_per_unit()
    }

    /// Converts an area in this unit back into square meters.
    pub fn to_square_meters(&self, value: f64) -> f64 {
        value * self.square_meters_per_unit()
    }

    /// Short label for this unit.
    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (AreaUnit::SquareMeters, Language::Ru) => "м²",
            (AreaUnit::Hectares, Language::Ru) => "га",
            (AreaUnit::SquareKilometers, Language::Ru) => "км²",
            (AreaUnit::SquareMeters, Language::En) => "m²",
            (AreaUnit::Hectares, Language::En) => "ha",
            (AreaUnit::SquareKilometers, Language::En) => "km²",
        }
    }
}
