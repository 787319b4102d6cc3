// src/models/feature.rs

use serde::Serialize;

/// Number of numeric attributes carried by every crash record.
pub const FEATURE_COUNT: usize = 6;

/// The numeric columns the analysis operates on, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Feature {
    Severity,
    Temperature,
    Humidity,
    Visibility,
    WindSpeed,
    Precipitation,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Severity,
        Feature::Temperature,
        Feature::Humidity,
        Feature::Visibility,
        Feature::WindSpeed,
        Feature::Precipitation,
    ];

    /// Column header used in the source CSV and in every serialized output.
    pub fn column_name(self) -> &'static str {
        match self {
            Feature::Severity => "Severity",
            Feature::Temperature => "Temperature(F)",
            Feature::Humidity => "Humidity(%)",
            Feature::Visibility => "Visibility(mi)",
            Feature::WindSpeed => "Wind_Speed(mph)",
            Feature::Precipitation => "Precipitation(in)",
        }
    }

    /// Position of this feature in a `[f64; FEATURE_COUNT]` row.
    pub fn index(self) -> usize {
        match self {
            Feature::Severity => 0,
            Feature::Temperature => 1,
            Feature::Humidity => 2,
            Feature::Visibility => 3,
            Feature::WindSpeed => 4,
            Feature::Precipitation => 5,
        }
    }

    pub fn column_names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.column_name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_column_order() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
    }

    #[test]
    fn test_column_names() {
        assert_eq!(
            Feature::column_names(),
            vec![
                "Severity",
                "Temperature(F)",
                "Humidity(%)",
                "Visibility(mi)",
                "Wind_Speed(mph)",
                "Precipitation(in)"
            ]
        );
    }
}
