//! Normalized geolocation record.

use serde::{Deserialize, Serialize};

/// Placeholder shown for any field a provider did not supply.
pub const SENTINEL: &str = "N/A";

/// Marker carried by the record returned when every provider failed.
pub const UNAVAILABLE: &str = "Unable to fetch geolocation data";

/// Geolocation for one address. Absent fields render as [`SENTINEL`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoRecord {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub isp: Option<String>,
    /// Set only on the total-failure record.
    pub error: Option<String>,
}

impl GeoRecord {
    /// The best-effort record used when no provider answered.
    pub fn unavailable() -> Self {
        Self {
            error: Some(UNAVAILABLE.to_string()),
            ..Self::default()
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.error.is_some()
    }

    pub fn country_or_sentinel(&self) -> &str {
        self.country.as_deref().unwrap_or(SENTINEL)
    }

    pub fn region_or_sentinel(&self) -> &str {
        self.region.as_deref().unwrap_or(SENTINEL)
    }

    pub fn city_or_sentinel(&self) -> &str {
        self.city.as_deref().unwrap_or(SENTINEL)
    }

    pub fn isp_or_sentinel(&self) -> &str {
        self.isp.as_deref().unwrap_or(SENTINEL)
    }
}

/// Render an optional coordinate for text output.
pub fn coordinate_text(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => SENTINEL.to_string(),
    }
}
