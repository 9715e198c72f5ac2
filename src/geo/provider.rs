//! Geolocation providers and their payload mappings.

use serde_json::Value;
use thiserror::Error;

use crate::config::{ProviderConfig, ProviderKind};
use crate::geo::record::GeoRecord;
use crate::security::ClientIdentity;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Parsed, but no usable `country` field (e.g. `{"status":"fail"}`).
    #[error("payload has no country field")]
    MissingCountry,
}

/// One entry of the fixed-priority provider chain.
#[derive(Debug, Clone)]
pub struct GeoProvider {
    pub name: String,
    pub kind: ProviderKind,
    url_template: String,
    token: Option<String>,
}

impl GeoProvider {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.clone(),
            kind: config.kind,
            url_template: config.url.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        }
    }

    /// Request URL for `identity`, or `None` when the template needs a
    /// token that is not configured.
    pub fn url_for(&self, identity: &ClientIdentity) -> Option<String> {
        let url = self.url_template.replace("{ip}", &identity.to_string());
        if url.contains("{token}") {
            let token = self.token.as_deref()?;
            return Some(url.replace("{token}", token));
        }
        Some(url)
    }

    pub fn parse(&self, body: &[u8]) -> Result<GeoRecord, ParseError> {
        parse_payload(self.kind, body)
    }
}

/// Map a provider payload onto a [`GeoRecord`]. Success requires a
/// non-empty string `country`.
pub fn parse_payload(kind: ProviderKind, body: &[u8]) -> Result<GeoRecord, ParseError> {
    let json: Value = serde_json::from_slice(body)?;

    let country = text(&json["country"]).ok_or(ParseError::MissingCountry)?;

    let record = match kind {
        ProviderKind::IpApi => GeoRecord {
            country: Some(country),
            region: text(&json["regionName"]),
            city: text(&json["city"]),
            latitude: number(&json["lat"]),
            longitude: number(&json["lon"]),
            isp: text(&json["isp"]),
            error: None,
        },
        ProviderKind::IpWhois => GeoRecord {
            country: Some(country),
            region: text(&json["region"]),
            city: text(&json["city"]),
            latitude: number(&json["latitude"]),
            longitude: number(&json["longitude"]),
            isp: text(&json["isp"]),
            error: None,
        },
        ProviderKind::IpInfo => {
            // "loc": "37.3860,-122.0838"
            let (latitude, longitude) = json["loc"]
                .as_str()
                .and_then(|loc| loc.split_once(','))
                .map(|(lat, lon)| (lat.trim().parse().ok(), lon.trim().parse().ok()))
                .unwrap_or((None, None));
            GeoRecord {
                country: Some(country),
                region: text(&json["region"]),
                city: text(&json["city"]),
                latitude,
                longitude,
                isp: text(&json["org"]),
                error: None,
            }
        }
    };
    Ok(record)
}

fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ClientIdentity {
        ClientIdentity::new("8.8.8.8".parse().unwrap())
    }

    #[test]
    fn test_ip_api_payload() {
        let body = br#"{"status":"success","country":"Testland","regionName":"T1","city":"Testville","lat":1.0,"lon":2.0,"isp":"TestISP"}"#;
        let record = parse_payload(ProviderKind::IpApi, body).unwrap();
        assert_eq!(
            record,
            GeoRecord {
                country: Some("Testland".into()),
                region: Some("T1".into()),
                city: Some("Testville".into()),
                latitude: Some(1.0),
                longitude: Some(2.0),
                isp: Some("TestISP".into()),
                error: None,
            }
        );
    }

    #[test]
    fn test_ip_api_failure_status() {
        let body = br#"{"status":"fail","message":"private range"}"#;
        assert!(matches!(
            parse_payload(ProviderKind::IpApi, body),
            Err(ParseError::MissingCountry)
        ));
    }

    #[test]
    fn test_ipwhois_string_coordinates() {
        let body = br#"{"success":true,"country":"Germany","region":"Berlin","city":"Berlin","latitude":"52.52","longitude":13.405,"isp":"Example GmbH"}"#;
        let record = parse_payload(ProviderKind::IpWhois, body).unwrap();
        assert_eq!(record.region.as_deref(), Some("Berlin"));
        assert_eq!(record.latitude, Some(52.52));
        assert_eq!(record.longitude, Some(13.405));
    }

    #[test]
    fn test_ipinfo_loc_and_org() {
        let body = br#"{"ip":"8.8.8.8","country":"US","region":"California","city":"Mountain View","loc":"37.4056,-122.0775","org":"AS15169 Google LLC"}"#;
        let record = parse_payload(ProviderKind::IpInfo, body).unwrap();
        assert_eq!(record.latitude, Some(37.4056));
        assert_eq!(record.longitude, Some(-122.0775));
        assert_eq!(record.isp.as_deref(), Some("AS15169 Google LLC"));
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let record = parse_payload(ProviderKind::IpApi, br#"{"country":"X"}"#).unwrap();
        assert_eq!(record.city, None);
        assert_eq!(record.latitude, None);
    }

    #[test]
    fn test_malformed_and_empty_country() {
        assert!(matches!(
            parse_payload(ProviderKind::IpApi, b"<html>"),
            Err(ParseError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_payload(ProviderKind::IpApi, br#"{"country":""}"#),
            Err(ParseError::MissingCountry)
        ));
    }

    #[test]
    fn test_url_templates() {
        let keyed = GeoProvider::from_config(&ProviderConfig {
            name: "ipinfo".into(),
            kind: ProviderKind::IpInfo,
            url: "https://ipinfo.io/{ip}/json?token={token}".into(),
            token: None,
        });
        assert_eq!(keyed.url_for(&identity()), None);

        let keyed = GeoProvider::from_config(&ProviderConfig {
            token: Some("abc".into()),
            ..ProviderConfig {
                name: "ipinfo".into(),
                kind: ProviderKind::IpInfo,
                url: "https://ipinfo.io/{ip}/json?token={token}".into(),
                token: None,
            }
        });
        assert_eq!(
            keyed.url_for(&identity()).as_deref(),
            Some("https://ipinfo.io/8.8.8.8/json?token=abc")
        );
    }
}
