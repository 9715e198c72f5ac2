//! Response serializers.
//!
//! # Responsibilities
//! - Parse the `format` query parameter (case-insensitive, text fallback)
//! - Validate JSONP callback names
//! - Render the identity-only formats and the two full reports
//!
//! # Design Decisions
//! - Serializers are pure: they only read the identity or a finished
//!   [`ResultRecord`], never trigger lookups
//! - `full-json` keeps a fixed key order and emits coordinates as numbers,
//!   or `"N/A"` when the provider had none

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::detection::ProxyVpnVerdict;
use crate::geo::record::{coordinate_text, SENTINEL};
use crate::http::error::ApiError;
use crate::lookup::ResultRecord;
use crate::security::ClientIdentity;

const TEXT_PLAIN: &str = "text/plain; charset=UTF-8";
const APPLICATION_JSON: &str = "application/json";
const APPLICATION_JAVASCRIPT: &str = "application/javascript";
const APPLICATION_XML: &str = "application/xml";
const TEXT_CSV: &str = "text/csv";
const TEXT_HTML: &str = "text/html; charset=UTF-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Jsonp,
    Xml,
    Csv,
    Html,
    Full,
    FullJson,
}

impl OutputFormat {
    /// Unknown or missing values fall back to [`OutputFormat::Text`].
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return OutputFormat::Text;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "jsonp" => OutputFormat::Jsonp,
            "xml" => OutputFormat::Xml,
            "csv" => OutputFormat::Csv,
            "html" => OutputFormat::Html,
            "full" => OutputFormat::Full,
            "full-json" => OutputFormat::FullJson,
            _ => OutputFormat::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Jsonp => "jsonp",
            OutputFormat::Xml => "xml",
            OutputFormat::Csv => "csv",
            OutputFormat::Html => "html",
            OutputFormat::Full => "full",
            OutputFormat::FullJson => "full-json",
        }
    }

    /// Formats that need geolocation and detection.
    pub fn needs_lookup(self) -> bool {
        matches!(self, OutputFormat::Full | OutputFormat::FullJson)
    }
}

/// `^[a-zA-Z_][a-zA-Z0-9_.]*$`
pub fn is_valid_callback(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn with_content_type(body: String, content_type: &'static str) -> Response {
    ([(header::CONTENT_TYPE, HeaderValue::from_static(content_type))], body).into_response()
}

fn ip_json(identity: &ClientIdentity) -> String {
    serde_json::json!({ "ip": identity.to_string() }).to_string()
}

/// Render one of the identity-only formats. The full formats are rendered
/// by [`render_full`] once the lookup has run.
pub fn render_identity(
    format: OutputFormat,
    identity: &ClientIdentity,
    callback: Option<&str>,
) -> Result<Response, ApiError> {
    let response = match format {
        OutputFormat::Json => with_content_type(ip_json(identity), APPLICATION_JSON),
        OutputFormat::Jsonp => {
            let callback = callback
                .filter(|cb| is_valid_callback(cb))
                .ok_or(ApiError::InvalidCallback)?;
            with_content_type(
                format!("{}({});", callback, ip_json(identity)),
                APPLICATION_JAVASCRIPT,
            )
        }
        OutputFormat::Xml => with_content_type(
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><response><ip>{}</ip></response>",
                identity
            ),
            APPLICATION_XML,
        ),
        OutputFormat::Csv => with_content_type(format!("ip\n{}", identity), TEXT_CSV),
        OutputFormat::Html => with_content_type(html_page(identity), TEXT_HTML),
        OutputFormat::Text | OutputFormat::Full | OutputFormat::FullJson => {
            with_content_type(format!("{}\n", identity), TEXT_PLAIN)
        }
    };
    Ok(response)
}

fn html_page(identity: &ClientIdentity) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<title>Your IP Address</title>\n</head>\n<body>\n<p>Your IP Address: {}</p>\n</body>\n</html>\n",
        identity
    )
}

pub fn render_full(format: OutputFormat, result: &ResultRecord) -> Response {
    match format {
        OutputFormat::FullJson => with_content_type(full_json_body(result), APPLICATION_JSON),
        _ => with_content_type(full_text_body(result), TEXT_PLAIN),
    }
}

pub fn full_text_body(result: &ResultRecord) -> String {
    let geo = &result.geo;
    format!(
        "IP Address: {}\nCountry: {}\nRegion: {}\nCity: {}\nLatitude: {}\nLongitude: {}\nISP: {}\nProxy/VPN Status: {}",
        result.identity,
        geo.country_or_sentinel(),
        geo.region_or_sentinel(),
        geo.city_or_sentinel(),
        coordinate_text(geo.latitude),
        coordinate_text(geo.longitude),
        geo.isp_or_sentinel(),
        result.verdict.description(),
    )
}

#[derive(Serialize)]
#[serde(untagged)]
enum Coordinate {
    Value(f64),
    Missing(&'static str),
}

impl From<Option<f64>> for Coordinate {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Coordinate::Value(v),
            _ => Coordinate::Missing(SENTINEL),
        }
    }
}

/// Field order here is the order on the wire.
#[derive(Serialize)]
struct FullReport<'a> {
    ip: String,
    country: &'a str,
    region: &'a str,
    city: &'a str,
    latitude: Coordinate,
    longitude: Coordinate,
    isp: &'a str,
    proxy_vpn_status: ProxyVpnVerdict,
}

pub fn full_json_body(result: &ResultRecord) -> String {
    let geo = &result.geo;
    let report = FullReport {
        ip: result.identity.to_string(),
        country: geo.country_or_sentinel(),
        region: geo.region_or_sentinel(),
        city: geo.city_or_sentinel(),
        latitude: geo.latitude.into(),
        longitude: geo.longitude.into(),
        isp: geo.isp_or_sentinel(),
        proxy_vpn_status: result.verdict,
    };
    // Plain strings, finite floats and a unit enum cannot fail to serialize.
    serde_json::to_string(&report).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoRecord;
    use crate::lookup::compose;

    fn identity() -> ClientIdentity {
        ClientIdentity::new("203.0.113.9".parse().unwrap())
    }

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::parse(None), OutputFormat::Text);
        assert_eq!(OutputFormat::parse(Some("JSON")), OutputFormat::Json);
        assert_eq!(OutputFormat::parse(Some("Full-Json")), OutputFormat::FullJson);
        assert_eq!(OutputFormat::parse(Some("yaml")), OutputFormat::Text);
        assert!(OutputFormat::FullJson.needs_lookup());
        assert!(!OutputFormat::Jsonp.needs_lookup());
    }

    #[test]
    fn test_callback_syntax() {
        assert!(is_valid_callback("cb"));
        assert!(is_valid_callback("_jQuery123.handle_0"));
        assert!(!is_valid_callback(""));
        assert!(!is_valid_callback("1cb"));
        assert!(!is_valid_callback(".cb"));
        assert!(!is_valid_callback("bad!name"));
        assert!(!is_valid_callback("alert(1)"));
    }

    #[tokio::test]
    async fn test_identity_formats() {
        let id = identity();
        let render = |format| render_identity(format, &id, Some("cb")).unwrap();

        assert_eq!(body_of(render(OutputFormat::Text)).await, "203.0.113.9\n");
        assert_eq!(body_of(render(OutputFormat::Json)).await, r#"{"ip":"203.0.113.9"}"#);
        assert_eq!(body_of(render(OutputFormat::Jsonp)).await, r#"cb({"ip":"203.0.113.9"});"#);
        assert_eq!(body_of(render(OutputFormat::Csv)).await, "ip\n203.0.113.9");
        assert!(body_of(render(OutputFormat::Xml))
            .await
            .ends_with("<response><ip>203.0.113.9</ip></response>"));
        assert!(body_of(render(OutputFormat::Html))
            .await
            .contains("Your IP Address: 203.0.113.9"));

        let json = render(OutputFormat::Json);
        assert_eq!(json.headers()[header::CONTENT_TYPE], APPLICATION_JSON);
    }

    #[test]
    fn test_jsonp_requires_valid_callback() {
        let id = identity();
        assert!(matches!(
            render_identity(OutputFormat::Jsonp, &id, None),
            Err(ApiError::InvalidCallback)
        ));
        assert!(matches!(
            render_identity(OutputFormat::Jsonp, &id, Some("bad!name")),
            Err(ApiError::InvalidCallback)
        ));
    }

    #[test]
    fn test_full_json_key_order_and_numbers() {
        let geo = GeoRecord {
            country: Some("Testland".into()),
            region: Some("T1".into()),
            city: Some("Testville".into()),
            latitude: Some(1.0),
            longitude: Some(2.0),
            isp: Some("TestISP".into()),
            error: None,
        };
        let result = compose(identity(), geo, ProxyVpnVerdict::None);
        assert_eq!(
            full_json_body(&result),
            r#"{"ip":"203.0.113.9","country":"Testland","region":"T1","city":"Testville","latitude":1.0,"longitude":2.0,"isp":"TestISP","proxy_vpn_status":"none"}"#
        );
    }

    #[test]
    fn test_full_json_sentinels() {
        let result = compose(identity(), GeoRecord::unavailable(), ProxyVpnVerdict::DetectionFailed);
        assert_eq!(
            full_json_body(&result),
            r#"{"ip":"203.0.113.9","country":"N/A","region":"N/A","city":"N/A","latitude":"N/A","longitude":"N/A","isp":"N/A","proxy_vpn_status":"detection_failed"}"#
        );
    }

    #[test]
    fn test_full_text_report() {
        let geo = GeoRecord {
            country: Some("Testland".into()),
            latitude: Some(52.5),
            ..GeoRecord::default()
        };
        let text = full_text_body(&compose(identity(), geo, ProxyVpnVerdict::ProxyResidential));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "IP Address: 203.0.113.9");
        assert_eq!(lines[1], "Country: Testland");
        assert_eq!(lines[2], "Region: N/A");
        assert_eq!(lines[4], "Latitude: 52.5");
        assert_eq!(lines[5], "Longitude: N/A");
        assert_eq!(lines[7], "Proxy/VPN Status: Proxy or VPN detected (residential proxy).");
        assert_eq!(lines.len(), 8);
        assert!(!text.ends_with('\n'));
    }
}
