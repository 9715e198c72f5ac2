//! Proxy/VPN classification.

use serde::Serialize;

/// Outcome of one detection call. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyVpnVerdict {
    None,
    ProxyResidential,
    ProxyDatacenter,
    Unknown,
    DetectionFailed,
}

impl ProxyVpnVerdict {
    /// Map the provider's `block` code.
    pub fn from_block_code(code: i64) -> Self {
        match code {
            0 => ProxyVpnVerdict::None,
            1 => ProxyVpnVerdict::ProxyResidential,
            2 => ProxyVpnVerdict::ProxyDatacenter,
            _ => ProxyVpnVerdict::Unknown,
        }
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyVpnVerdict::None => "none",
            ProxyVpnVerdict::ProxyResidential => "proxy_residential",
            ProxyVpnVerdict::ProxyDatacenter => "proxy_datacenter",
            ProxyVpnVerdict::Unknown => "unknown",
            ProxyVpnVerdict::DetectionFailed => "detection_failed",
        }
    }

    /// Sentence used by the plain-text full report.
    pub fn description(self) -> &'static str {
        match self {
            ProxyVpnVerdict::None => "No proxy or VPN detected.",
            ProxyVpnVerdict::ProxyResidential => "Proxy or VPN detected (residential proxy).",
            ProxyVpnVerdict::ProxyDatacenter => {
                "Proxy or VPN detected (non-residential proxy, hosting provider, or data center)."
            }
            ProxyVpnVerdict::Unknown => "Unknown proxy/VPN status.",
            ProxyVpnVerdict::DetectionFailed => "Proxy/VPN detection failed.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_codes() {
        assert_eq!(ProxyVpnVerdict::from_block_code(0), ProxyVpnVerdict::None);
        assert_eq!(ProxyVpnVerdict::from_block_code(1), ProxyVpnVerdict::ProxyResidential);
        assert_eq!(ProxyVpnVerdict::from_block_code(2), ProxyVpnVerdict::ProxyDatacenter);
        assert_eq!(ProxyVpnVerdict::from_block_code(99), ProxyVpnVerdict::Unknown);
        assert_eq!(ProxyVpnVerdict::from_block_code(-1), ProxyVpnVerdict::Unknown);
    }

    #[test]
    fn test_serde_matches_as_str() {
        for verdict in [
            ProxyVpnVerdict::None,
            ProxyVpnVerdict::ProxyResidential,
            ProxyVpnVerdict::ProxyDatacenter,
            ProxyVpnVerdict::Unknown,
            ProxyVpnVerdict::DetectionFailed,
        ] {
            let json = serde_json::to_string(&verdict).unwrap();
            assert_eq!(json, format!("\"{}\"", verdict.as_str()));
        }
    }
}
