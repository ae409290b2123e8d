//! IP geolocation lookups against a hosted geolocation API.
//!
//! One request per lookup with a short timeout; failures are reported to
//! the caller, which records the check-in without a location.

use serde::{Deserialize, Deserializer};
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

use shared_types::GeoPoint;

const REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Address is not publicly routable: {0}")]
    UnroutableAddress(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Response had no usable coordinates")]
    MissingCoordinates,
}

/// Location resolved for an IP address.
#[derive(Debug, Clone, PartialEq)]
pub struct IpLocation {
    pub point: GeoPoint,
    pub city: Option<String>,
    pub region: Option<String>,
}

/// Raw API payload. Providers disagree on names and on whether coordinates
/// are numbers or strings, so both are accepted.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default, alias = "lat", deserialize_with = "lenient_f64")]
    latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "lng", deserialize_with = "lenient_f64")]
    longitude: Option<f64>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default, alias = "state_prov", alias = "region_name", alias = "regionName")]
    region: Option<String>,
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(f64),
        Str(String),
    }

    Ok(match Option::<NumOrString>::deserialize(deserializer)? {
        Some(NumOrString::Num(n)) => Some(n),
        Some(NumOrString::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn parse_lookup(body: &str) -> Result<IpLocation, GeoError> {
    let raw: LookupResponse =
        serde_json::from_str(body).map_err(|e| GeoError::Parse(e.to_string()))?;
    let (Some(lat), Some(lng)) = (raw.latitude, raw.longitude) else {
        return Err(GeoError::MissingCoordinates);
    };
    let point = GeoPoint::new(lat, lng).map_err(|_| GeoError::MissingCoordinates)?;
    Ok(IpLocation {
        point,
        city: raw.city.filter(|c| !c.is_empty()),
        region: raw.region.filter(|r| !r.is_empty()),
    })
}

/// Reject addresses a public geolocation service cannot resolve.
fn routable(ip: &str) -> Result<IpAddr, GeoError> {
    let addr: IpAddr = ip
        .parse()
        .map_err(|_| GeoError::UnroutableAddress(ip.to_string()))?;
    let private = match addr {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    };
    if private {
        return Err(GeoError::UnroutableAddress(ip.to_string()));
    }
    Ok(addr)
}

/// Client for the geolocation API configured by `GEOLOCATION_API_URL`
/// and `GEOLOCATION_API_KEY`.
#[derive(Clone)]
pub struct GeoLocator {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeoLocator {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, GeoError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GeoError::Network(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// `None` when either variable is missing.
    pub fn from_env() -> Option<Self> {
        let url = crate::config::env_non_empty("GEOLOCATION_API_URL")?;
        let key = crate::config::env_non_empty("GEOLOCATION_API_KEY")?;
        match Self::new(url, key) {
            Ok(locator) => Some(locator),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build geolocation client");
                None
            }
        }
    }

    /// Resolve an IP address to coordinates. Single attempt, no retry.
    pub async fn lookup_ip(&self, ip: &str) -> Result<IpLocation, GeoError> {
        let addr = routable(ip)?;

        tracing::debug!(ip = %addr, "Querying geolocation API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("apiKey", self.api_key.as_str()), ("ip", &addr.to_string())])
            .send()
            .await
            .map_err(|e| GeoError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeoError::Api(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeoError::Network(e.to_string()))?;
        let location = parse_lookup(&body)?;

        tracing::info!(
            ip = %addr,
            city = location.city.as_deref().unwrap_or("unknown"),
            "Resolved IP location"
        );
        Ok(location)
    }
}

/// A local stand-in for the geolocation API, answering `/ipgeo` with
/// string coordinates for two known addresses.
#[cfg(test)]
pub(crate) async fn stub_api(api_key: &'static str) -> String {
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::collections::HashMap;

    let app = axum::Router::new().route(
        "/ipgeo",
        axum::routing::get(move |Query(q): Query<HashMap<String, String>>| async move {
            if q.get("apiKey").map(String::as_str) != Some(api_key) {
                return (StatusCode::UNAUTHORIZED, "invalid key").into_response();
            }
            let body = match q.get("ip").map(String::as_str) {
                Some("8.8.8.8") => serde_json::json!({
                    "ip": "8.8.8.8",
                    "latitude": "39.73915",
                    "longitude": "-104.98470",
                    "city": "Denver",
                    "state_prov": "Colorado",
                }),
                Some("1.1.1.1") => serde_json::json!({
                    "ip": "1.1.1.1",
                    "latitude": "29.76328",
                    "longitude": "-95.36327",
                    "city": "Houston",
                    "state_prov": "Texas",
                }),
                _ => return (StatusCode::NOT_FOUND, "unknown address").into_response(),
            };
            axum::Json(body).into_response()
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/ipgeo")
}
