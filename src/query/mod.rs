// src/query/mod.rs

//! Read-only client for the backend analysis service.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RuntimeConfig;

pub mod analysis;
pub mod buildings;
pub mod error;
pub mod weather;

pub use analysis::{AccessibilityResponse, BufferResponse, Isochrone, ViewshedResponse, VisibleArea};
pub use buildings::{BuildingSearch, placeholder_buildings};
pub use error::QueryError;
pub use weather::WeatherReport;

pub const BUILDING_SEARCH_PATH: &str = "/api/v1/buildings/search";
pub const BUFFER_PATH: &str = "/api/v1/spatial/buffer";
pub const VIEWSHED_PATH: &str = "/api/v1/spatial/viewshed";
pub const ACCESSIBILITY_PATH: &str = "/api/v1/spatial/accessibility";
pub const WEATHER_PATH: &str = "/api/v1/weather/current";

/// A decoded response together with the raw JSON it came from.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub summary: T,
    pub raw: Value,
}

pub struct QueryClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl QueryClient {
    pub fn new(config: &RuntimeConfig) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(QueryError::Client)?;

        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues a GET with query-string parameters and decodes the JSON body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response<T>, QueryError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("🌐 GET {} {:?}", url, query);

        let mut request = self.http.get(&url).query(query);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| QueryError::Transport {
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| QueryError::Transport {
            path: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|json| json.get("detail").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| body.trim().chars().take(200).collect());
            warn!("⚠️ {} answered {}: {}", path, status, detail);
            return Err(QueryError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                detail,
            });
        }

        let decode = |source| QueryError::Decode {
            path: path.to_string(),
            source,
        };
        let raw: Value = serde_json::from_str(&body).map_err(decode)?;
        let summary = serde_json::from_value(raw.clone()).map_err(decode)?;
        Ok(Response { summary, raw })
    }
}

/// Appends `name=value` when the value is present.
pub(crate) fn push_opt<T: ToString>(query: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<T>) {
    if let Some(value) = value {
        query.push((name, value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let config = RuntimeConfig {
            backend_url: "http://localhost:9000/".into(),
            ..RuntimeConfig::default()
        };
        let client = QueryClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
    }

    #[test]
    fn absent_values_are_not_pushed() {
        let mut query = Vec::new();
        push_opt(&mut query, "city", Some("北京"));
        push_opt::<f64>(&mut query, "min_height", None);
        assert_eq!(query, vec![("city", "北京".to_string())]);
    }
}
