// src/config/mod.rs

use std::time::Duration;

use serde::Deserialize;

use crate::geo::GeoPoint;
use crate::protocol::ActionKind;
use crate::viewport::CameraDestination;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Fixed camera pose used by the `reset` action.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DefaultView {
    pub destination: CameraDestination,
    pub heading_deg: f64,
    pub pitch_deg: f64,
}

impl Default for DefaultView {
    fn default() -> Self {
        Self {
            destination: CameraDestination {
                point: GeoPoint::new(116.3974, 39.9093),
                height: 15_000.0,
            },
            heading_deg: 0.0,
            pitch_deg: -45.0,
        }
    }
}

/// How much of a batch may run without a human confirming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Everything runs except the types listed in `confirm_required_actions`.
    #[default]
    Auto,
    /// Everything waits for approval except the types in `auto_approve_actions`.
    Confirm,
    /// Every action waits for approval.
    Manual,
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "confirm" => Ok(Self::Confirm),
            "manual" => Ok(Self::Manual),
            other => Err(format!("expected auto, confirm or manual, got {other:?}")),
        }
    }
}

/// Per-type approval rules. Entries are action type names and may use any
/// accepted alias (`query_buildings` matches `building_query`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExecutionPolicy {
    pub mode: ExecutionMode,
    pub confirm_required_actions: Vec<String>,
    pub auto_approve_actions: Vec<String>,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Auto,
            confirm_required_actions: Vec::new(),
            auto_approve_actions: vec!["camera_flyTo".to_string()],
        }
    }
}

impl ExecutionPolicy {
    pub fn requires_approval(&self, kind: ActionKind) -> bool {
        match self.mode {
            ExecutionMode::Auto => listed(&self.confirm_required_actions, kind),
            ExecutionMode::Confirm => !listed(&self.auto_approve_actions, kind),
            ExecutionMode::Manual => true,
        }
    }
}

fn listed(types: &[String], kind: ActionKind) -> bool {
    types
        .iter()
        .any(|entry| ActionKind::from_type(entry.trim()) == Some(kind))
}

fn type_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub backend_url: String,
    #[serde(with = "duration_millis")]
    pub request_timeout: Duration,
    pub api_token: Option<String>,
    pub default_view: DefaultView,
    pub default_flight_seconds: f64,
    /// Extra wait after a weather flight lands before the effect is applied.
    #[serde(with = "duration_millis")]
    pub weather_settle_buffer: Duration,
    pub readiness_attempts: u32,
    #[serde(with = "duration_millis")]
    pub readiness_backoff: Duration,
    pub execution: ExecutionPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(10),
            api_token: None,
            default_view: DefaultView::default(),
            default_flight_seconds: 3.0,
            weather_settle_buffer: Duration::from_millis(500),
            readiness_attempts: 3,
            readiness_backoff: Duration::from_millis(100),
            execution: ExecutionPolicy::default(),
        }
    }
}

impl RuntimeConfig {
    /// Reads overrides from `MAP_AGENT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("MAP_AGENT_BACKEND_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key: "MAP_AGENT_BACKEND_URL",
                    value: url,
                    reason: "expected an http(s) URL".to_string(),
                });
            }
            config.backend_url = url;
        }

        if let Some(secs) = lookup("MAP_AGENT_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_value("MAP_AGENT_TIMEOUT_SECS", &secs)?);
        }

        if let Some(token) = lookup("MAP_AGENT_API_TOKEN") {
            let token = token.trim().to_string();
            config.api_token = (!token.is_empty()).then_some(token);
        }

        if let Some(ms) = lookup("MAP_AGENT_WEATHER_BUFFER_MS") {
            config.weather_settle_buffer =
                Duration::from_millis(parse_value("MAP_AGENT_WEATHER_BUFFER_MS", &ms)?);
        }

        if let Some(attempts) = lookup("MAP_AGENT_READINESS_ATTEMPTS") {
            config.readiness_attempts = parse_value("MAP_AGENT_READINESS_ATTEMPTS", &attempts)?;
        }

        if let Some(mode) = lookup("MAP_AGENT_EXECUTION_MODE") {
            config.execution.mode = parse_value("MAP_AGENT_EXECUTION_MODE", &mode)?;
        }

        if let Some(types) = lookup("MAP_AGENT_CONFIRM_ACTIONS") {
            config.execution.confirm_required_actions = type_list(&types);
        }

        if let Some(types) = lookup("MAP_AGENT_AUTO_APPROVE_ACTIONS") {
            config.execution.auto_approve_actions = type_list(&types);
        }

        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: err.to_string(),
        })
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.readiness_attempts, 3);
    }

    #[test]
    fn overrides_are_read() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("MAP_AGENT_BACKEND_URL", "https://gis.example.com/"),
            ("MAP_AGENT_TIMEOUT_SECS", "4"),
            ("MAP_AGENT_API_TOKEN", "secret"),
            ("MAP_AGENT_WEATHER_BUFFER_MS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.backend_url, "https://gis.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(4));
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.weather_settle_buffer, Duration::ZERO);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = RuntimeConfig::from_lookup(lookup(&[("MAP_AGENT_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "MAP_AGENT_TIMEOUT_SECS", .. }));

        assert!(RuntimeConfig::from_lookup(lookup(&[("MAP_AGENT_BACKEND_URL", "localhost")])).is_err());
        assert!(RuntimeConfig::from_lookup(lookup(&[("MAP_AGENT_EXECUTION_MODE", "yolo")])).is_err());
    }

    #[test]
    fn execution_policy_is_read_from_env() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("MAP_AGENT_EXECUTION_MODE", "Confirm"),
            ("MAP_AGENT_AUTO_APPROVE_ACTIONS", "camera_flyTo, query_buildings,"),
        ]))
        .unwrap();

        assert_eq!(config.execution.mode, ExecutionMode::Confirm);
        assert_eq!(
            config.execution.auto_approve_actions,
            vec!["camera_flyTo".to_string(), "query_buildings".to_string()]
        );
        assert!(!config.execution.requires_approval(ActionKind::QueryBuildings));
        assert!(config.execution.requires_approval(ActionKind::SetWeather));
    }

    #[test]
    fn each_mode_decides_approval_by_type() {
        let auto = ExecutionPolicy {
            confirm_required_actions: vec!["set_weather".to_string()],
            ..ExecutionPolicy::default()
        };
        assert!(auto.requires_approval(ActionKind::SetWeather));
        assert!(!auto.requires_approval(ActionKind::Reset));

        let confirm = ExecutionPolicy {
            mode: ExecutionMode::Confirm,
            ..ExecutionPolicy::default()
        };
        assert!(!confirm.requires_approval(ActionKind::FlyTo));
        assert!(confirm.requires_approval(ActionKind::Reset));

        let manual = ExecutionPolicy {
            mode: ExecutionMode::Manual,
            auto_approve_actions: vec!["reset".to_string()],
            ..ExecutionPolicy::default()
        };
        assert!(manual.requires_approval(ActionKind::Reset));
    }

    #[test]
    fn deserializes_partial_json() {
        let config: RuntimeConfig = serde_json::from_str(
            r#"{ "backend_url": "http://10.0.0.5:8000", "request_timeout": 2500 }"#,
        )
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.default_flight_seconds, 3.0);
    }
}
