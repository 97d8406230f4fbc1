// src/logging/mod.rs

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Filter directives: `MAP_AGENT_LOG`, then `RUST_LOG`, then `info`.
pub fn filter_from_env() -> EnvFilter {
    std::env::var("MAP_AGENT_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init() {
    let format = std::env::var("MAP_AGENT_LOG_FORMAT")
        .map(|raw| LogFormat::parse(&raw))
        .unwrap_or(LogFormat::Compact);
    init_with(format, filter_from_env());
}

pub fn init_with(format: LogFormat, filter: EnvFilter) {
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
