use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log level {level}: {detail}")]
    InvalidLogLevel { level: String, detail: String },

    #[error("failed to initialize logging: {0}")]
    Initialization(String),
}

/// Log filter from `LOG_LEVEL`, defaulting to `info`.
pub fn log_level_from(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup("LOG_LEVEL")
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// Installs a JSON-lines subscriber on stderr. CloudWatch picks up one event
/// per line with its structured fields flattened.
pub fn init_logging() -> Result<(), LoggingError> {
    let level = log_level_from(|name| std::env::var(name).ok());
    let filter = EnvFilter::try_new(&level).map_err(|error| LoggingError::InvalidLogLevel {
        level: level.clone(),
        detail: error.to_string(),
    })?;

    let json_layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|error| LoggingError::Initialization(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_defaults_to_info() {
        assert_eq!(log_level_from(|_| None), "info");
        assert_eq!(log_level_from(|_| Some("  ".to_string())), "info");
        assert_eq!(
            log_level_from(|_| Some("mentorship_lambda=debug".to_string())),
            "mentorship_lambda=debug"
        );
    }
}
