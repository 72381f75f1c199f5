//! Error types for daily-research
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur outside of a single collection attempt
#[derive(Debug, Error)]
pub enum ResearchError {
    /// Configuration is missing or invalid
    #[error("Config error: {0}")]
    Config(String),

    /// Template registration or rendering failed
    #[error("Render error: {0}")]
    Render(String),

    /// Writing the site or git commit/push failed
    #[error("Publish error: {0}")]
    Publish(String),

    /// Webhook delivery failed
    #[error("Notify error: {0}")]
    Notify(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for daily-research operations
pub type Result<T> = std::result::Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = ResearchError::Config("no categories configured".to_string());
        assert_eq!(err.to_string(), "Config error: no categories configured");
    }

    #[test]
    fn test_publish_error() {
        let err = ResearchError::Publish("git push failed".to_string());
        assert_eq!(err.to_string(), "Publish error: git push failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ResearchError = io_err.into();
        assert!(matches!(err, ResearchError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{ not: [a list").unwrap_err();
        let err: ResearchError = yaml_err.into();
        assert!(matches!(err, ResearchError::Yaml(_)));
    }
}
