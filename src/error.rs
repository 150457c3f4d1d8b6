//! Error types for the Worknot proxy

use thiserror::Error;

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Error types that can occur while configuring or running the proxy
#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    ConfigValidation(String),

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("Body parse error: {0}")]
    BodyParse(String),

    #[error("Custom 404 page {page_id} could not be fetched: {reason}")]
    MissingCustom404Target { page_id: String, reason: String },

    #[error("HTML rewrite error: {0}")]
    Rewrite(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Io(err.to_string())
    }
}

impl From<http::Error> for ProxyError {
    fn from(err: http::Error) -> Self {
        ProxyError::Http(err.to_string())
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::UpstreamFetch(err.to_string())
    }
}

impl ProxyError {
    /// Convert error to the HTTP status code sent to the client
    ///
    /// Upstream responses with an error status are relayed verbatim and never
    /// become a `ProxyError`; this mapping only covers failures inside the proxy
    /// or a fetch that produced no response at all.
    pub fn to_http_status(&self) -> u16 {
        match self {
            ProxyError::UpstreamFetch(_) => 502,
            ProxyError::MissingCustom404Target { .. } => 502,
            ProxyError::BodyParse(_) => 502,
            ProxyError::ConfigValidation(_) => 500,
            ProxyError::Rewrite(_) => 500,
            ProxyError::Http(_) => 500,
            ProxyError::Io(_) => 500,
        }
    }

    /// Whether the request can continue after this error
    ///
    /// Only a JSON patch failure is recovered in place: the text-substituted
    /// body is served instead.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProxyError::BodyParse(_))
    }

    /// Create a ConfigValidation error
    pub fn config(message: impl Into<String>) -> Self {
        ProxyError::ConfigValidation(message.into())
    }

    /// Create a MissingCustom404Target error
    pub fn missing_404_target(page_id: impl Into<String>, reason: impl Into<String>) -> Self {
        ProxyError::MissingCustom404Target {
            page_id: page_id.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_errors_map_to_bad_gateway() {
        assert_eq!(ProxyError::UpstreamFetch("reset".into()).to_http_status(), 502);
        assert_eq!(
            ProxyError::missing_404_target("c".repeat(32), "timed out").to_http_status(),
            502
        );
    }

    #[test]
    fn test_internal_errors_map_to_500() {
        assert_eq!(ProxyError::config("bad domain").to_http_status(), 500);
        assert_eq!(ProxyError::Rewrite("memory".into()).to_http_status(), 500);
    }

    #[test]
    fn test_only_body_parse_is_recoverable() {
        assert!(ProxyError::BodyParse("eof".into()).is_recoverable());
        assert!(!ProxyError::UpstreamFetch("eof".into()).is_recoverable());
        assert!(!ProxyError::config("x").is_recoverable());
    }

    #[test]
    fn test_missing_404_target_message() {
        let err = ProxyError::missing_404_target("abc", "connection refused");
        assert_eq!(
            err.to_string(),
            "Custom 404 page abc could not be fetched: connection refused"
        );
    }
}
