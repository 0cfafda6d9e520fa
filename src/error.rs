use serde_json::{json, Value};

/// Error type shared by the client, session and tool layers.
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("Not authenticated: call authenticate_ops or authenticate_ops_env first")]
    NotAuthenticated,
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad error kind, for callers that branch on failure class rather than text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Authentication,
    Upstream,
    NotAuthenticated,
    InvalidRequest,
    Internal,
}

impl OpsError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpsError::Config(_) => ErrorKind::Config,
            OpsError::Auth(_) => ErrorKind::Authentication,
            OpsError::Request(_) => ErrorKind::Upstream,
            OpsError::NotAuthenticated => ErrorKind::NotAuthenticated,
            OpsError::InvalidParams(_) | OpsError::UnknownTool(_) => ErrorKind::InvalidRequest,
            OpsError::Internal(_) => ErrorKind::Internal,
        }
    }
}

// ---------------------------------------------------------------------------
// Tool boundary envelope
// ---------------------------------------------------------------------------

/// Render an error as the `{"error": message}` envelope returned by every tool.
#[must_use]
pub fn error_envelope(err: &OpsError) -> Value {
    json!({ "error": err.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(OpsError::Auth("x".into()).kind(), ErrorKind::Authentication);
        assert_eq!(OpsError::Request("x".into()).kind(), ErrorKind::Upstream);
        assert_eq!(
            OpsError::UnknownTool("nope".into()).kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(OpsError::NotAuthenticated.kind(), ErrorKind::NotAuthenticated);
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = error_envelope(&OpsError::Request("status=500".into()));
        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["error"], "Request error: status=500");
    }

    #[test]
    fn test_not_authenticated_message_is_fixed() {
        let body = error_envelope(&OpsError::NotAuthenticated);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Not authenticated"));
    }
}
