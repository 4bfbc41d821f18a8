// ── Core error types ──
//
// User-facing errors from sweetsync-core. Consumers never see raw HTTP or
// JSON failures; `From<sweetsync_api::Error>` translates transport-layer
// errors into domain variants.

use thiserror::Error;

use crate::model::ItemId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to inventory service at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session is not connected")]
    Disconnected,

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Item not found: {identifier}")]
    ItemNotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Rejected by inventory service: {message}")]
    Rejected { message: String, status: u16 },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Re-label a 404 from an item endpoint with the id that was asked for.
    pub(crate) fn for_item(self, id: &ItemId) -> Self {
        match self {
            Self::ItemNotFound { .. } => Self::ItemNotFound {
                identifier: id.to_string(),
            },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sweetsync_api::Error> for CoreError {
    fn from(err: sweetsync_api::Error) -> Self {
        use sweetsync_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api { status: 404, message } => CoreError::ItemNotFound {
                identifier: message,
            },
            ApiError::Api {
                status: status @ (400 | 403 | 409 | 422),
                message,
            } => CoreError::Rejected { message, status },
            ApiError::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            ApiError::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;
    use crate::model::ItemId;

    #[test]
    fn out_of_stock_becomes_rejection() {
        let err = CoreError::from(sweetsync_api::Error::Api {
            status: 400,
            message: "Out of stock".into(),
        });
        assert!(matches!(err, CoreError::Rejected { status: 400, ref message } if message == "Out of stock"));
    }

    #[test]
    fn not_found_is_relabelled_with_item_id() {
        let err = CoreError::from(sweetsync_api::Error::Api {
            status: 404,
            message: "Sweet not found".into(),
        })
        .for_item(&ItemId::Numeric(12));
        assert!(matches!(err, CoreError::ItemNotFound { ref identifier } if identifier == "12"));
    }

    #[test]
    fn server_errors_stay_api_errors() {
        let err = CoreError::from(sweetsync_api::Error::Api {
            status: 500,
            message: "boom".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
    }
}
