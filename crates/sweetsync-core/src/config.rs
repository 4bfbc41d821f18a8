// ── Runtime session configuration ──
//
// These types describe *how* to reach an inventory service. They carry
// credential data and connection tuning, but never touch disk. The CLI
// constructs a `SessionConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// How to authenticate with the inventory service.
#[derive(Debug, Clone, Default)]
pub enum AuthCredentials {
    /// No token. Reads work against services that allow them; writes fail.
    #[default]
    Anonymous,
    /// A previously issued bearer token.
    Token(SecretString),
    /// Exchange username/password for a token when the session connects.
    Credentials {
        username: String,
        password: SecretString,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development servers).
    DangerAcceptInvalid,
}

/// Configuration for one inventory session.
///
/// Built by the CLI, passed to `InventorySession`. Core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// API base URL (e.g., `http://127.0.0.1:8000/api`).
    pub url: Url,
    /// Push endpoint. Derived from `url` when unset.
    pub ws_url: Option<Url>,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Fixed delay between a push channel close and the next attempt.
    pub reconnect_delay: Duration,
    /// Open the push channel on connect.
    pub push_enabled: bool,
}

impl SessionConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

    /// A config for `url` with default tuning and no credentials.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            ws_url: None,
            auth: AuthCredentials::default(),
            tls: TlsVerification::default(),
            timeout: Self::DEFAULT_TIMEOUT,
            reconnect_delay: Self::DEFAULT_RECONNECT_DELAY,
            push_enabled: true,
        }
    }

    pub fn with_auth(mut self, auth: AuthCredentials) -> Self {
        self.auth = auth;
        self
    }

    pub fn without_push(mut self) -> Self {
        self.push_enabled = false;
        self
    }
}
