// Account endpoints
//
// Login exchanges a username/password form for a bearer token. The token is
// handed back to the caller rather than installed automatically, so the
// owner of the session decides when it takes effect.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::client::InventoryClient;
use crate::error::Error;
use crate::models::{RegisterBody, RegisteredUser, TokenResponse, UserProfile};

/// A bearer token issued by `POST /auth/login`.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: SecretString,
    pub token_type: String,
}

impl AccessToken {
    pub fn into_secret(self) -> SecretString {
        self.token
    }
}

impl InventoryClient {
    /// Exchange credentials for a bearer token.
    ///
    /// `POST /auth/login` (form: `username`, `password`). Any non-success
    /// status maps to [`Error::Authentication`].
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<AccessToken, Error> {
        let url = self.api_url("auth/login")?;
        debug!(username, "logging in");

        let form = [
            ("username", username),
            ("password", password.expose_secret()),
        ];
        let resp = self.post_form(url, &form).await?;

        let body: TokenResponse = match Self::parse_json(resp).await {
            Ok(body) => body,
            Err(Error::Api { message, .. } | Error::Authentication { message }) => {
                return Err(Error::Authentication { message });
            }
            Err(e) => return Err(e),
        };

        info!("login successful");
        Ok(AccessToken {
            token: SecretString::from(body.access_token),
            token_type: body.token_type,
        })
    }

    /// Create an account.
    ///
    /// `POST /auth/register`
    pub async fn register(&self, email: &str, password: &SecretString) -> Result<RegisteredUser, Error> {
        let url = self.api_url("auth/register")?;
        let body = RegisterBody {
            email,
            password: password.expose_secret(),
        };
        self.post(url, &body).await
    }

    /// The account the current token belongs to.
    ///
    /// `GET /auth/me`
    pub async fn me(&self) -> Result<UserProfile, Error> {
        let url = self.api_url("auth/me")?;
        self.get(url).await
    }
}
