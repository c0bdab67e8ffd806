use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::Error;

/// Substring that marks a raw (non-JSON) token reply.
const RAW_TOKEN_MARKER: &str = "BAMAuthToken";

/// URL scheme used to reach the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

/// Where the appliance lives and which API revision it speaks.
///
/// Base URL shape: `{transport}://{host}:{port}/api/v{version}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub transport: Scheme,
    pub host: String,
    pub port: u16,
    pub api_version: String,
}

impl HostConfig {
    pub fn new(transport: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            transport,
            host: host.into(),
            port,
            api_version: "1".into(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// `{transport}://{host}:{port}` with no path.
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.transport, self.host, self.port)
    }

    /// `{transport}://{host}:{port}/api/v{version}`.
    pub fn api_base(&self) -> String {
        format!("{}/api/v{}", self.origin(), self.api_version)
    }
}

/// Username/password pair posted to the token endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// Tell the appliance the password is already encrypted.
    pub encrypt_password: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            encrypt_password: false,
        }
    }

    /// JSON body for `POST /token`.
    pub(crate) fn login_body(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": self.password.expose_secret(),
            "encrypt_password": self.encrypt_password,
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Extract the session token from a login reply.
///
/// Two shapes are accepted: `{"access_token": "..."}` or a raw string
/// (optionally JSON-quoted) containing `BAMAuthToken`.
pub(crate) fn parse_token(body: &str) -> Result<SecretString, Error> {
    if let Ok(resp) = serde_json::from_str::<TokenResponse>(body) {
        if resp.access_token.is_empty() {
            return Err(Error::Authentication {
                message: "login reply carried an empty access_token".into(),
            });
        }
        return Ok(SecretString::from(resp.access_token));
    }

    let raw = serde_json::from_str::<String>(body).unwrap_or_else(|_| body.trim().to_owned());
    if raw.contains(RAW_TOKEN_MARKER) {
        return Ok(SecretString::from(raw));
    }

    Err(Error::Authentication {
        message: format!(
            "unexpected login reply: {}",
            body.chars().take(200).collect::<String>()
        ),
    })
}
