// HTTP requester
//
// Owns the single long-lived reqwest::Client (and its cookie jar), sends
// prepared requests, and classifies replies. Status acceptance is per
// method; everything else becomes a typed error carrying the raw body.

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, StatusCode};
use tracing::{debug, trace};

use crate::error::Error;
use crate::request::PreparedRequest;
use crate::transport::TransportConfig;

/// Header carrying the session token.
pub const AUTH_HEADER: &str = "Auth";

/// Body fragments the appliance uses for "no such object" when the status
/// code alone does not say so.
const NOT_FOUND_MARKERS: &[&str] = &["not found", "does not exist"];

/// Executes requests over one client and one cookie jar.
pub struct HttpRequester {
    http: reqwest::Client,
}

impl HttpRequester {
    /// Build the client from `transport`, adding a cookie jar if the config
    /// does not carry one.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        Ok(Self {
            http: config.build_client()?,
        })
    }

    /// Send `req`, returning the body text on an accepted status.
    ///
    /// `auth` is the full `Auth` header value, if any.
    pub async fn send(&self, req: PreparedRequest, auth: Option<&str>) -> Result<String, Error> {
        debug!("{} {}", req.method, req.url);

        let path = req.url.path().to_owned();
        let method = req.method.clone();

        let mut builder = self
            .http
            .request(req.method, req.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(value) = auth {
            builder = builder.header(AUTH_HEADER, value);
        }
        if let Some(body) = req.body {
            builder = builder.body(serde_json::to_vec(&body).map_err(Error::Encode)?);
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(status = status.as_u16(), bytes = body.len(), "reply");

        classify(&method, &path, status, auth.is_some(), body)
    }
}

/// Statuses accepted for each method.
pub fn accepts(method: &Method, status: StatusCode) -> bool {
    match *method {
        Method::GET | Method::PATCH => status == StatusCode::OK,
        Method::POST => matches!(status, StatusCode::OK | StatusCode::CREATED),
        Method::DELETE => matches!(status, StatusCode::OK | StatusCode::NO_CONTENT),
        _ => status.is_success(),
    }
}

/// True if a rejected reply means "no such object".
pub fn looks_not_found(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::NOT_FOUND {
        return true;
    }
    let lowered = body.to_ascii_lowercase();
    NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m))
}

fn classify(
    method: &Method,
    path: &str,
    status: StatusCode,
    authenticated: bool,
    body: String,
) -> Result<String, Error> {
    if accepts(method, status) {
        return Ok(body);
    }
    if status == StatusCode::UNAUTHORIZED && authenticated {
        return Err(Error::SessionExpired);
    }
    if looks_not_found(status, &body) {
        return Err(Error::NotFound {
            path: path.to_owned(),
            body,
        });
    }
    Err(Error::Http {
        method: method.to_string(),
        path: path.to_owned(),
        status: status.as_u16(),
        code: status.canonical_reason().unwrap_or_default().to_owned(),
        body,
    })
}
