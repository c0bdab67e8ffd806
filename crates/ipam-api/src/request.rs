// Request builder
//
// Turns (operation, entity) into a method, URL, and JSON body. Pure: the
// requester decides how to send it, the connector adds the auth header.

use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::auth::HostConfig;
use crate::entity::Entity;
use crate::error::Error;

/// Ranges under this segment are rejected by the appliance when the URL
/// ends with a slash.
const NO_TRAILING_SLASH_SEGMENT: &str = "/dhcp_range/";

/// CRUD selector mapped onto HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Get,
    Update,
    Delete,
}

impl Operation {
    pub fn method(self) -> Method {
        match self {
            Self::Create => Method::POST,
            Self::Get => Method::GET,
            Self::Update => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }

    fn carries_body(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

/// A fully assembled request, minus the auth header.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<serde_json::Value>,
}

/// Builds requests against one appliance.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    host: HostConfig,
}

impl RequestBuilder {
    pub fn new(host: HostConfig) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &HostConfig {
        &self.host
    }

    /// `{base}/api/v{version}{sub_path}/{object_type}/`.
    ///
    /// The object-type segment is skipped when empty; the trailing slash is
    /// skipped for `/dhcp_range/` sub-paths.
    pub fn url_for(&self, sub_path: &str, object_type: &str) -> Result<Url, Error> {
        let mut full = self.host.api_base();
        full.push_str(sub_path);
        if !object_type.is_empty() {
            full.push('/');
            full.push_str(object_type);
        }
        if !sub_path.contains(NO_TRAILING_SLASH_SEGMENT) {
            full.push('/');
        }
        Ok(Url::parse(&full)?)
    }

    /// Assemble a request for `entity`. Bodies are attached to POST and
    /// PATCH only.
    pub fn build(&self, op: Operation, entity: &impl Entity) -> Result<PreparedRequest, Error> {
        let url = self.url_for(entity.sub_path(), entity.object_type())?;
        let body = if op.carries_body() {
            Some(serde_json::to_value(entity).map_err(Error::Encode)?)
        } else {
            None
        };
        Ok(PreparedRequest {
            method: op.method(),
            url,
            body,
        })
    }

    /// Login request: the path is used verbatim under the host origin,
    /// without the `/api/v{version}` prefix.
    pub fn login(&self, path: &str, body: &impl Serialize) -> Result<PreparedRequest, Error> {
        let url = Url::parse(&format!("{}{path}", self.host.origin()))?;
        Ok(PreparedRequest {
            method: Method::POST,
            url,
            body: Some(serde_json::to_value(body).map_err(Error::Encode)?),
        })
    }

    /// Logout request for the same token endpoint.
    pub fn logout(&self, path: &str) -> Result<PreparedRequest, Error> {
        let url = Url::parse(&format!("{}{path}", self.host.origin()))?;
        Ok(PreparedRequest {
            method: Method::DELETE,
            url,
            body: None,
        })
    }
}
