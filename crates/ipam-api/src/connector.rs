// Connector
//
// Stitches the request builder and the requester together, owns the
// session token, and exposes generic create/get/update/delete/list/deploy
// over any entity. Every request it issues runs inside the connector's own
// tracing span; there is no module-level logger.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{Instrument, Span, debug, info, info_span, warn};

use crate::auth::{self, Credentials, HostConfig};
use crate::entity::{DeployCommand, Entity};
use crate::error::Error;
use crate::request::{Operation, PreparedRequest, RequestBuilder};
use crate::requester::HttpRequester;
use crate::transport::TransportConfig;

/// Token endpoint, relative to the host origin.
const TOKEN_PATH: &str = "/token";

/// First-pass decode of a GET reply: only the id.
#[derive(Deserialize)]
struct IdProbe {
    #[serde(default)]
    id: i64,
}

/// Collection replies come either as a bare array or wrapped in `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

/// Authenticated session against one appliance.
///
/// Holds one token and one cookie jar. Requests are not serialized
/// internally: a caller issuing concurrent requests that depend on cookie
/// state must order them itself.
pub struct Connector {
    builder: RequestBuilder,
    requester: HttpRequester,
    token: RwLock<Option<SecretString>>,
    span: Span,
}

impl Connector {
    /// Build the client and log in.
    pub async fn connect(
        host: HostConfig,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let span = info_span!(
            "ipam.connector",
            host = %host.host,
            user = %credentials.username,
        );
        let connector = Self {
            builder: RequestBuilder::new(host),
            requester: HttpRequester::new(transport)?,
            token: RwLock::new(None),
            span,
        };
        connector.login(credentials).await?;
        Ok(connector)
    }

    pub fn host(&self) -> &HostConfig {
        self.builder.host()
    }

    /// The span every request of this connector is recorded under.
    pub fn span(&self) -> &Span {
        &self.span
    }

    // ── Session ─────────────────────────────────────────────────────

    async fn login(&self, credentials: &Credentials) -> Result<(), Error> {
        let req = self.builder.login(TOKEN_PATH, &credentials.login_body())?;
        let body = self
            .requester
            .send(req, None)
            .instrument(self.span.clone())
            .await
            .map_err(|e| match e {
                Error::Http { status, body, .. } => Error::Authentication {
                    message: format!("login rejected (HTTP {status}): {body}"),
                },
                Error::NotFound { path, .. } => Error::Authentication {
                    message: format!("token endpoint {path} not found"),
                },
                other => other,
            })?;

        let token = auth::parse_token(&body)?;
        *self.token.write().await = Some(token);
        self.span.in_scope(|| info!("session established"));
        Ok(())
    }

    /// Release the token on the appliance. Best effort: failures are
    /// logged and the local token is dropped either way.
    pub async fn logout(&self) {
        let req = match self.builder.logout(TOKEN_PATH) {
            Ok(req) => req,
            Err(e) => {
                self.span.in_scope(|| warn!(error = %e, "logout skipped"));
                return;
            }
        };
        if let Err(e) = self.dispatch(req).await {
            self.span.in_scope(|| warn!(error = %e, "logout failed"));
        }
        *self.token.write().await = None;
    }

    async fn auth_header(&self) -> Option<String> {
        self.token
            .read()
            .await
            .as_ref()
            .map(|t| format!("Basic {}", t.expose_secret()))
    }

    async fn dispatch(&self, req: PreparedRequest) -> Result<String, Error> {
        let auth = self.auth_header().await;
        self.requester
            .send(req, auth.as_deref())
            .instrument(self.span.clone())
            .await
    }

    // ── Generic CRUD ────────────────────────────────────────────────

    /// POST the creation shape; returns the raw reply.
    pub async fn create_object<E: Entity + Sync>(&self, entity: &E) -> Result<String, Error> {
        let req = self.builder.build(Operation::Create, entity)?;
        self.dispatch(req).await
    }

    /// GET the identity shape and decode it.
    ///
    /// A reply whose `id` is missing or zero is reported as
    /// [`Error::NotFound`].
    pub async fn get_object<T, E>(&self, entity: &E) -> Result<T, Error>
    where
        T: DeserializeOwned,
        E: Entity + Sync,
    {
        let req = self.builder.build(Operation::Get, entity)?;
        let path = req.url.path().to_owned();
        let body = self.dispatch(req).await?;

        let probe: IdProbe = decode(&body)?;
        if probe.id == 0 {
            debug!(path = %path, "reply decoded with id 0");
            return Err(Error::NotFound { path, body });
        }
        decode(&body)
    }

    /// PATCH the identity shape and decode the reply. An empty reply
    /// decodes as `{}`.
    pub async fn update_object<T, E>(&self, entity: &E) -> Result<T, Error>
    where
        T: DeserializeOwned,
        E: Entity + Sync,
    {
        let req = self.builder.build(Operation::Update, entity)?;
        let body = self.dispatch(req).await?;
        if body.trim().is_empty() {
            return decode("{}");
        }
        decode(&body)
    }

    /// DELETE the identity shape; returns the raw reply.
    pub async fn delete_object<E: Entity + Sync>(&self, entity: &E) -> Result<String, Error> {
        let req = self.builder.build(Operation::Delete, entity)?;
        self.dispatch(req).await
    }

    /// GET a collection.
    pub async fn list_objects<T, E>(&self, entity: &E) -> Result<Vec<T>, Error>
    where
        T: DeserializeOwned,
        E: Entity + Sync,
    {
        let req = self.builder.build(Operation::Get, entity)?;
        let body = self.dispatch(req).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(match decode::<Listing<T>>(&body)? {
            Listing::Bare(items) | Listing::Wrapped { data: items } => items,
        })
    }

    /// Selectively deploy `entity`. In batch mode the change is queued for
    /// the next scheduled deployment.
    pub async fn deploy_object<E: Entity + Sync>(
        &self,
        entity: &E,
        batch_mode: bool,
    ) -> Result<String, Error> {
        let cmd = DeployCommand::for_entity(entity, batch_mode);
        let req = self.builder.build(Operation::Create, &cmd)?;
        self.dispatch(req).await
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
