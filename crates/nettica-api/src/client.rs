// Console API HTTP client
//
// Wraps `reqwest::Client` with per-target URL construction, bearer auth
// and error-body decoding. Endpoint families (resources, accounts, auth)
// are implemented as inherent methods in separate files to keep this
// module focused on transport mechanics.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Endpoint, Target};
use crate::credentials::CredentialStore;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Error response shape: `{"error": "..."}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Async client for the console REST API.
///
/// Holds no per-target mutable state: each request reads the target's
/// server and token from the credential store and builds its URL and
/// `Authorization` header from that snapshot.
pub struct ApiClient {
    http: reqwest::Client,
    credentials: Arc<dyn CredentialStore>,
    default_server: Option<Url>,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client with its own `reqwest::Client` from `transport`.
    ///
    /// `default_server` is used for the primary target until a server has
    /// been persisted in the credential store.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        default_server: Option<Url>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, credentials, default_server))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        credentials: Arc<dyn CredentialStore>,
        default_server: Option<Url>,
    ) -> Self {
        Self {
            http,
            credentials,
            default_server,
        }
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn default_server(&self) -> Option<&Url> {
        self.default_server.as_ref()
    }

    /// Resolve the current configuration for `target`.
    pub fn endpoint(&self, target: Target) -> Result<Endpoint, Error> {
        Endpoint::resolve(
            self.credentials.as_ref(),
            target,
            self.default_server.as_ref(),
        )
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, target: Target, path: &str) -> Result<T, Error> {
        let resp = self.request(target, Method::GET, path)?.send().await?;
        Self::handle_response(resp).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        target: Target,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self
            .request(target, Method::POST, path)?
            .json(body)
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    /// POST without a request body.
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        target: Target,
        path: &str,
    ) -> Result<T, Error> {
        let resp = self.request(target, Method::POST, path)?.send().await?;
        Self::handle_response(resp).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        target: Target,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self
            .request(target, Method::PUT, path)?
            .json(body)
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        target: Target,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self
            .request(target, Method::PATCH, path)?
            .json(body)
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    /// DELETE, discarding whatever the server echoes back.
    pub async fn delete(&self, target: Target, path: &str) -> Result<(), Error> {
        let resp = self.request(target, Method::DELETE, path)?.send().await?;
        Self::handle_empty(resp).await
    }

    /// GET for endpoints whose response body carries nothing we need
    /// (e-mail triggers, logout).
    pub async fn get_discard(&self, target: Target, path: &str) -> Result<(), Error> {
        let resp = self.request(target, Method::GET, path)?.send().await?;
        Self::handle_empty(resp).await
    }

    /// GET a binary body (QR code images, config files).
    pub async fn get_bytes(
        &self,
        target: Target,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Bytes, Error> {
        let resp = self
            .request(target, Method::GET, path)?
            .query(params)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        Ok(resp.bytes().await?)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn request(
        &self,
        target: Target,
        method: Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let endpoint = self.endpoint(target)?;
        let url = endpoint.url(path)?;
        debug!(%target, "{method} {url}");

        let builder = self.http.request(method, url);
        Ok(match endpoint.token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    /// Map non-success statuses to errors, passing successful responses through.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: message.unwrap_or_else(|| "token rejected (HTTP 401)".into()),
            });
        }

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await?;
        trace!(len = body.len(), "response body");

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        Self::check_status(resp).await?;
        Ok(())
    }
}
