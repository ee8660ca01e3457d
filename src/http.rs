//! Shared HTTP client for the portal backend.
//!
//! All service modules go through one [`ApiClient`] so the base URL and the
//! bearer header are applied the same way everywhere. The access token is
//! read from the [`TokenStore`] on every outgoing request.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::schema::Validate;

/// Access/refresh token pair issued by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl Validate for TokenPair {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.access_token.is_empty() {
            return Err("access token is empty".to_string());
        }
        Ok(())
    }
}

/// Process-wide credential slot shared by every clone of the client.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<TokenPair>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|t| t.access_token.clone())
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        self.inner.read().clone()
    }

    pub fn set(&self, tokens: TokenPair) {
        *self.inner.write() = Some(tokens);
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().is_some()
    }
}

/// Query parameters as they go on the wire.
pub type Query = Vec<(&'static str, String)>;

/// Request-issuing client. Cheap to clone; clones share the connection pool and tokens.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config {
                details: format!("failed to build HTTP client: {}", e),
            })?;

        let tokens = TokenStore::new();
        if let Some(access_token) = &config.access_token {
            tokens.set(TokenPair {
                access_token: access_token.clone(),
                refresh_token: config.refresh_token.clone().unwrap_or_default(),
            });
        }

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// GET `path` and decode the body into `T`.
    pub async fn get<T>(&self, path: &str, query: &Query) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        let builder = self.request(Method::GET, path).query(query);
        let body = self.send(Method::GET, path, builder).await?;
        decode(path, &body)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Validate,
    {
        let builder = self.request(Method::POST, path).json(body);
        let text = self.send(Method::POST, path, builder).await?;
        decode(path, &text)
    }

    /// POST with no request body, ignoring the response body.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        let builder = self.request(Method::POST, path);
        self.send(Method::POST, path, builder).await.map(drop)
    }

    /// POST a JSON body, ignoring the response body.
    pub async fn post_discard<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path).json(body);
        self.send(Method::POST, path, builder).await.map(drop)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Validate,
    {
        let builder = self.request(Method::PUT, path).json(body);
        let text = self.send(Method::PUT, path, builder).await?;
        decode(path, &text)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, path);
        self.send(Method::DELETE, path, builder).await.map(drop)
    }

    /// Status-only GET: `Ok` for 2xx, the status error otherwise.
    pub async fn check_status(&self, path: &str, query: &Query) -> Result<()> {
        let builder = self.request(Method::GET, path).query(query);
        self.send(Method::GET, path, builder).await.map(drop)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json");

        match self.tokens.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<String> {
        debug!("{} {}", method, path);

        let resp = builder.send().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                method,
                path: path.to_string(),
                status,
                body,
            });
        }

        resp.text().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })
    }
}

fn decode<T>(path: &str, body: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_str(body).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })?;
    value.validate().map_err(|details| ApiError::Validation {
        path: path.to_string(),
        details,
    })?;
    Ok(value)
}
