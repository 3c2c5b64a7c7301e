use crate::types::{RealtimeError, Result};
use futures::future::BoxFuture;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;

/// Source of bearer tokens for REST calls. How a token is refreshed is up to
/// the implementor.
pub trait TokenProvider: Send + Sync {
    /// The token to attach right now, if any
    fn access_token(&self) -> BoxFuture<'_, Option<String>>;

    /// Obtain a fresh token after the server rejected the current one
    fn refresh(&self) -> BoxFuture<'_, Result<String>>;
}

/// REST client for the ordering backend.
///
/// Every request carries `Authorization: Bearer <token>`. A `401` triggers
/// one refresh and one retry; a second rejection is returned as an error.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.send(Method::DELETE, path, None).await
    }

    /// Sends a request, refreshing the token and retrying once on `401`
    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let token = self.tokens.access_token().await;
        let response = self
            .request(method.clone(), &url, body.as_ref(), token.as_deref())
            .await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("Token rejected for {} {}, refreshing", method, url);
            let fresh = self.tokens.refresh().await?;
            self.request(method, &url, body.as_ref(), Some(&fresh))
                .await?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            return Err(RealtimeError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut request = self.http.request(method, url);

        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }
}
