use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use shared::{domain::EntityKind, error::ApiException};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

/// Remote REST collection, one per [`EntityKind`], rooted at `/api/{collection}`.
#[async_trait]
pub trait CollectionEndpoint: Send + Sync {
    /// `GET /api/{collection}`; returns the raw JSON array.
    async fn list(&self, kind: EntityKind) -> Result<Value>;
    /// `POST /api/{collection}`.
    async fn create(&self, kind: EntityKind, body: &Value) -> Result<()>;
    /// `PUT /api/{collection}/{id}`.
    async fn update(&self, kind: EntityKind, id: i64, body: &Value) -> Result<()>;
    /// `DELETE /api/{collection}/{id}`.
    async fn delete(&self, kind: EntityKind, id: i64) -> Result<()>;
    /// `PATCH /api/{collection}/{id}/{sub_resource...}`.
    async fn patch(
        &self,
        kind: EntityKind,
        id: i64,
        sub_resource: &[&str],
        body: Option<&Value>,
    ) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpCollectionEndpoint {
    http: Client,
    base_url: Url,
}

impl HttpCollectionEndpoint {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let invalid = |reason: &str| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: reason.to_string(),
        };
        let parsed = Url::parse(base_url.trim()).map_err(|err| invalid(&err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
            return Err(invalid("missing host"));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed"));
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `/api/{collection}/{segments...}` below the base url.
    pub fn collection_url(&self, kind: EntityKind, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    reason: "cannot hold path segments".into(),
                })?;
            path.pop_if_empty().push("api").push(kind.collection());
            path.extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Response> {
        debug!(%method, %url, "dispatching request");
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Network {
                method: method.clone(),
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            method,
            url: url.to_string(),
            status,
            detail: ApiException::new(status.as_u16(), &raw),
        })
    }
}

#[async_trait]
impl CollectionEndpoint for HttpCollectionEndpoint {
    async fn list(&self, kind: EntityKind) -> Result<Value> {
        let url = self.collection_url(kind, &[])?;
        let response = self.send(Method::GET, url.clone(), None).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ClientError::Network {
                method: Method::GET,
                url: url.to_string(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
            what: format!("{kind} list"),
            source,
        })
    }

    async fn create(&self, kind: EntityKind, body: &Value) -> Result<()> {
        let url = self.collection_url(kind, &[])?;
        self.send(Method::POST, url, Some(body)).await?;
        Ok(())
    }

    async fn update(&self, kind: EntityKind, id: i64, body: &Value) -> Result<()> {
        let id = id.to_string();
        let url = self.collection_url(kind, &[&id])?;
        self.send(Method::PUT, url, Some(body)).await?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: i64) -> Result<()> {
        let id = id.to_string();
        let url = self.collection_url(kind, &[&id])?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn patch(
        &self,
        kind: EntityKind,
        id: i64,
        sub_resource: &[&str],
        body: Option<&Value>,
    ) -> Result<()> {
        let id = id.to_string();
        let mut segments = Vec::with_capacity(sub_resource.len() + 1);
        segments.push(id.as_str());
        segments.extend_from_slice(sub_resource);
        let url = self.collection_url(kind, &segments)?;
        self.send(Method::PATCH, url, body).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/endpoint_tests.rs"]
mod tests;
