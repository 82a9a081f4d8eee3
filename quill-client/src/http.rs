//! `reqwest` transport for the `/api/posts` resource.

use async_trait::async_trait;
use quill_sync::{ClientError, PersistenceClient};
use quill_types::{DirectoryEntry, DocId, Document, DocumentPatch, DocumentStatus};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::wire::{Ack, Created, ErrorBody, Published, WirePatch, WirePost};

/// Shared request plumbing: base URL, bearer token and error mapping.
#[derive(Debug, Clone)]
pub(crate) struct Api {
    http: reqwest::Client,
    config: ClientConfig,
}

impl Api {
    pub(crate) fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("quill/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ClientError::Transient(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http, config })
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.config.endpoint(path));
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send `builder` and decode a successful JSON response.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_decode() {
        ClientError::Decode(err.to_string())
    } else {
        ClientError::Transient(err.to_string())
    }
}

/// Map a non-success response to the error taxonomy.
pub(crate) fn status_error(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        s if s.is_server_error() => ClientError::Transient(message),
        s => ClientError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}

/// Persistence Client backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpPersistence {
    api: Api,
}

impl HttpPersistence {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            api: Api::new(config)?,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.api.config()
    }
}

fn post_path(id: &DocId) -> String {
    format!("/api/posts/{id}")
}

#[async_trait]
impl PersistenceClient for HttpPersistence {
    async fn list(&self) -> Result<Vec<DirectoryEntry>, ClientError> {
        let posts: Vec<WirePost> = self
            .api
            .send(self.api.request(Method::GET, "/api/posts/"))
            .await?;
        Ok(posts.iter().map(WirePost::to_entry).collect())
    }

    async fn get(&self, id: &DocId) -> Result<Document, ClientError> {
        let post: WirePost = self
            .api
            .send(self.api.request(Method::GET, &post_path(id)))
            .await?;
        Ok(post.into_document())
    }

    async fn create(&self) -> Result<DocId, ClientError> {
        let created: Created = self
            .api
            .send(self.api.request(Method::POST, "/api/posts/"))
            .await?;
        Ok(DocId::new(created.id))
    }

    async fn patch(&self, id: &DocId, fields: &DocumentPatch) -> Result<(), ClientError> {
        let body = WirePatch::try_from(fields)?;
        let ack: Ack = self
            .api
            .send(self.api.request(Method::PATCH, &post_path(id)).json(&body))
            .await?;
        debug!(doc = %id, message = ack.message.as_deref().unwrap_or(""), "patched");
        Ok(())
    }

    async fn publish(&self, id: &DocId) -> Result<DocumentStatus, ClientError> {
        let path = format!("{}/publish", post_path(id));
        let published: Published = self.api.send(self.api.request(Method::POST, &path)).await?;
        Ok(DocumentStatus::parse(&published.status))
    }

    async fn delete(&self, id: &DocId) -> Result<(), ClientError> {
        let ack: Ack = self
            .api
            .send(self.api.request(Method::DELETE, &post_path(id)))
            .await?;
        debug!(doc = %id, message = ack.message.as_deref().unwrap_or(""), "deleted");
        Ok(())
    }
}
