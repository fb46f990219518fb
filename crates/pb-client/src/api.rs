//! HTTP request channel.
//!
//! Mutations go out over plain REST; the server answers with status
//! only and the actual state change comes back as events on the push
//! channel. Responses therefore never feed the stores directly — the
//! one exception is the library catalog, which is a plain fetch.

use pb_core::id::EntityId;
use pb_core::model::{LibraryEntry, Position};
use pb_editor::requests::{CreateBlockRequest, CreateConnectionRequest, Request};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected {path}: {status}")]
    RequestFailure {
        path: String,
        status: reqwest::StatusCode,
    },
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

/// The id field of a create response's echoed entity.
#[derive(Deserialize)]
struct Created {
    id: EntityId,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Dispatch one tool-produced request to its endpoint.
    pub async fn send(&self, request: &Request) -> Result<(), ApiError> {
        match request {
            Request::CreateBlock(req) => self.create_block(req).await.map(|_| ()),
            Request::CreateConnection(req) => self.create_connection(req).await.map(|_| ()),
            Request::MoveNode { id, position } => self.move_node(*id, *position).await,
        }
    }

    /// The server echoes the created entity; only its id matters here —
    /// the full state arrives as a `create` event on the push channel.
    pub async fn create_block(&self, req: &CreateBlockRequest) -> Result<EntityId, ApiError> {
        self.post("blocks", req).await
    }

    pub async fn create_connection(
        &self,
        req: &CreateConnectionRequest,
    ) -> Result<EntityId, ApiError> {
        self.post("connections", req).await
    }

    pub async fn move_node(&self, id: EntityId, position: Position) -> Result<(), ApiError> {
        let path = format!("blocks/{id}/position");
        let response = self
            .http
            .put(format!("{}/{path}", self.base_url))
            .json(&position)
            .send()
            .await?;
        Self::check(path, response.status())
    }

    /// Fetch the block-type catalog. The caller replays it through the
    /// bus as a `LibraryLoaded` event.
    pub async fn library(&self) -> Result<Vec<LibraryEntry>, ApiError> {
        let response = self
            .http
            .get(format!("{}/library", self.base_url))
            .send()
            .await?;
        let status = response.status();
        Self::check("library".to_string(), status)?;
        Ok(response.json().await?)
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<EntityId, ApiError> {
        let response = self
            .http
            .post(format!("{}/{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        Self::check(path.to_string(), response.status())?;
        let created: Created = response.json().await?;
        Ok(created.id)
    }

    fn check(path: String, status: reqwest::StatusCode) -> Result<(), ApiError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::RequestFailure { path, status })
        }
    }
}
