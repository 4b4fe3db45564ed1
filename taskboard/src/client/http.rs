//! HTTP binding of [`TaskService`] built on `reqwest`.
//!
//! Routes: `GET /tasks`, `POST /tasks`, `GET /tasks/{id}`,
//! `PUT /tasks/{id}`, `DELETE /tasks/{id}`, all relative to the configured
//! base URL. Request and connect timeouts are enforced here; the store above
//! never times out on its own.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use taskboard_proto::api::{ErrorBody, TASKS_RESOURCE};
use taskboard_proto::task::{Task, TaskId};
use url::Url;

use super::{ClientError, TaskService};
use crate::config::ServiceConfig;

/// HTTP client for the remote task service.
#[derive(Debug, Clone)]
pub struct TaskClient {
    http: Client,
    base_url: Url,
}

impl TaskClient {
    /// Builds a client from the resolved service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if the base URL does not
    /// parse or cannot carry a path, and [`ClientError::Transport`] if the
    /// underlying HTTP client cannot be constructed.
    pub fn new(config: &ServiceConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(config.base_url.clone()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Base URL the task resource is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/tasks` or `{base}/tasks/{id}`, with the id percent-encoded.
    fn endpoint(&self, id: Option<&TaskId>) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ClientError::InvalidBaseUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push(TASKS_RESOURCE);
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, id: Option<&TaskId>) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(id)?;
        tracing::debug!(%method, %url, "task service request");
        Ok(self.http.request(method, url))
    }

    /// Sends the request and decodes a JSON body from a success response.
    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::send(builder).await?;
        Ok(response.json::<T>().await?)
    }

    /// Sends the request, turning non-success statuses into rejections.
    async fn send(builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        tracing::warn!(status = status.as_u16(), message = %message, "task service rejected request");
        Err(ClientError::rejected(status.as_u16(), message))
    }
}

/// Picks the failure reason out of a rejection body: the `error` field of
/// an [`ErrorBody`], else the trimmed raw text.
fn rejection_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if !parsed.error.is_empty() {
            return Some(parsed.error);
        }
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl TaskService for TaskClient {
    async fn list(&self) -> Result<Vec<Task>, ClientError> {
        let builder = self.request(Method::GET, None)?;
        Self::send_json(builder).await
    }

    async fn create(&self, task: &Task) -> Result<Task, ClientError> {
        let builder = self.request(Method::POST, None)?.json(task);
        Self::send_json(builder).await
    }

    async fn read(&self, id: &TaskId) -> Result<Task, ClientError> {
        let builder = self.request(Method::GET, Some(id))?;
        Self::send_json(builder).await
    }

    async fn replace(&self, id: &TaskId, task: &Task) -> Result<Task, ClientError> {
        let builder = self.request(Method::PUT, Some(id))?.json(task);
        Self::send_json(builder).await
    }

    async fn remove(&self, id: &TaskId) -> Result<(), ClientError> {
        let builder = self.request(Method::DELETE, Some(id))?;
        Self::send(builder).await?;
        Ok(())
    }
}
