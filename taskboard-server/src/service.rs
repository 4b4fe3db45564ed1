//! Task service core: shared state, HTTP routes, and request handlers.
//!
//! The service exposes the task collection as a REST resource at `/tasks`
//! and `/tasks/{id}`. Bodies are JSON task records; failures carry an
//! [`ErrorBody`] with a matching 4xx status.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskboard_proto::api::ErrorBody;
use taskboard_proto::task::{
    MAX_TASK_TITLE_LENGTH, Priority, Task, TaskId, TaskPatch, TaskStatus, TitleError,
    validate_title,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::DEFAULT_MAX_BODY_SIZE;
use crate::store::{RepositoryError, TaskRepository};

/// Shared service state holding the task collection.
pub struct ServiceState {
    /// The task collection served by this instance.
    pub repo: TaskRepository,
    /// Maximum accepted request body size in bytes.
    max_body_size: usize,
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceState {
    /// Creates a service state with an empty collection and default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            repo: TaskRepository::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Creates a service state with a custom body size limit and collection.
    #[must_use]
    pub const fn with_config(max_body_size: usize, repo: TaskRepository) -> Self {
        Self {
            repo,
            max_body_size,
        }
    }
}

/// Body accepted by `POST /tasks`. The service fills in anything missing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewTask {
    id: Option<TaskId>,
    title: String,
    description: Option<String>,
    priority: Option<Priority>,
    status: Option<TaskStatus>,
    created_at: Option<DateTime<Utc>>,
}

/// Body accepted by `PUT /tasks/{id}`. Any `id` or `createdAt` in the body
/// is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceTask {
    title: String,
    description: Option<String>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    status: TaskStatus,
}

/// Handler failure, rendered as a status code plus [`ErrorBody`].
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    InvalidTitle(#[from] TitleError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Repository(RepositoryError::Duplicate(_)) => StatusCode::CONFLICT,
            Self::InvalidTitle(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// `GET /tasks`
async fn list_tasks(State(state): State<Arc<ServiceState>>) -> Json<Vec<Task>> {
    Json(state.repo.list().await)
}

/// `POST /tasks`
async fn create_task(
    State(state): State<Arc<ServiceState>>,
    Json(body): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    validate_title(&body.title, MAX_TASK_TITLE_LENGTH)?;
    let task = Task {
        id: body.id.unwrap_or_else(TaskId::generate),
        title: body.title,
        description: body.description,
        priority: body.priority.unwrap_or_default(),
        status: body.status.unwrap_or_default(),
        created_at: body.created_at.unwrap_or_else(Utc::now),
    };
    let task = state.repo.insert(task).await.inspect_err(|e| {
        tracing::warn!(error = %e, "create rejected");
    })?;
    tracing::info!(task_id = %task.id, status = %task.status, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /tasks/{id}`
async fn get_task(
    State(state): State<Arc<ServiceState>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.repo.get(&TaskId::new(id)).await?))
}

/// `PUT /tasks/{id}`
async fn replace_task(
    State(state): State<Arc<ServiceState>>,
    Path(id): Path<String>,
    Json(body): Json<ReplaceTask>,
) -> Result<Json<Task>, ApiError> {
    validate_title(&body.title, MAX_TASK_TITLE_LENGTH)?;
    let id = TaskId::new(id);
    let replacement = Task {
        id: id.clone(),
        title: body.title,
        description: body.description,
        priority: body.priority,
        status: body.status,
        // Overwritten with the stored value.
        created_at: Utc::now(),
    };
    let task = state.repo.replace(&id, replacement).await?;
    tracing::info!(task_id = %task.id, status = %task.status, "task replaced");
    Ok(Json(task))
}

/// `PATCH /tasks/{id}`
async fn patch_task(
    State(state): State<Arc<ServiceState>>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    if let Some(title) = &patch.title {
        validate_title(title, MAX_TASK_TITLE_LENGTH)?;
    }
    let task = state.repo.patch(&TaskId::new(id), &patch).await?;
    tracing::info!(task_id = %task.id, status = %task.status, "task patched");
    Ok(Json(task))
}

/// `DELETE /tasks/{id}`
async fn delete_task(
    State(state): State<Arc<ServiceState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.repo.remove(&TaskId::new(id)).await?;
    tracing::info!(task_id = %removed.id, "task deleted");
    Ok(Json(serde_json::json!({})))
}

/// CORS policy: any origin, the five task verbs, and the request headers
/// a browser client sends with JSON bodies. Preflights are answered here.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
}

/// Builds the service router over the given state.
pub fn router(state: Arc<ServiceState>) -> Router {
    let max_body_size = state.max_body_size;
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task)
                .put(replace_task)
                .patch(patch_task)
                .delete(delete_task),
        )
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(cors())
        .with_state(state)
}

/// Starts the service on the given address and returns the bound address
/// and a join handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(ServiceState::new())).await
}

/// Starts the service with a pre-configured [`ServiceState`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<ServiceState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task service error");
        }
    });

    Ok((bound_addr, handle))
}
