//! HTTP Server for the fairfund API.
//!
//! Serves the application form, file uploads and reviewer scores.
//!
//! # API Endpoints
//!
//! | Method | Path                                   | Description                    |
//! |--------|----------------------------------------|--------------------------------|
//! | GET    | `/health`                              | Health check                   |
//! | GET    | `/robots.txt`                          | Crawler policy                 |
//! | GET    | `/institutions`                        | Institutions for the form      |
//! | POST   | `/application-form`                    | Create an empty application    |
//! | GET    | `/application-form/{id}`               | Stored application             |
//! | PUT    | `/application-form/{id}`               | Save a draft                   |
//! | PUT    | `/application-form/{id}/submit`        | Validate and submit            |
//! | POST   | `/application-form/{id}/upload-budget` | Upload the budget template     |
//! | POST   | `/v3/datasets/{id}/upload`             | Upload one data file           |
//! | GET    | `/v3/datasets/{id}/files`              | List uploaded data files       |
//! | PUT    | `/review/{id}`                         | Store reviewer scores          |

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, Request, State,
    },
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tokio::{fs, io::AsyncWriteExt, net::TcpListener, sync::RwLock};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use super::types::{maintenance_response, robots_txt, CreatedApplication, SubmitRedirect};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult, StoreError, StoreResult};
use crate::mail::Mailer;
use crate::models::{ApplicationFields, ApplicationForm, DatasetFile, FieldError, Institution};
use crate::store::ApplicationStore;
use crate::validation::{sanitize_file_name, validate_application, validate_review};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<ApplicationStore>>,
    pub config: Arc<ServerConfig>,
    /// `None` when no SMTP server is configured.
    pub mailer: Option<Mailer>,
}

impl AppState {
    /// Open the store named by `config`.
    pub fn open(config: ServerConfig) -> StoreResult<Self> {
        let store = ApplicationStore::open(&config.storage)?;
        let mailer = Mailer::from_config(&config.mail);
        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            config: Arc::new(config),
            mailer,
        })
    }
}

/// Build the router with CORS, request tracing and maintenance mode.
pub fn router(state: AppState) -> Router {
    // The frontend is served from its own origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/robots.txt", get(robots))
        .route("/institutions", get(list_institutions))
        .route("/application-form", post(create_application))
        .route("/application-form/{id}", get(get_application).put(save_application))
        .route("/application-form/{id}/submit", put(submit_application))
        .route(
            "/application-form/{id}/upload-budget",
            post(upload_budget).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/v3/datasets/{id}/upload",
            post(upload_dataset_file).layer(DefaultBodyLimit::disable()),
        )
        .route("/v3/datasets/{id}/files", get(list_dataset_files))
        .route("/review/{id}", put(submit_review))
        .layer(middleware::from_fn_with_state(state.clone(), maintenance_guard))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.socket_addr()?;
    let maintenance = config.maintenance;
    let state = AppState::open(config)?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("fairfund server running on http://{}", addr);
    if maintenance {
        tracing::warn!("Maintenance mode: API routes answer 503");
    }

    serve(listener, state).await?;
    Ok(())
}

async fn maintenance_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.config.maintenance && request.uri().path() != "/robots.txt" {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(maintenance_response())).into_response();
    }
    next.run(request).await
}

// =============================================================================
// Helpers
// =============================================================================

fn io_error(e: std::io::Error) -> ServerError {
    StoreError::from(e).into()
}

/// UUID of an existing application; anything else is forbidden.
async fn known_application(state: &AppState, id: &str) -> ServerResult<Uuid> {
    let uuid = Uuid::parse_str(id).map_err(|_| ServerError::Forbidden)?;
    if !state.store.read().await.contains(&uuid) {
        tracing::info!("Access denied to application {}", id);
        return Err(ServerError::Forbidden);
    }
    Ok(uuid)
}

fn require_multipart(
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<Multipart> {
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    if !is_multipart {
        return Err(ServerError::UnsupportedMedia("multipart/form-data"));
    }
    multipart.map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))
}

/// Validate `record` and check the chosen institution is one we offer.
async fn checked_fields(state: &AppState, record: &Value, submit: bool) -> ServerResult<ApplicationFields> {
    let fields = validate_application(record, submit).map_err(ServerError::Fields)?;
    if let Some(institution) = fields.institution {
        if !state.store.read().await.has_institution(&institution) {
            return Err(ServerError::Fields(vec![FieldError::new(
                "institution",
                "Unknown institution.",
            )]));
        }
    }
    Ok(fields)
}

/// Send the confirmation mail in the background; failures are only logged.
fn confirm_submission(state: &AppState, form: ApplicationForm) {
    let Some(mailer) = state.mailer.clone() else {
        tracing::debug!("Mail not configured, no confirmation for {}", form.uuid);
        return;
    };
    tokio::spawn(async move {
        if let Err(e) = mailer.send_confirmation(&form).await {
            tracing::error!("Failed to send confirmation mail for {}: {}", form.uuid, e);
        }
    });
}

/// Stream one multipart field to `path`, returning the bytes written.
async fn write_field(mut field: Field<'_>, path: &FsPath) -> ServerResult<u64> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    let mut file = fs::File::create(path).await.map_err(io_error)?;
    let mut written = 0u64;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?
    {
        file.write_all(&chunk).await.map_err(io_error)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_error)?;
    Ok(written)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "fairfund",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain")],
        robots_txt(state.config.allow_crawlers),
    )
}

async fn list_institutions(State(state): State<AppState>) -> Json<Vec<Institution>> {
    Json(state.store.read().await.institutions().to_vec())
}

async fn create_application(
    State(state): State<AppState>,
) -> ServerResult<(StatusCode, Json<CreatedApplication>)> {
    let uuid = state.store.write().await.create()?;
    tracing::info!("Created application {}", uuid);
    Ok((StatusCode::CREATED, Json(CreatedApplication { uuid })))
}

async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<ApplicationForm>> {
    let uuid = known_application(&state, &id).await?;
    let store = state.store.read().await;
    store.get(&uuid).cloned().map(Json).ok_or(ServerError::Forbidden)
}

async fn save_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(record): Json<Value>,
) -> ServerResult<StatusCode> {
    let uuid = known_application(&state, &id).await?;
    let fields = checked_fields(&state, &record, false).await?;
    state.store.write().await.update(&uuid, fields, false)?;
    tracing::debug!("Saved draft of {}", uuid);
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(record): Json<Value>,
) -> ServerResult<Json<SubmitRedirect>> {
    let uuid = known_application(&state, &id).await?;
    let fields = checked_fields(&state, &record, true).await.map_err(|e| {
        tracing::info!("Submission of {} rejected: {}", uuid, e);
        e
    })?;

    let submitted = {
        let mut store = state.store.write().await;
        store.update(&uuid, fields, true)?;
        store.get(&uuid).cloned()
    };
    tracing::info!("Application {} submitted", uuid);
    if let Some(form) = submitted {
        confirm_submission(&state, form);
    }
    Ok(Json(SubmitRedirect::for_application(&uuid)))
}

async fn upload_budget(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<StatusCode> {
    let uuid = known_application(&state, &id).await?;
    let mut multipart = require_multipart(&headers, multipart)?;
    let target = state.store.read().await.budget_path(&uuid);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("Budget_Template").to_string();
        let written = write_field(field, &target).await?;
        state.store.write().await.set_budget_filename(&uuid, filename.clone())?;

        tracing::info!("Stored budget '{}' for {} ({} bytes)", filename, uuid, written);
        return Ok(StatusCode::CREATED);
    }
    Err(ServerError::BadRequest("No file provided".to_string()))
}

async fn upload_dataset_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<StatusCode> {
    let uuid = Uuid::parse_str(&id).map_err(|_| ServerError::Forbidden)?;
    let mut multipart = require_multipart(&headers, multipart)?;
    let dataset_dir = state.store.read().await.dataset_dir(&uuid);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let relative = field
            .file_name()
            .and_then(sanitize_file_name)
            .ok_or_else(|| ServerError::BadRequest("Invalid file name".to_string()))?;
        let written = write_field(field, &dataset_dir.join(&relative)).await?;

        tracing::info!("Stored '{}' in dataset {} ({} bytes)", relative.display(), uuid, written);
        return Ok(StatusCode::CREATED);
    }
    Err(ServerError::BadRequest("No file provided".to_string()))
}

async fn list_dataset_files(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Vec<DatasetFile>>> {
    let uuid = Uuid::parse_str(&id).map_err(|_| ServerError::Forbidden)?;
    let files = state.store.read().await.dataset_files(&uuid)?;
    Ok(Json(files))
}

async fn submit_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ServerResult<StatusCode> {
    let uuid = Uuid::parse_str(&id).map_err(|_| ServerError::NotFound)?;
    if !state.store.read().await.contains(&uuid) {
        return Err(ServerError::NotFound);
    }
    let scores = validate_review(&body).map_err(ServerError::Fields)?;
    state.store.write().await.save_review(&uuid, scores)?;
    tracing::info!("Stored review of {}", uuid);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_known_application() {
        let dir = tempdir().unwrap();
        let state = AppState::open(ServerConfig {
            storage: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        let uuid = state.store.write().await.create().unwrap();

        assert_eq!(known_application(&state, &uuid.to_string()).await.unwrap(), uuid);
        assert!(matches!(
            known_application(&state, "not-a-uuid").await,
            Err(ServerError::Forbidden)
        ));
        assert!(matches!(
            known_application(&state, &Uuid::new_v4().to_string()).await,
            Err(ServerError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_checked_fields_rejects_unknown_institution() {
        let dir = tempdir().unwrap();
        let state = AppState::open(ServerConfig {
            storage: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        assert!(state.mailer.is_none());

        let offered = Institution::defaults()[0].uuid;
        let fields = checked_fields(&state, &json!({ "institution": offered.to_string() }), false)
            .await
            .unwrap();
        assert_eq!(fields.institution, Some(offered));

        let result = checked_fields(&state, &json!({ "institution": Uuid::new_v4().to_string() }), false).await;
        match result {
            Err(ServerError::Fields(errors)) => assert_eq!(errors[0].field_name, "institution"),
            other => panic!("expected a field error, got {:?}", other.map(|_| ())),
        }
    }
}
