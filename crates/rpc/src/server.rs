use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use padron_registry::{
    validate_user_update, FieldError, NewUser, RegistryError, User, UserRegistry, UserUpdate,
    USER_NOT_FOUND,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<UserRegistry>,
    pub start_time: Instant,
    pub req_count: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(registry: Arc<UserRegistry>) -> Self {
        Self {
            registry,
            start_time: Instant::now(),
            req_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn record_request(&self) -> u64 {
        self.req_count.fetch_add(1, Ordering::Relaxed) as u64 + 1
    }

    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    uptime_secs: u64,
    user_count: usize,
    req_total: u64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct ValidationResponse {
    errores: Vec<FieldError>,
}

/// Error reply in one of the API's two body shapes: `{"error": "..."}`
/// for conflicts and missing records, `{"errores": [...]}` for per-field
/// validation failures.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

#[derive(Debug)]
enum ApiErrorBody {
    Message(String),
    Fields(Vec<FieldError>),
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            body: ApiErrorBody::Message(message.into()),
        }
    }

    fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ApiErrorBody::Fields(errors),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.body {
            ApiErrorBody::Message(error) => {
                (self.status, Json(ErrorResponse { error })).into_response()
            }
            ApiErrorBody::Fields(errores) => {
                (self.status, Json(ValidationResponse { errores })).into_response()
            }
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err {
            RegistryError::ValidationFailed { errors } => Self::validation(errors),
            RegistryError::EmailAlreadyInUse { .. } => Self::bad_request(message),
            RegistryError::UserNotFound { .. } => Self::not_found(message),
        }
    }
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = bind_listener(addr).await?;
    info!("user API listening on {addr}");
    axum::serve(listener, app)
        .await
        .context("user API server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind API listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind API listener on {addr}"))
    }
}

/// Assemble the full route table over the shared state. Exposed so tests
/// and embedders can drive the API without binding a socket.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route(
            "/usuarios",
            get(handle_list_users).post(handle_register_user),
        )
        .route(
            "/usuarios/:id",
            get(handle_get_user)
                .put(handle_update_user)
                .delete(handle_delete_user),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_index() -> Html<&'static str> {
    Html(
        r#"
<!DOCTYPE html>
<html lang="es">
<head>
    <title>API de Gestión de Usuarios</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            max-width: 800px;
            margin: 50px auto;
            padding: 20px;
            background: #f5f5f5;
        }
        .container {
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        h1 {
            color: #333;
            border-bottom: 3px solid #4CAF50;
            padding-bottom: 10px;
        }
        .api-list {
            list-style: none;
            padding: 0;
        }
        .api-list li {
            margin: 10px 0;
            padding: 10px;
            background: #f9f9f9;
            border-left: 4px solid #4CAF50;
        }
        code {
            background: #f4f4f4;
            padding: 2px 6px;
            border-radius: 3px;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>API de Gestión de Usuarios</h1>

        <h2>Endpoints disponibles:</h2>
        <ul class="api-list">
            <li><code>GET /health</code> - Estado del servicio</li>
            <li><code>POST /usuarios</code> - Crear un nuevo usuario</li>
            <li><code>GET /usuarios</code> - Obtener todos los usuarios</li>
            <li><code>GET /usuarios/:id</code> - Obtener un usuario por ID</li>
            <li><code>PUT /usuarios/:id</code> - Modificar un usuario existente</li>
            <li><code>DELETE /usuarios/:id</code> - Eliminar un usuario por ID</li>
        </ul>

        <h2>Ejemplo de uso:</h2>
        <pre><code>curl -X POST http://localhost:3000/usuarios \
  -H 'Content-Type: application/json' \
  -d '{"name": "Ana", "email": "ana@example.com", "age": 30}'</code></pre>
    </div>
</body>
</html>
    "#,
    )
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let req_total = state.record_request();
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_seconds(),
        user_count: state.registry.len(),
        req_total,
    })
}

async fn handle_register_user(
    State(state): State<SharedState>,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    state.record_request();
    let user = state.registry.register(payload)?;
    debug!("registered user {} ({})", user.id, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn handle_list_users(State(state): State<SharedState>) -> Json<Vec<User>> {
    state.record_request();
    Json(state.registry.list())
}

async fn handle_get_user(
    State(state): State<SharedState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<User>, ApiError> {
    state.record_request();
    let id = parse_user_id(&id)?;
    Ok(Json(state.registry.get(id)?))
}

async fn handle_update_user(
    State(state): State<SharedState>,
    AxumPath(id): AxumPath<String>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    state.record_request();

    // Payload checks come first: a bad payload reports 400 even when the
    // id would not resolve.
    let errors = validate_user_update(&payload);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let id = parse_user_id(&id)?;
    let user = state.registry.update(id, payload)?;
    debug!("updated user {id}");
    Ok(Json(user))
}

async fn handle_delete_user(
    State(state): State<SharedState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    state.record_request();
    let id = parse_user_id(&id)?;
    state.registry.remove(id)?;
    debug!("deleted user {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// Parse a path id. Anything that is not a plain non-negative integer maps
/// to the same not-found reply a missing record gets, since such an id can
/// never be stored.
fn parse_user_id(value: &str) -> Result<u64, ApiError> {
    value
        .parse::<u64>()
        .map_err(|_| ApiError::not_found(USER_NOT_FOUND))
}
