//! HTTP route handlers.

use std::any::Any;
use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::SystemId;
use crate::query::{self, KeyKind, QueryError};
use crate::stations::StationFetcher;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<F: StationFetcher>(state: AppState<F>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/status", get(status::<F>))
        .route("/sno", get(find_station_codes::<F>))
        .route("/track/sno", get(track_by_code::<F>))
        .route("/track/name", get(track_by_name::<F>))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Plain-text identification.
async fn index() -> &'static str {
    "This is a YouBike tracker"
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Per-system index size and last sync time. Never triggers a sync.
async fn status<F: StationFetcher>(State(state): State<AppState<F>>) -> Json<StatusResponse> {
    let mut systems = Vec::with_capacity(SystemId::ALL.len());
    for id in SystemId::ALL {
        let index = state.systems.get(id).index();
        systems.push(SystemStatus {
            system: id.as_str(),
            stations: index.len().await,
            last_refreshed_at: index
                .last_refreshed_at()
                .await
                .map(|stamp| stamp.wall.to_rfc3339()),
        });
    }

    Json(StatusResponse { systems })
}

/// Station name → code for every name containing `name`.
async fn find_station_codes<F: StationFetcher>(
    State(state): State<AppState<F>>,
    Query(req): Query<StationCodeRequest>,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    let system = parse_system(&required("system", req.system)?)?;
    let fragment = required("name", req.name)?;

    let system = state.systems.get(system);
    state.refresh.ensure_fresh(system).await;

    let table = system.index().read().await;
    Ok(Json(query::find_codes_by_name_substring(&table, &fragment)))
}

/// Availability between two stations given by code.
async fn track_by_code<F: StationFetcher>(
    State(state): State<AppState<F>>,
    Query(req): Query<TrackRequest>,
) -> Result<Json<TrackResponse>, AppError> {
    track(&state, req, KeyKind::Code).await
}

/// Availability between two stations given by exact name.
async fn track_by_name<F: StationFetcher>(
    State(state): State<AppState<F>>,
    Query(req): Query<TrackRequest>,
) -> Result<Json<TrackResponse>, AppError> {
    track(&state, req, KeyKind::Name).await
}

async fn track<F: StationFetcher>(
    state: &AppState<F>,
    req: TrackRequest,
    kind: KeyKind,
) -> Result<Json<TrackResponse>, AppError> {
    let system = required("system", req.system)?;
    let depart = required("depart", req.depart)?;
    let arrive = required("arrive", req.arrive)?;
    let system = state.systems.get(parse_system(&system)?);

    state.refresh.ensure_fresh(system).await;

    let table = system.index().read().await;
    let availability = query::availability(&table, &depart, &arrive, kind)?;
    Ok(Json(availability.into()))
}

/// A query parameter that must be present and non-empty.
fn required(name: &'static str, value: Option<String>) -> Result<String, AppError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest {
            message: format!("missing required parameter: {name}"),
        })
}

fn parse_system(value: &str) -> Result<SystemId, AppError> {
    value.parse().map_err(|e: crate::config::UnknownSystem| AppError::BadRequest {
        message: e.to_string(),
    })
}

/// Turn a handler panic into a 500 with the panic message.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "internal error".to_string()
    };

    AppError::Internal { message }.into_response()
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::StationNotFound { .. } => AppError::NotFound {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), %message, "Request failed");
        } else {
            warn!(status = status.as_u16(), %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
