// EJ Dashboard - REST API with Axum
// Stateless: every request carries its own selection, the dataset is read-only

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::dashboard::{self, Selection, SelectionError};
use crate::dataset::{CountyInfo, Dataset};
use crate::risk::RiskBucket;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
}

impl AppState {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset: Arc::new(dataset) }
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct BucketResponse {
    name: &'static str,
    low: f64,
    high: f64,
}

/// Query parameters of /api/dashboard; both default to the first choice
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    county: Option<String>,
    bucket: Option<String>,
}

fn selection_error(err: SelectionError) -> Response {
    let status = match err {
        SelectionError::UnknownCounty(_) => StatusCode::NOT_FOUND,
        SelectionError::UnknownBucket(_) => StatusCode::BAD_REQUEST,
        SelectionError::EmptyDataset => StatusCode::SERVICE_UNAVAILABLE,
    };
    warn!(error = %err, "rejected dashboard request");
    (status, Json(ApiResponse::<()>::err(err.to_string()))).into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/counties - Selectable counties in dataset order
async fn get_counties(State(state): State<AppState>) -> impl IntoResponse {
    let counties: Vec<CountyInfo> = state.dataset.counties().to_vec();
    Json(ApiResponse::ok(counties))
}

/// GET /api/buckets - The four risk buckets, lowest first
async fn get_buckets() -> impl IntoResponse {
    let buckets: Vec<BucketResponse> = RiskBucket::ALL
        .iter()
        .map(|bucket| {
            let (low, high) = bucket.bounds();
            BucketResponse { name: bucket.name(), low, high }
        })
        .collect();
    Json(ApiResponse::ok(buckets))
}

/// GET /api/dashboard?county=..&bucket=.. - Both charts for one selection
async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let dataset = state.dataset.as_ref();

    let selection = match Selection::default_for(dataset) {
        Ok(default) => {
            let county = query.county.as_deref().unwrap_or(&default.county);
            let bucket = query.bucket.as_deref().unwrap_or(default.bucket.name());
            Selection::parse(dataset, county, bucket)
        }
        Err(err) => Err(err),
    };

    match selection.and_then(|selection| dashboard::render(dataset, &selection)) {
        Ok(view) => (StatusCode::OK, Json(ApiResponse::ok(view))).into_response(),
        Err(err) => selection_error(err),
    }
}

/// GET / - Serve the dashboard page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/counties", get(get_counties))
        .route("/buckets", get(get_buckets))
        .route("/dashboard", get(get_dashboard))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
