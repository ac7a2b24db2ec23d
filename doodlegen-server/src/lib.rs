use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use doodlegen_core::{Pipeline, PredictRequest};

// Application state containing the preloaded pipeline.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// Build the service router. CORS is fully open, matching the public demo
/// deployment this backend serves.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/categories/", get(categories_handler))
        .route("/predict/", get(predict_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct CategoriesResponse {
    categories: Vec<String>,
}

#[derive(Serialize)]
struct PredictResponse {
    msg: String,
    #[serde(rename = "folderName")]
    folder_name: String,
}

async fn root_handler() -> impl IntoResponse {
    Json(MessageResponse {
        message: "Hello World".to_string(),
    })
}

async fn categories_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(CategoriesResponse {
        categories: state.pipeline.categories().labels().to_vec(),
    })
}

async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Query(req): Query<PredictRequest>,
) -> impl IntoResponse {
    match state.pipeline.predict(&req).await {
        Ok(folder) => Json(PredictResponse {
            msg: "success, files uploaded to bucket".to_string(),
            folder_name: folder,
        })
        .into_response(),
        Err(e) => {
            error!("predict failed: {e:?}");
            let status = if e.is_client_fault() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, format!("Error: {e}")).into_response()
        }
    }
}
