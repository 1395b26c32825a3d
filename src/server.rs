//! HTTP API for the assessment service

use crate::error::EqsError;
use crate::metrics::MetricsSnapshot;
use crate::models::aggregator::RawPredictions;
use crate::narrative::NarrativeGenerator;
use crate::service::AssessmentService;
use crate::types::readings::{AirReadings, EqsRequest, SoilReadings, WaterReadings};
use crate::types::report::{DomainReport, EqsReport};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

type SharedService<N> = State<Arc<AssessmentService<N>>>;

/// Build the API router
pub fn router<N: NarrativeGenerator + 'static>(service: Arc<AssessmentService<N>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health::<N>))
        .route("/metrics", get(metrics::<N>))
        .route("/predict", post(predict::<N>))
        .route("/predict/air", post(predict_air::<N>))
        .route("/predict/water", post(predict_water::<N>))
        .route("/predict/soil", post(predict_soil::<N>))
        .route("/aggregate", post(aggregate::<N>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

impl IntoResponse for EqsError {
    fn into_response(self) -> Response {
        let status = match &self {
            EqsError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EqsError::Inference { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EqsError::NarrativeUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = json!({
            "error": self.kind(),
            "detail": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, EqsError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| EqsError::InvalidInput(rejection.body_text()))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Environmental Quality Prediction API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health<N: NarrativeGenerator + 'static>(State(service): SharedService<N>) -> Json<Value> {
    let aggregator = service.engine().aggregator();
    Json(json!({
        "status": "ok",
        "models": service.engine().model_names(),
        "weights": aggregator.weights(),
        "water_scale": aggregator.water_scale(),
        "category_scheme": aggregator.scheme(),
    }))
}

async fn metrics<N: NarrativeGenerator + 'static>(
    State(service): SharedService<N>,
) -> Json<MetricsSnapshot> {
    Json(service.metrics().snapshot())
}

async fn predict<N: NarrativeGenerator + 'static>(
    State(service): SharedService<N>,
    payload: Result<Json<EqsRequest>, JsonRejection>,
) -> Result<Json<EqsReport>, EqsError> {
    let request = body(payload)?;
    Ok(Json(service.assess(request).await?))
}

async fn predict_air<N: NarrativeGenerator + 'static>(
    State(service): SharedService<N>,
    payload: Result<Json<AirReadings>, JsonRejection>,
) -> Result<Json<DomainReport>, EqsError> {
    let readings = body(payload)?;
    Ok(Json(service.assess_air(readings).await?))
}

async fn predict_water<N: NarrativeGenerator + 'static>(
    State(service): SharedService<N>,
    payload: Result<Json<WaterReadings>, JsonRejection>,
) -> Result<Json<DomainReport>, EqsError> {
    let readings = body(payload)?;
    Ok(Json(service.assess_water(readings).await?))
}

async fn predict_soil<N: NarrativeGenerator + 'static>(
    State(service): SharedService<N>,
    payload: Result<Json<SoilReadings>, JsonRejection>,
) -> Result<Json<DomainReport>, EqsError> {
    let readings = body(payload)?;
    Ok(Json(service.assess_soil(readings).await?))
}

async fn aggregate<N: NarrativeGenerator + 'static>(
    State(service): SharedService<N>,
    payload: Result<Json<RawPredictions>, JsonRejection>,
) -> Result<Json<EqsReport>, EqsError> {
    let raw = body(payload)?;
    Ok(Json(service.assess_raw(raw).await?))
}
