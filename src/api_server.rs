// Axum API Server Module
//
// Purpose: HTTP facade over the yield engine. Validates requests, runs the
// CPU-bound inference on the blocking pool under a deadline, and maps engine
// errors to status codes (client input -> 4xx, inference -> 5xx).

use axum::{
    extract::{rejection::JsonRejection, FromRequest, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ServerConfig;
use crate::engine::YieldEngine;
use crate::error::{EngineError, EngineResult};
use crate::features::FeatureContext;
use crate::predictor::{PointPrediction, Price};
use crate::ranker::{validate_prices, PriceTable, RankedRow};
use crate::scenario::ScenarioFlags;
use crate::units::PriceUnit;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;
pub const MAX_TOP_K: usize = 20;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub engine: YieldEngine,
    pub inference_timeout: Duration,
}

impl AppState {
    /// Load model + candidate vocabulary from the configured paths
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        tracing::info!("Loading yield model from {:?}...", config.model_path);
        tracing::info!("Loading candidate items from {:?}...", config.candidate_items_path);
        let engine = YieldEngine::load(&config.model_path, &config.candidate_items_path)?;
        tracing::info!("Engine ready ({} candidate items)", engine.candidates().len());

        Ok(Self::with_engine(engine, config.inference_timeout))
    }

    /// State around an already-built engine (tests, embedding)
    pub fn with_engine(engine: YieldEngine, inference_timeout: Duration) -> Self {
        Self {
            engine,
            inference_timeout,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict))
        .route("/recommend/yield", post(recommend_yield))
        .route("/recommend/revenue", post(recommend_revenue))
        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "running",
        "message": "Agricultural Yield Prediction API",
        "endpoints": ["/predict", "/recommend/yield", "/recommend/revenue"],
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn predict(
    State(state): State<AppState>,
    AppJson(req): AppJson<PredictRequest>,
) -> Result<Json<PointPrediction>, AppError> {
    let context = validate_context(&req.context)?;
    let unit = PriceUnit::parse(&req.price_unit)?;
    // price_value is optional and not range-checked on this endpoint
    let price = req.price_value.map(|value| Price { value, unit });
    let scenario = req.scenario;
    let item = req.item;

    tracing::info!("Predicting yield for '{}' in {}", item, context.area);

    let result = run_inference(&state, move |engine| {
        engine.predict_point(&context, &item, scenario, price)
    })
    .await?;

    Ok(Json(result))
}

async fn recommend_yield(
    State(state): State<AppState>,
    AppJson(req): AppJson<RecommendYieldRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    let context = validate_context(&req.context)?;
    let top_k = validate_top_k(req.top_k)?;
    let scenario = req.scenario;

    tracing::info!("Recommending top {} crops by yield for {}", top_k, context.area);

    let results = run_inference(&state, move |engine| {
        engine.rank_by_yield(&context, scenario, top_k)
    })
    .await?;

    Ok(Json(RecommendResponse { results }))
}

async fn recommend_revenue(
    State(state): State<AppState>,
    AppJson(req): AppJson<RecommendRevenueRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    let context = validate_context(&req.context)?;
    let top_k = validate_top_k(req.top_k)?;
    let unit = PriceUnit::parse(&req.price_unit)?;
    let scenario = req.scenario;

    if req.prices.is_empty() {
        return Err(AppError::BadRequest(
            "prices must be a non-empty dict {item: price}".to_string(),
        ));
    }
    validate_prices(&req.prices)?;

    let prices = req.prices;
    tracing::info!(
        "Recommending top {} crops by revenue for {} ({} prices, {})",
        top_k,
        context.area,
        prices.len(),
        unit
    );

    let results = run_inference(&state, move |engine| {
        engine.rank_by_revenue(&context, &prices, unit, scenario, top_k)
    })
    .await?;

    Ok(Json(RecommendResponse { results }))
}

/// Run an engine operation on the blocking pool, bounded by the inference deadline
async fn run_inference<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&YieldEngine) -> EngineResult<T> + Send + 'static,
{
    let engine = state.engine.clone();
    let task = tokio::task::spawn_blocking(move || op(&engine));

    match tokio::time::timeout(state.inference_timeout, task).await {
        Err(_) => {
            tracing::error!("Inference exceeded deadline of {:?}", state.inference_timeout);
            Err(AppError::Timeout(format!(
                "inference did not complete within {} ms",
                state.inference_timeout.as_millis()
            )))
        }
        Ok(Err(e)) => Err(AppError::Internal(format!("Task join error: {}", e))),
        Ok(Ok(result)) => result.map_err(AppError::from),
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// JSON body extractor whose rejections use the `{"error": ...}` shape
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
struct AppJson<T>(T);

/// Environmental context fields shared by all request bodies
#[derive(Deserialize, Debug, Clone)]
struct ContextFields {
    area: String,
    year: i32,
    avg_rain_mm: f64,
    pesticides_tonnes: f64,
    avg_temp: f64,
}

#[derive(Deserialize, Debug)]
struct PredictRequest {
    #[serde(flatten)]
    context: ContextFields,
    #[serde(flatten)]
    scenario: ScenarioFlags,
    item: String,
    price_value: Option<f64>,
    #[serde(default = "default_price_unit")]
    price_unit: String,
}

#[derive(Deserialize, Debug)]
struct RecommendYieldRequest {
    #[serde(flatten)]
    context: ContextFields,
    #[serde(flatten)]
    scenario: ScenarioFlags,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

#[derive(Deserialize, Debug)]
struct RecommendRevenueRequest {
    #[serde(flatten)]
    context: ContextFields,
    #[serde(flatten)]
    scenario: ScenarioFlags,
    #[serde(default = "default_top_k")]
    top_k: usize,
    prices: PriceTable,
    #[serde(default = "default_price_unit")]
    price_unit: String,
}

#[derive(Serialize, Debug)]
struct RecommendResponse {
    results: Vec<RankedRow>,
}

fn default_top_k() -> usize {
    5
}

fn default_price_unit() -> String {
    PriceUnit::default().code().to_string()
}

// ============================================================================
// Validation
// ============================================================================

fn validate_context(fields: &ContextFields) -> Result<FeatureContext, AppError> {
    let mut problems = Vec::new();

    if !(MIN_YEAR..=MAX_YEAR).contains(&fields.year) {
        problems.push(format!("year must be between {} and {}", MIN_YEAR, MAX_YEAR));
    }
    if !fields.avg_rain_mm.is_finite() || fields.avg_rain_mm < 0.0 {
        problems.push("avg_rain_mm must be >= 0".to_string());
    }
    if !fields.pesticides_tonnes.is_finite() || fields.pesticides_tonnes < 0.0 {
        problems.push("pesticides_tonnes must be >= 0".to_string());
    }
    if !fields.avg_temp.is_finite() {
        problems.push("avg_temp must be a finite number".to_string());
    }

    if !problems.is_empty() {
        return Err(AppError::Validation(problems.join("; ")));
    }

    Ok(FeatureContext {
        area: fields.area.clone(),
        year: fields.year,
        avg_rain_mm: fields.avg_rain_mm,
        pesticides_tonnes: fields.pesticides_tonnes,
        avg_temp: fields.avg_temp,
    })
}

fn validate_top_k(top_k: usize) -> Result<usize, AppError> {
    if (1..=MAX_TOP_K).contains(&top_k) {
        Ok(top_k)
    } else {
        Err(AppError::Validation(format!("top_k must be between 1 and {}", MAX_TOP_K)))
    }
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum AppError {
    Validation(String),
    BadRequest(String),
    Inference(String),
    Timeout(String),
    Internal(String),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        if err.is_client_error() {
            tracing::warn!("Rejected request: {}", err);
            AppError::BadRequest(err.to_string())
        } else {
            tracing::error!("Engine failure: {}", err);
            AppError::Inference(err.to_string())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        tracing::warn!("Rejected request body: {}", message);
        match rejection {
            JsonRejection::JsonDataError(_) => AppError::Validation(message),
            _ => AppError::BadRequest(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Inference(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
