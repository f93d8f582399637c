//! REST API server for the advisory engine
//!
//! Exposes the orchestrator via HTTP endpoints. Inbound payloads are
//! coerced leniently (numbers as strings, expenses as a map or a list)
//! before profile validation.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::agent::Orchestrator;
use crate::error::AdvisoryError;
use crate::models::ProfileRequest;
use crate::Result;

/// =============================
/// Request Models
/// =============================

/// A number, or a string holding one
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    fn value(&self, field: &str) -> Result<f64> {
        match self {
            Amount::Number(n) => Ok(*n),
            Amount::Text(s) => s.trim().replace(',', "").parse().map_err(|_| {
                AdvisoryError::InvalidProfile(format!("{} is not a number: {:?}", field, s))
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseEntry {
    pub category: String,
    pub amount: Amount,
}

/// Accepted spellings of the expense table
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpensesInput {
    Map(BTreeMap<String, Amount>),
    Entries(Vec<ExpenseEntry>),
    Pairs(Vec<(String, Amount)>),
}

impl ExpensesInput {
    fn into_pairs(self) -> Vec<(String, Amount)> {
        match self {
            ExpensesInput::Map(map) => map.into_iter().collect(),
            ExpensesInput::Entries(entries) => entries
                .into_iter()
                .map(|e| (e.category, e.amount))
                .collect(),
            ExpensesInput::Pairs(pairs) => pairs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub income: Option<Amount>,
    #[serde(default)]
    pub expenses: Option<ExpensesInput>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub debt: Option<Amount>,
    #[serde(default)]
    pub savings_goal: Option<Amount>,
}

impl TryFrom<AnalyzeRequest> for ProfileRequest {
    type Error = AdvisoryError;

    fn try_from(req: AnalyzeRequest) -> Result<Self> {
        let mut expenses = BTreeMap::new();
        for (category, amount) in req.expenses.map(ExpensesInput::into_pairs).unwrap_or_default() {
            let value = amount.value(&format!("expenses.{}", category))?;
            let key = category.trim().to_string();
            if expenses.insert(key.clone(), value).is_some() {
                return Err(AdvisoryError::InvalidProfile(format!(
                    "duplicate expense category {:?}",
                    key
                )));
            }
        }

        Ok(ProfileRequest {
            income: req.income.map(|a| a.value("income")).transpose()?,
            expenses,
            risk_level: req.risk_level,
            debt: req.debt.map(|a| a.value("debt")).transpose()?,
            savings_goal: req
                .savings_goal
                .map(|a| a.value("savings_goal"))
                .transpose()?,
        })
    }
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

/// =============================
/// Info & Health Endpoints
/// =============================

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["GET /health", "POST /analyze-finance"],
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Analysis Endpoint
/// =============================

async fn analyze_finance(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected analysis payload");
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid request body: {}", rejection.body_text()),
            );
        }
    };

    let result = match ProfileRequest::try_from(request) {
        Ok(profile_request) => state.orchestrator.analyze_request(profile_request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => {
            info!(report_id = %report.report_id, "Analysis served");
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e @ AdvisoryError::InvalidProfile(_)) => {
            warn!(error = %e, "Invalid profile");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Analysis failed: {}", e),
        ),
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ApiResponse::error(message))).into_response()
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/analyze-finance", post(analyze_finance))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(orchestrator: Arc<Orchestrator>, port: u16) -> Result<()> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::generation::OfflineClient;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn router() -> Router {
        let orchestrator = Orchestrator::new(
            Arc::new(OfflineClient::new("offline")),
            &GenerationConfig::default(),
        );
        create_router(Arc::new(orchestrator))
    }

    async fn post_json(body: &str) -> (StatusCode, Value) {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/analyze-finance")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analyze_finance() {
        let (status, json) = post_json(
            r#"{"income": 50000, "expenses": {"rent": 20000, "utilities": 3000, "groceries": 5000}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["budget_plan"]["current_allocation"]["needs_percentage"], 56.0);
        assert_eq!(json["budget_plan"]["recommended_monthly_savings"], 22000.0);
        assert_eq!(json["debt_plan"]["status"], "Debt-free");
        assert_eq!(json["generation_used"], false);
    }

    #[tokio::test]
    async fn test_lenient_payload() {
        let (status, json) = post_json(
            r#"{
                "income": "30000",
                "expenses": [{"category": "rent", "amount": "25000"}],
                "debt": "10,000",
                "risk_level": "conservative"
            }"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["financial_health_score"], 48);
        assert_eq!(json["debt_plan"]["estimated_months_to_clear"], 1);

        let (status, _) =
            post_json(r#"{"income": 1000, "expenses": [["rent", 400], ["dining", "50"]]}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_risk_level_is_served() {
        let (status, json) =
            post_json(r#"{"income": 10000, "expenses": {"rent": 4000}, "risk_level": "reckless"}"#)
                .await;

        assert_eq!(status, StatusCode::OK);
        let portfolio = json["investment_plan"]["portfolio"].as_array().unwrap();
        let assets: Vec<_> = portfolio.iter().map(|e| e["asset"].as_str().unwrap()).collect();
        assert_eq!(assets, vec!["Fixed Deposits", "Bonds", "Mutual Funds"]);
        assert_eq!(portfolio[0]["amount"], 3000.0);
    }

    #[tokio::test]
    async fn test_invalid_profiles_are_422() {
        for body in [
            r#"{"expenses": {"rent": 100}}"#,
            r#"{"income": -5}"#,
            r#"{"income": "lots"}"#,
            r#"{"income": 100, "expenses": [["rent", 1], ["rent", 2]]}"#,
            r#"not json"#,
        ] {
            let (status, json) = post_json(body).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "body: {}", body);
            assert_eq!(json["success"], false);
            assert!(json["error"].is_string());
        }
    }
}
