//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Counts rows in the HTS reference table
/// 2. **Interpreter**: Asks the duty-rate interpreter whether it is reachable
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected, 29807 HTS codes" },
///     "interpreter": { "status": "ok", "message": "gemini reachable" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (database, interpreter) = tokio::join!(check_database(&state), check_interpreter(&state));

    let all_healthy = database.is_ok() && interpreter.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            interpreter,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.hts_service.count().await {
        Ok(count) => CheckStatus::ok(format!("Connected, {count} HTS codes")),
        Err(e) => CheckStatus::error(format!("Database error: {e}")),
    }
}

async fn check_interpreter(state: &AppState) -> CheckStatus {
    let name = state.interpreter.name();
    if state.interpreter.health_check().await {
        CheckStatus::ok(format!("{name} reachable"))
    } else {
        CheckStatus::error(format!("{name} unreachable"))
    }
}
