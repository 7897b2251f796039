use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::{error_type_name, AppError};
use crate::handlers::AppState;
use crate::metrics;

#[derive(Debug, Serialize)]
pub struct MarketsResponse {
    pub markets: Vec<String>,
    pub default: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DatesResponse {
    /// Distinct calendar dates present in the table, ascending, YYYY-MM-DD
    pub dates: Vec<String>,
    pub default: Option<String>,
}

/// Handle /api/markets endpoint
///
/// Markets are the non-timestamp columns of the gold table, in header order.
pub async fn list_markets(
    State(state): State<AppState>,
) -> Result<Json<MarketsResponse>, AppError> {
    let table = match state.tables.get_or_load(&state.config.data.gold_path) {
        Ok(table) => table,
        Err(err) => {
            metrics::record_request("/api/markets", "error");
            metrics::record_error(error_type_name(&err));
            return Err(err);
        }
    };
    metrics::record_request("/api/markets", "ok");

    Ok(Json(MarketsResponse {
        markets: table.markets().to_vec(),
        default: table
            .default_market(&state.config.data.default_market)
            .map(|m| m.to_string()),
    }))
}

/// Handle /api/dates endpoint
pub async fn list_dates(State(state): State<AppState>) -> Result<Json<DatesResponse>, AppError> {
    let table = match state.tables.get_or_load(&state.config.data.gold_path) {
        Ok(table) => table,
        Err(err) => {
            metrics::record_request("/api/dates", "error");
            metrics::record_error(error_type_name(&err));
            return Err(err);
        }
    };
    metrics::record_request("/api/dates", "ok");

    Ok(Json(DatesResponse {
        dates: table
            .dates()
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect(),
        default: table.latest_date().map(|d| d.format("%Y-%m-%d").to_string()),
    }))
}
