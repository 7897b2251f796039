use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::advisor::{self, DaySlice, PricePoint, Severity};
use crate::error::{error_type_name, AppError};
use crate::handlers::AppState;
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct AdviceParams {
    /// Market column; defaults to the configured market when present
    pub market: Option<String>,
    /// Calendar date (YYYY-MM-DD); defaults to the most recent in the table
    pub date: Option<String>,
    /// Best/worst hours count, 1..=8; defaults from configuration
    pub hours: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub market: String,
    pub date: String,
    pub hours: usize,
    pub current: CurrentPanel,
    pub average: AveragePanel,
    pub series: Vec<SeriesPoint>,
    pub cheapest: Vec<SeriesPoint>,
    pub priciest: Vec<SeriesPoint>,
}

/// "Latest available hour" panel
#[derive(Debug, Serialize)]
pub struct CurrentPanel {
    pub time: String,
    pub label: String,
    pub severity: Severity,
    pub style: &'static str,
    pub price_cents_kwh: f64,
    pub price_display: String,
    pub baking_cost_eur: f64,
    pub baking_cost_display: String,
    pub pct_vs_average: Option<f64>,
    pub pct_display: String,
}

/// "Selected day average" panel
#[derive(Debug, Serialize)]
pub struct AveragePanel {
    pub label: String,
    pub severity: Severity,
    pub style: &'static str,
    pub avg_price_cents_kwh: f64,
    pub avg_price_display: String,
    pub avg_baking_cost_eur: f64,
    pub avg_baking_cost_display: String,
}

/// One chart or table entry, in cents/kWh
#[derive(Debug, Serialize)]
pub struct SeriesPoint {
    pub time: String,
    pub cents_kwh: f64,
}

/// Handle /api/advice endpoint
///
/// Recomputes the whole page payload from the cached table on every call:
/// recommendation panels, chart series and the ranked hour tables.
pub async fn get_advice(
    State(state): State<AppState>,
    Query(params): Query<AdviceParams>,
) -> Result<Json<AdviceResponse>, AppError> {
    let start = Instant::now();

    let result = build_advice(&state, params);

    match &result {
        Ok(response) => {
            metrics::record_request("/api/advice", "ok");
            tracing::info!(
                market = %response.market,
                date = %response.date,
                hours = response.hours,
                duration_ms = start.elapsed().as_millis() as u64,
                "advice computed"
            );
        }
        Err(err) => {
            metrics::record_request("/api/advice", "error");
            metrics::record_error(error_type_name(err));
            tracing::warn!(error = %err, "advice request failed");
        }
    }
    metrics::record_duration("/api/advice", start.elapsed());

    result.map(Json)
}

fn build_advice(state: &AppState, params: AdviceParams) -> Result<AdviceResponse, AppError> {
    let table = state.tables.get_or_load(&state.config.data.gold_path)?;

    let market = match params.market {
        Some(market) => market,
        None => table
            .default_market(&state.config.data.default_market)
            .ok_or_else(|| AppError::DataFormat("table has no market columns".to_string()))?
            .to_string(),
    };

    let date = match params.date {
        Some(raw) => parse_date(&raw)?,
        None => table
            .latest_date()
            .ok_or_else(|| AppError::DataFormat("table has no rows".to_string()))?,
    };

    let hours = params
        .hours
        .unwrap_or(state.config.baking.default_extreme_hours);

    let slice = advisor::select_slice(&table, &market, date)?;
    let kwh = slice.to_kwh();

    let latest = kwh.latest_hour();
    let daily_avg = kwh.daily_average();
    let (low, high) = kwh.thresholds();

    let reco_now = advisor::recommend(latest.price, low, high, &state.config.baking);
    let reco_day = advisor::recommend(daily_avg, low, high, &state.config.baking);
    let pct_vs_average = advisor::percent_delta(latest.price, daily_avg);

    let (cheapest, priciest) = kwh.rank_extremes(hours)?;

    Ok(AdviceResponse {
        market: kwh.market.clone(),
        date: date.format("%Y-%m-%d").to_string(),
        hours,
        current: CurrentPanel {
            time: format_time(&latest),
            label: reco_now.label.to_string(),
            severity: reco_now.severity,
            style: reco_now.severity.style(),
            price_cents_kwh: latest.price * 100.0,
            price_display: format!("{:.2} cents/kWh", latest.price * 100.0),
            baking_cost_eur: reco_now.baking_cost,
            baking_cost_display: format!("€{:.2}", reco_now.baking_cost),
            pct_vs_average,
            pct_display: match pct_vs_average {
                Some(pct) => format!("{:+.1}% vs daily average", pct),
                None => "N/A vs daily average".to_string(),
            },
        },
        average: AveragePanel {
            label: reco_day.label.to_string(),
            severity: reco_day.severity,
            style: reco_day.severity.style(),
            avg_price_cents_kwh: daily_avg * 100.0,
            avg_price_display: format!("{:.2} cents/kWh", daily_avg * 100.0),
            avg_baking_cost_eur: reco_day.baking_cost,
            avg_baking_cost_display: format!("€{:.2}", reco_day.baking_cost),
        },
        series: to_series(&kwh),
        cheapest: to_points(&cheapest),
        priciest: to_points(&priciest),
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadDate(raw.to_string()))
}

fn format_time(point: &PricePoint) -> String {
    point.ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn to_series(slice: &DaySlice) -> Vec<SeriesPoint> {
    to_points(slice.points())
}

fn to_points(points: &[PricePoint]) -> Vec<SeriesPoint> {
    points
        .iter()
        .map(|p| SeriesPoint {
            time: format_time(p),
            cents_kwh: p.price * 100.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::table::TableCache;
    use std::io::Write;
    use std::sync::Arc;

    fn create_test_state(csv: &str) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gold.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(csv.as_bytes()).unwrap();

        let mut config = Config::default();
        config.data.gold_path = path;

        let state = AppState {
            config: Arc::new(config),
            tables: Arc::new(TableCache::new()),
        };
        (dir, state)
    }

    const GOLD: &str = "\
date_cet,netherlands_nl,germany_de
2024-03-01 00:00:00,20.0,30.0
2024-03-01 01:00:00,40.0,30.0
2024-03-01 02:00:00,60.0,30.0
2024-03-02 00:00:00,50.0,30.0
";

    #[test]
    fn test_build_advice_defaults() {
        let (_dir, state) = create_test_state(GOLD);

        let response = build_advice(
            &state,
            AdviceParams {
                market: None,
                date: None,
                hours: None,
            },
        )
        .unwrap();

        // Defaults: configured market, most recent date, three extreme hours
        assert_eq!(response.market, "netherlands_nl");
        assert_eq!(response.date, "2024-03-02");
        assert_eq!(response.hours, 3);
        assert_eq!(response.series.len(), 1);
        assert_eq!(response.current.price_cents_kwh, 5.0);
    }

    #[test]
    fn test_build_advice_selected_day() {
        let (_dir, state) = create_test_state(GOLD);

        let response = build_advice(
            &state,
            AdviceParams {
                market: Some("netherlands_nl".to_string()),
                date: Some("2024-03-01".to_string()),
                hours: Some(2),
            },
        )
        .unwrap();

        // Latest hour 60 €/MWh = 6 cents/kWh, average of 20/40/60 = 4 cents
        assert_eq!(response.current.price_cents_kwh, 6.0);
        assert_eq!(response.average.avg_price_cents_kwh, 4.0);
        let pct = response.current.pct_vs_average.unwrap();
        assert!((pct - 50.0).abs() < 1e-9);
        assert_eq!(response.current.pct_display, "+50.0% vs daily average");

        // 60 €/MWh is above the day's 66th percentile
        assert_eq!(response.current.severity, Severity::Unfavorable);
        assert_eq!(response.current.style, "error");

        assert_eq!(response.series.len(), 3);
        assert_eq!(response.cheapest.len(), 2);
        assert_eq!(response.cheapest[0].cents_kwh, 2.0);
        assert_eq!(response.priciest[0].cents_kwh, 6.0);
    }

    #[test]
    fn test_build_advice_flat_day_pct_display() {
        let (_dir, state) = create_test_state(
            "\
date_cet,netherlands_nl
2024-03-01 00:00:00,0.0
2024-03-01 01:00:00,0.0
",
        );

        let response = build_advice(
            &state,
            AdviceParams {
                market: None,
                date: None,
                hours: None,
            },
        )
        .unwrap();

        // Zero average: the delta is absent rather than non-finite
        assert_eq!(response.current.pct_vs_average, None);
        assert_eq!(response.current.pct_display, "N/A vs daily average");
        // Flat day classifies favorable
        assert_eq!(response.current.severity, Severity::Favorable);
    }

    #[test]
    fn test_build_advice_rejects_bad_inputs() {
        let (_dir, state) = create_test_state(GOLD);

        assert!(matches!(
            build_advice(
                &state,
                AdviceParams {
                    market: Some("atlantis_at".to_string()),
                    date: None,
                    hours: None,
                },
            ),
            Err(AppError::UnknownMarket(_))
        ));

        assert!(matches!(
            build_advice(
                &state,
                AdviceParams {
                    market: None,
                    date: Some("yesterday".to_string()),
                    hours: None,
                },
            ),
            Err(AppError::BadDate(_))
        ));

        assert!(matches!(
            build_advice(
                &state,
                AdviceParams {
                    market: None,
                    date: None,
                    hours: Some(0),
                },
            ),
            Err(AppError::InvalidHourCount(0))
        ));

        assert!(matches!(
            build_advice(
                &state,
                AdviceParams {
                    market: Some("germany_de".to_string()),
                    date: Some("2024-07-01".to_string()),
                    hours: None,
                },
            ),
            Err(AppError::EmptySlice { .. })
        ));
    }
}
