//! PriceAdvisor core: day slices, thresholds, recommendations, rankings.
//!
//! Everything here is a pure function of the loaded table and the user
//! selection; handlers recompute per request.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::config::BakingConfig;
use crate::error::AppError;
use crate::table::PriceTable;

/// Quantile of the day's prices below which an hour counts as cheap
pub const LOW_QUANTILE: f64 = 0.33;
/// Quantile of the day's prices above which an hour counts as expensive
pub const HIGH_QUANTILE: f64 = 0.66;

/// Bounds of the best/worst hours selector
pub const MIN_EXTREME_HOURS: usize = 1;
pub const MAX_EXTREME_HOURS: usize = 8;

pub const APPLE_PIE_LABEL: &str = "🥧 APPLE PIE TIME";
pub const CHEESECAKE_LABEL: &str = "🍰 CHEESECAKE TIME";
pub const FLEXIBLE_LABEL: &str = "🧁 FLEXIBLE BAKING HOUR";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub ts: NaiveDateTime,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUnit {
    EurPerMwh,
    EurPerKwh,
}

/// One market's priced hours on one calendar date, ordered by time.
///
/// Non-empty by construction: `select_slice` rejects empty results.
#[derive(Debug, Clone)]
pub struct DaySlice {
    pub market: String,
    pub date: NaiveDate,
    pub unit: PriceUnit,
    points: Vec<PricePoint>,
}

/// Filter the table to one market and calendar date, dropping missing prices.
///
/// The market is checked against the table's columns even though the UI
/// enumerates selectors from the table itself; the HTTP surface cannot trust
/// its callers.
pub fn select_slice(
    table: &PriceTable,
    market: &str,
    date: NaiveDate,
) -> Result<DaySlice, AppError> {
    let idx = table
        .market_index(market)
        .ok_or_else(|| AppError::UnknownMarket(market.to_string()))?;

    let points: Vec<PricePoint> = table
        .rows()
        .iter()
        .filter(|row| row.ts.date() == date)
        .filter_map(|row| {
            row.prices[idx].map(|price| PricePoint { ts: row.ts, price })
        })
        .collect();

    if points.is_empty() {
        return Err(AppError::EmptySlice {
            market: market.to_string(),
            date,
        });
    }

    Ok(DaySlice {
        market: market.to_string(),
        date,
        unit: PriceUnit::EurPerMwh,
        points,
    })
}

impl DaySlice {
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Convert wholesale €/MWh to €/kWh
    pub fn to_kwh(&self) -> DaySlice {
        debug_assert_eq!(self.unit, PriceUnit::EurPerMwh);

        DaySlice {
            market: self.market.clone(),
            date: self.date,
            unit: PriceUnit::EurPerKwh,
            points: self
                .points
                .iter()
                .map(|p| PricePoint {
                    ts: p.ts,
                    price: p.price / 1000.0,
                })
                .collect(),
        }
    }

    /// Latest available hour of the day
    pub fn latest_hour(&self) -> PricePoint {
        *self.points.last().expect("slice is non-empty by construction")
    }

    /// Arithmetic mean over the day's prices
    pub fn daily_average(&self) -> f64 {
        let sum: f64 = self.points.iter().map(|p| p.price).sum();
        sum / self.points.len() as f64
    }

    /// Cheap/expensive thresholds: the day's 33rd and 66th percentiles.
    ///
    /// Thresholds are local to the selected day, never global across history.
    pub fn thresholds(&self) -> (f64, f64) {
        let mut sorted: Vec<f64> = self.points.iter().map(|p| p.price).collect();
        sorted.sort_by(f64::total_cmp);

        (
            quantile(&sorted, LOW_QUANTILE),
            quantile(&sorted, HIGH_QUANTILE),
        )
    }

    /// The `n` cheapest hours ascending and `n` priciest descending.
    ///
    /// Both orderings are stable, so hours with equal prices keep their
    /// original time order.
    pub fn rank_extremes(
        &self,
        n: usize,
    ) -> Result<(Vec<PricePoint>, Vec<PricePoint>), AppError> {
        if !(MIN_EXTREME_HOURS..=MAX_EXTREME_HOURS).contains(&n) {
            return Err(AppError::InvalidHourCount(n));
        }

        let count = n.min(self.points.len());

        let mut cheapest = self.points.clone();
        cheapest.sort_by(|a, b| a.price.total_cmp(&b.price));
        cheapest.truncate(count);

        let mut priciest = self.points.clone();
        priciest.sort_by(|a, b| b.price.total_cmp(&a.price));
        priciest.truncate(count);

        Ok((cheapest, priciest))
    }
}

/// Linear-interpolation quantile between closest ranks.
///
/// `sorted` must be ascending and non-empty; `q` in [0, 1]. Matches the
/// pandas default, which the test vectors assume.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Favorable,
    Unfavorable,
    Neutral,
}

impl Severity {
    /// Presentation style for a recommendation panel, fixed mapping
    pub fn style(&self) -> &'static str {
        match self {
            Self::Favorable => "success",
            Self::Unfavorable => "error",
            Self::Neutral => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub label: &'static str,
    pub severity: Severity,
    pub baking_cost: f64,
}

/// Classify a price against the day's thresholds.
///
/// First match wins: the cheap branch is checked before the expensive one,
/// so on a flat day (low == high) a price equal to both classifies as
/// favorable.
pub fn recommend(
    price_kwh: f64,
    low: f64,
    high: f64,
    baking: &BakingConfig,
) -> Recommendation {
    let (label, severity) = if price_kwh <= low {
        (APPLE_PIE_LABEL, Severity::Favorable)
    } else if price_kwh >= high {
        (CHEESECAKE_LABEL, Severity::Unfavorable)
    } else {
        (FLEXIBLE_LABEL, Severity::Neutral)
    };

    Recommendation {
        label,
        severity,
        baking_cost: baking_cost(price_kwh, baking),
    }
}

/// Cost of one bake at the given price, in €
pub fn baking_cost(price_kwh: f64, baking: &BakingConfig) -> f64 {
    baking.bake_kwh() * price_kwh
}

/// Percent difference of `current` against `baseline`.
///
/// `None` when the baseline is exactly zero; the display layer renders that
/// as "N/A" instead of a non-finite number.
pub fn percent_delta(current: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 {
        return None;
    }
    Some((current - baseline) / baseline * 100.0)
}
