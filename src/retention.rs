use crate::compare::{latest, retention_rate};
use crate::error::MetricsError;
use crate::models::{MonthlyRecord, RetentionImpact};

/// Retention rate for every month; the first month has no predecessor and reads `0.0`.
pub fn retention_rates(series: &[MonthlyRecord]) -> Vec<f64> {
    (0..series.len())
        .map(|index| retention_rate(series, index).unwrap_or(0.0))
        .collect()
}

/// Three-point trailing mean. The first two points pass through unchanged.
pub fn retention_moving_average(rates: &[f64]) -> Vec<f64> {
    rates
        .iter()
        .enumerate()
        .map(|(index, &rate)| {
            if index < 2 {
                rate
            } else {
                rates[index - 2..=index].iter().sum::<f64>() / 3.0
            }
        })
        .collect()
}

/// Mean retention rate, skipping the first month.
pub fn average_retention_rate(series: &[MonthlyRecord]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let rates = retention_rates(series);
    rates[1..].iter().sum::<f64>() / (rates.len() - 1) as f64
}

/// Revenue gained in the latest month if retention improved by `improvement_pct` points.
pub fn retention_impact(
    series: &[MonthlyRecord],
    improvement_pct: f64,
) -> Result<RetentionImpact, MetricsError> {
    let current = latest(series)?;
    let current_rate = retention_rate(series, series.len() - 1)?;
    let retention_revenue_portion = if current.total_customers == 0 {
        0.0
    } else {
        current.total_revenue * current.returning_customers as f64
            / current.total_customers as f64
    };

    Ok(RetentionImpact {
        current_rate,
        improved_rate: current_rate + improvement_pct,
        retention_revenue_portion,
        additional_revenue: retention_revenue_portion * improvement_pct / 100.0,
    })
}
