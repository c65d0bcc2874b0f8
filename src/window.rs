//! Rolling three-month windows over a monthly series.

use crate::compare::{percent_change, record_at};
use crate::error::MetricsError;
use crate::models::{Metric, MonthlyRecord};

const WINDOW: usize = 3;
const MONTHS_PER_YEAR: usize = 12;

/// Inclusive slice `[end_index - 2, end_index]`, shortened at the start of the series.
pub fn three_month_window(
    series: &[MonthlyRecord],
    end_index: usize,
) -> Result<&[MonthlyRecord], MetricsError> {
    record_at(series, end_index)?;
    let start = end_index.saturating_sub(WINDOW - 1);
    Ok(&series[start..=end_index])
}

pub fn previous_three_month_window(
    series: &[MonthlyRecord],
    end_index: usize,
) -> Result<&[MonthlyRecord], MetricsError> {
    record_at(series, end_index)?;
    three_month_window(series, end_index.saturating_sub(WINDOW))
}

pub fn three_month_average(
    series: &[MonthlyRecord],
    metric: Metric,
    end_index: usize,
) -> Result<f64, MetricsError> {
    let window = three_month_window(series, end_index)?;
    Ok(mean(window, metric))
}

pub fn latest_three_month_average(
    series: &[MonthlyRecord],
    metric: Metric,
) -> Result<f64, MetricsError> {
    let end_index = last_index(series)?;
    three_month_average(series, metric, end_index)
}

pub fn three_month_aggregate(
    series: &[MonthlyRecord],
    metric: Metric,
    end_index: usize,
) -> Result<f64, MetricsError> {
    let window = three_month_window(series, end_index)?;
    Ok(window.iter().map(|record| metric.value(record)).sum())
}

// 0.0 without a preceding month or when its average is zero.
pub fn three_month_change_percentage(
    series: &[MonthlyRecord],
    metric: Metric,
) -> Result<f64, MetricsError> {
    let end_index = last_index(series)?;
    if end_index < WINDOW {
        return Ok(0.0);
    }
    let current = three_month_average(series, metric, end_index)?;
    let previous = three_month_average(series, metric, end_index - WINDOW)?;
    Ok(percent_change(current, previous))
}

/// The same three months one year before the latest window; needs more than 15 months.
pub fn same_three_months_last_year(series: &[MonthlyRecord]) -> Option<&[MonthlyRecord]> {
    if series.len() <= MONTHS_PER_YEAR + WINDOW {
        return None;
    }
    let end_index = series.len() - 1 - MONTHS_PER_YEAR;
    three_month_window(series, end_index).ok()
}

pub fn three_month_yoy_change_percentage(
    series: &[MonthlyRecord],
    metric: Metric,
) -> Result<f64, MetricsError> {
    let current = latest_three_month_average(series, metric)?;
    let Some(last_year) = same_three_months_last_year(series) else {
        return Ok(0.0);
    };
    Ok(percent_change(current, mean(last_year, metric)))
}

pub fn trailing_average(
    series: &[MonthlyRecord],
    metric: Metric,
    months: usize,
) -> Result<f64, MetricsError> {
    if series.is_empty() {
        return Err(MetricsError::EmptySeries);
    }
    let start = series.len().saturating_sub(months.max(1));
    Ok(mean(&series[start..], metric))
}

fn mean(window: &[MonthlyRecord], metric: Metric) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|record| metric.value(record)).sum::<f64>() / window.len() as f64
}

fn last_index(series: &[MonthlyRecord]) -> Result<usize, MetricsError> {
    series.len().checked_sub(1).ok_or(MetricsError::EmptySeries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{approx, flat, series};

    fn revenue_series(revenue: &[f64]) -> Vec<MonthlyRecord> {
        series(&vec![100; revenue.len()], revenue)
    }

    #[test]
    fn windows_shrink_at_the_start() {
        let data = flat(5);
        assert_eq!(three_month_window(&data, 0).unwrap().len(), 1);
        assert_eq!(three_month_window(&data, 1).unwrap().len(), 2);
        let window = three_month_window(&data, 4).unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].month, "March 2024");
        assert_eq!(window[2].month, "May 2024");
        assert!(three_month_window(&data, 5).is_err());
    }

    #[test]
    fn previous_window_ends_three_months_earlier() {
        let data = flat(6);
        let window = previous_three_month_window(&data, 5).unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].month, "January 2024");
        assert_eq!(window[2].month, "March 2024");
        assert_eq!(previous_three_month_window(&data, 1).unwrap().len(), 1);
    }

    #[test]
    fn average_divides_by_actual_window_length() {
        let data = revenue_series(&[100.0, 200.0, 300.0, 400.0]);
        assert!(approx(three_month_average(&data, Metric::TotalRevenue, 0).unwrap(), 100.0));
        assert!(approx(three_month_average(&data, Metric::TotalRevenue, 1).unwrap(), 150.0));
        assert!(approx(three_month_average(&data, Metric::TotalRevenue, 3).unwrap(), 300.0));
        assert!(approx(latest_three_month_average(&data, Metric::TotalRevenue).unwrap(), 300.0));
        assert_eq!(
            latest_three_month_average(&[], Metric::TotalRevenue),
            Err(MetricsError::EmptySeries)
        );
    }

    #[test]
    fn aggregate_sums_the_window() {
        let data = revenue_series(&[100.0, 200.0, 300.0, 400.0]);
        assert!(approx(three_month_aggregate(&data, Metric::TotalRevenue, 3).unwrap(), 900.0));
        assert!(approx(three_month_aggregate(&data, Metric::TotalRevenue, 1).unwrap(), 300.0));
    }

    #[test]
    fn change_compares_consecutive_blocks() {
        let data = revenue_series(&[100.0, 100.0, 100.0, 200.0, 200.0, 200.0]);
        let change = three_month_change_percentage(&data, Metric::TotalRevenue).unwrap();
        assert!(approx(change, 100.0));
    }

    #[test]
    fn change_is_zero_without_a_previous_block() {
        let data = revenue_series(&[0.0, 0.0, 0.0, 200.0, 200.0, 200.0]);
        assert_eq!(three_month_change_percentage(&data, Metric::TotalRevenue), Ok(0.0));
        let short = revenue_series(&[100.0, 300.0, 500.0]);
        assert_eq!(three_month_change_percentage(&short, Metric::TotalRevenue), Ok(0.0));
    }

    #[test]
    fn change_with_short_history_uses_short_previous_window() {
        let data = revenue_series(&[100.0, 200.0, 200.0, 200.0]);
        let change = three_month_change_percentage(&data, Metric::TotalRevenue).unwrap();
        assert!(approx(change, 100.0));
    }

    #[test]
    fn three_month_yoy_needs_sixteen_months() {
        let data = flat(15);
        assert!(same_three_months_last_year(&data).is_none());
        assert_eq!(three_month_yoy_change_percentage(&data, Metric::TotalRevenue), Ok(0.0));
    }

    #[test]
    fn three_month_yoy_compares_windows_twelve_apart() {
        let mut revenue = vec![100.0; 16];
        revenue[13] = 150.0;
        revenue[14] = 150.0;
        revenue[15] = 150.0;
        let data = revenue_series(&revenue);
        let last_year = same_three_months_last_year(&data).unwrap();
        assert_eq!(last_year[0].month, "February 2024");
        assert_eq!(last_year[2].month, "April 2024");
        let change = three_month_yoy_change_percentage(&data, Metric::TotalRevenue).unwrap();
        assert!(approx(change, 50.0));
    }

    #[test]
    fn three_month_yoy_guards_zero_history() {
        let mut revenue = vec![0.0; 16];
        revenue[15] = 100.0;
        let data = revenue_series(&revenue);
        assert_eq!(three_month_yoy_change_percentage(&data, Metric::TotalRevenue), Ok(0.0));
    }

    #[test]
    fn trailing_average_caps_at_series_length() {
        let data = series(&[10, 20, 30, 40], &[1.0; 4]);
        assert!(approx(trailing_average(&data, Metric::NewCustomers, 2).unwrap(), 35.0));
        assert!(approx(trailing_average(&data, Metric::NewCustomers, 12).unwrap(), 25.0));
        assert!(trailing_average(&[], Metric::NewCustomers, 12).is_err());
    }
}
