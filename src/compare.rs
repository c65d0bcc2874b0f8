//! Point-in-time comparisons between two months of a series.
//!
//! Every lookup is a positional offset into the series, so callers must pass
//! contiguous months in ascending order (see [`crate::loader::ensure_contiguous`]).
//! Missing history degrades to `0.0` rather than an error.

use crate::error::MetricsError;
use crate::format::format_change;
use crate::models::{CustomerValue, Metric, MonthLabel, MonthlyRecord, YoyRow};

const MONTHS_PER_YEAR: usize = 12;
const NEW_CUSTOMER_MOM_ALERT_PCT: f64 = 20.0;
const NEW_CUSTOMER_YOY_ALERT_PCT: f64 = 25.0;

/// Percentage change from `previous` to `current`; `0.0` when `previous` is zero.
pub fn month_over_month_change(current: f64, previous: f64) -> f64 {
    percent_change(current, previous)
}

/// Percentage change of `metric` at `index` against the record twelve positions earlier.
pub fn year_over_year_change(
    series: &[MonthlyRecord],
    index: usize,
    metric: Metric,
) -> Result<f64, MetricsError> {
    if index < MONTHS_PER_YEAR {
        return Ok(0.0);
    }
    let current = record_at(series, index)?;
    let previous_year = &series[index - MONTHS_PER_YEAR];
    Ok(percent_change(
        metric.value(current),
        metric.value(previous_year),
    ))
}

/// Share of last month's total customers that came back as returning customers at `index`.
pub fn retention_rate(series: &[MonthlyRecord], index: usize) -> Result<f64, MetricsError> {
    let current = record_at(series, index)?;
    if index == 0 {
        return Ok(0.0);
    }
    let previous_total = series[index - 1].total_customers;
    if previous_total == 0 {
        return Ok(0.0);
    }
    Ok(current.returning_customers as f64 / previous_total as f64 * 100.0)
}

/// Month-over-month change for each consecutive pair; `series.len() - 1` values.
pub fn month_over_month_series(series: &[MonthlyRecord], metric: Metric) -> Vec<f64> {
    series
        .windows(2)
        .map(|pair| month_over_month_change(metric.value(&pair[1]), metric.value(&pair[0])))
        .collect()
}

pub fn latest(series: &[MonthlyRecord]) -> Result<&MonthlyRecord, MetricsError> {
    series.last().ok_or(MetricsError::EmptySeries)
}

pub fn previous(series: &[MonthlyRecord]) -> Result<&MonthlyRecord, MetricsError> {
    match series.len() {
        0 | 1 => Err(MetricsError::InsufficientData {
            required: 2,
            actual: series.len(),
        }),
        len => Ok(&series[len - 2]),
    }
}

pub fn same_month_last_year(series: &[MonthlyRecord]) -> Option<&MonthlyRecord> {
    if series.len() <= MONTHS_PER_YEAR {
        return None;
    }
    series.get(series.len() - MONTHS_PER_YEAR - 1)
}

/// Latest month against the same month a year earlier, one row per metric.
pub fn year_over_year_table(series: &[MonthlyRecord], metrics: &[Metric]) -> Option<Vec<YoyRow>> {
    let last_year = same_month_last_year(series)?;
    let current = series.last()?;
    let rows = metrics
        .iter()
        .map(|&metric| {
            let current = metric.value(current);
            let last_year = metric.value(last_year);
            YoyRow {
                metric,
                current,
                last_year,
                change: percent_change(current, last_year),
            }
        })
        .collect();
    Some(rows)
}

/// Mean of `metric` over every record in the same calendar month as the latest record.
pub fn seasonal_average(series: &[MonthlyRecord], metric: Metric) -> Result<f64, MetricsError> {
    let month = MonthLabel::parse(&latest(series)?.month)?.month;
    let mut matching = Vec::new();
    for record in series {
        if MonthLabel::parse(&record.month)?.month == month {
            matching.push(metric.value(record));
        }
    }
    Ok(matching.iter().sum::<f64>() / matching.len() as f64)
}

/// New customers as a percentage of the month's total customers.
pub fn new_customer_share(record: &MonthlyRecord) -> f64 {
    if record.total_customers == 0 {
        return 0.0;
    }
    record.new_customers as f64 / record.total_customers as f64 * 100.0
}

pub fn revenue_per_new_customer(record: &MonthlyRecord) -> f64 {
    if record.new_customers == 0 {
        return 0.0;
    }
    record.new_customer_revenue / record.new_customers as f64
}

pub fn revenue_per_returning_customer(record: &MonthlyRecord) -> f64 {
    if record.returning_customers == 0 {
        return 0.0;
    }
    record.returning_customer_revenue / record.returning_customers as f64
}

/// Per-customer revenue of both cohorts for the latest two months.
///
/// `returning_premium` is what the latest month's returning customers brought in
/// beyond what the same number of new customers would have spent.
pub fn customer_value(series: &[MonthlyRecord]) -> Result<CustomerValue, MetricsError> {
    let current = latest(series)?;
    let previous = previous(series)?;
    let new_customer = revenue_per_new_customer(current);
    let returning_customer = revenue_per_returning_customer(current);

    Ok(CustomerValue {
        new_customer,
        returning_customer,
        previous_new_customer: revenue_per_new_customer(previous),
        previous_returning_customer: revenue_per_returning_customer(previous),
        returning_premium: (returning_customer - new_customer)
            * current.returning_customers as f64,
    })
}

/// Month-over-month change in revenue per new customer.
pub fn new_customer_value_change(series: &[MonthlyRecord]) -> Result<f64, MetricsError> {
    let value = customer_value(series)?;
    Ok(month_over_month_change(
        value.new_customer,
        value.previous_new_customer,
    ))
}

/// A warning when new customers moved more than 20% month-over-month or more than
/// 25% year-over-year. The month-over-month swing is reported first.
pub fn new_customer_alert(series: &[MonthlyRecord]) -> Result<Option<String>, MetricsError> {
    let current = latest(series)?;
    let previous = previous(series)?;
    let mom = month_over_month_change(
        current.new_customers as f64,
        previous.new_customers as f64,
    );
    if mom.abs() > NEW_CUSTOMER_MOM_ALERT_PCT {
        return Ok(Some(significant_change(mom, "month-over-month")));
    }

    let yoy = year_over_year_change(series, series.len() - 1, Metric::NewCustomers)?;
    if yoy.abs() > NEW_CUSTOMER_YOY_ALERT_PCT {
        return Ok(Some(significant_change(yoy, "year-over-year")));
    }
    Ok(None)
}

fn significant_change(change: f64, period: &str) -> String {
    format!(
        "Significant {} ({}%) in new customers {}.",
        if change > 0.0 { "increase" } else { "decrease" },
        format_change(change.abs()),
        period
    )
}

pub(crate) fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

pub(crate) fn record_at(
    series: &[MonthlyRecord],
    index: usize,
) -> Result<&MonthlyRecord, MetricsError> {
    series.get(index).ok_or(MetricsError::IndexOutOfRange {
        index,
        len: series.len(),
    })
}
