use std::collections::BTreeMap;

use crate::error::MetricsError;
use crate::models::{MonthLabel, MonthlyRecord, QuarterSummary};

#[derive(Default)]
struct QuarterTotals {
    months: usize,
    total_revenue: f64,
    total_customers: u64,
    new_customers: u64,
    returning_customers: u64,
}

/// Groups months into calendar quarters, ordered by (year, quarter).
///
/// Quarters with fewer than three months are still returned; see
/// [`QuarterSummary::is_partial`].
pub fn quarterly_rollup(series: &[MonthlyRecord]) -> Result<Vec<QuarterSummary>, MetricsError> {
    let mut quarters: BTreeMap<(i32, u8), QuarterTotals> = BTreeMap::new();

    for record in series {
        let label = MonthLabel::parse(&record.month)?;
        let entry = quarters.entry((label.year, label.quarter())).or_default();
        entry.months += 1;
        entry.total_revenue += record.total_revenue;
        entry.total_customers += record.total_customers;
        entry.new_customers += record.new_customers;
        entry.returning_customers += record.returning_customers;
    }

    let summaries = quarters
        .into_iter()
        .map(|((year, quarter_number), totals)| {
            let months = totals.months as f64;
            QuarterSummary {
                quarter: format!("Q{quarter_number} {year}"),
                year,
                quarter_number,
                months: totals.months,
                total_revenue: totals.total_revenue,
                total_customers: totals.total_customers,
                new_customers: totals.new_customers,
                returning_customers: totals.returning_customers,
                avg_monthly_revenue: totals.total_revenue / months,
                avg_monthly_new_customers: totals.new_customers as f64 / months,
                avg_monthly_total_customers: totals.total_customers as f64 / months,
            }
        })
        .collect();

    Ok(summaries)
}
