use std::fmt::Write;

use serde::Serialize;

use crate::compare::{
    self, customer_value, month_over_month_change, new_customer_alert, new_customer_share,
    new_customer_value_change, year_over_year_change,
};
use crate::error::MetricsError;
use crate::format::{format_count, format_currency, format_percentage, format_signed_change};
use crate::insights::generate_insights;
use crate::models::{Metric, MonthLabel, MonthlyRecord};
use crate::quarterly::quarterly_rollup;
use crate::retention::{average_retention_rate, retention_impact};
use crate::window::{
    latest_three_month_average, previous_three_month_window, three_month_aggregate,
    three_month_change_percentage, three_month_window, three_month_yoy_change_percentage,
    trailing_average,
};

const HEATMAP_METRICS: [Metric; 5] = [
    Metric::TotalCustomers,
    Metric::TotalRevenue,
    Metric::NewCustomers,
    Metric::ReturningCustomers,
    Metric::AverageRevenuePerCustomer,
];

const YOY_METRICS: [Metric; 5] = [
    Metric::NewCustomers,
    Metric::TotalRevenue,
    Metric::TotalCustomers,
    Metric::AverageRevenuePerCustomer,
    Metric::NewCustomerRevenuePercentage,
];

const IMPACT_IMPROVEMENT_PCT: f64 = 5.0;

/// Headline figures for the latest month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub month: String,
    pub total_customers: u64,
    pub total_revenue: f64,
    pub customers_mom: f64,
    pub revenue_mom: f64,
    pub customers_yoy: f64,
    pub revenue_yoy: f64,
    pub customers_three_month: f64,
    pub revenue_three_month: f64,
    pub retention_rate: f64,
}

impl KpiSummary {
    pub fn from_series(series: &[MonthlyRecord]) -> Result<Self, MetricsError> {
        let latest = compare::latest(series)?;
        let previous = compare::previous(series)?;
        let last = series.len() - 1;

        Ok(Self {
            month: latest.month.clone(),
            total_customers: latest.total_customers,
            total_revenue: latest.total_revenue,
            customers_mom: month_over_month_change(
                latest.total_customers as f64,
                previous.total_customers as f64,
            ),
            revenue_mom: month_over_month_change(latest.total_revenue, previous.total_revenue),
            customers_yoy: year_over_year_change(series, last, Metric::TotalCustomers)?,
            revenue_yoy: year_over_year_change(series, last, Metric::TotalRevenue)?,
            customers_three_month: three_month_change_percentage(series, Metric::TotalCustomers)?,
            revenue_three_month: three_month_change_percentage(series, Metric::TotalRevenue)?,
            retention_rate: compare::retention_rate(series, last)?,
        })
    }
}

pub fn format_value(metric: Metric, value: f64) -> String {
    if metric.is_currency() {
        format_currency(value)
    } else if metric == Metric::NewCustomerRevenuePercentage
        || metric == Metric::ReturningCustomerRevenuePercentage
    {
        format!("{value:.1}%")
    } else {
        format_count(value.round() as u64)
    }
}

fn window_span(window: &[MonthlyRecord]) -> String {
    match (window.first(), window.last()) {
        (Some(first), Some(last)) if first.month != last.month => {
            format!("{} to {}", first.month, last.month)
        }
        (Some(only), _) => only.month.clone(),
        _ => String::new(),
    }
}

pub fn build_report(client: Option<&str>, series: &[MonthlyRecord]) -> Result<String, MetricsError> {
    let kpis = KpiSummary::from_series(series)?;
    let last = series.len() - 1;

    let mut output = String::new();
    let client_label = client.unwrap_or("all clients");

    let _ = writeln!(output, "# Marketing Dashboard Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} to {}, {} months)",
        client_label,
        series[0].month,
        kpis.month,
        series.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Executive Summary");
    let _ = writeln!(
        output,
        "- Total customers: {} ({} MoM, {} YoY)",
        format_count(kpis.total_customers),
        format_signed_change(kpis.customers_mom),
        format_signed_change(kpis.customers_yoy)
    );
    let _ = writeln!(
        output,
        "- Total revenue: {} ({} MoM, {} YoY)",
        format_currency(kpis.total_revenue),
        format_signed_change(kpis.revenue_mom),
        format_signed_change(kpis.revenue_yoy)
    );
    let _ = writeln!(output, "- Retention rate: {:.1}%", kpis.retention_rate);
    let _ = writeln!(
        output,
        "- Revenue share: {} new, {} returning",
        format_percentage(series[last].new_customer_revenue_percentage),
        format_percentage(series[last].returning_customer_revenue_percentage)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Three-Month Comparison");
    let _ = writeln!(
        output,
        "Comparing {} with {}",
        window_span(three_month_window(series, last)?),
        window_span(previous_three_month_window(series, last)?)
    );
    for metric in [Metric::NewCustomers, Metric::TotalCustomers, Metric::TotalRevenue] {
        let _ = writeln!(
            output,
            "- {}: {} monthly average, {} vs previous 3 months, {} vs same period last year",
            metric,
            format_value(metric, latest_three_month_average(series, metric)?),
            format_signed_change(three_month_change_percentage(series, metric)?),
            format_signed_change(three_month_yoy_change_percentage(series, metric)?)
        );
    }
    let _ = writeln!(
        output,
        "- Revenue over the last 3 months: {}",
        format_currency(three_month_aggregate(series, Metric::TotalRevenue, last)?)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## New Customers");
    let latest = &series[last];
    let seasonal = compare::seasonal_average(series, Metric::NewCustomers)?;
    let month_name = MonthLabel::parse(&latest.month)?.month.name();
    let _ = writeln!(
        output,
        "- {} new customers in {}, {:.1}% of all customers",
        format_count(latest.new_customers),
        latest.month,
        new_customer_share(latest)
    );
    let _ = writeln!(
        output,
        "- 3-month average {:.0}, 12-month average {:.0}",
        latest_three_month_average(series, Metric::NewCustomers)?.round(),
        trailing_average(series, Metric::NewCustomers, 12)?.round()
    );
    let _ = writeln!(
        output,
        "- {} the {} average of {:.0}",
        if (latest.new_customers as f64) > seasonal { "Above" } else { "At or below" },
        month_name,
        seasonal.round()
    );
    let value = customer_value(series)?;
    let _ = writeln!(
        output,
        "- Revenue per new customer {} ({} MoM), per returning customer {}",
        format_currency(value.new_customer),
        format_signed_change(new_customer_value_change(series)?),
        format_currency(value.returning_customer)
    );
    let _ = writeln!(
        output,
        "- Previous month: {} per new customer, {} per returning customer",
        format_currency(value.previous_new_customer),
        format_currency(value.previous_returning_customer)
    );
    let _ = writeln!(
        output,
        "- Returning customers added {} beyond new-customer spending",
        format_currency(value.returning_premium)
    );
    if let Some(alert) = new_customer_alert(series)? {
        let _ = writeln!(output, "- Alert: {alert}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Year-over-Year");
    match compare::year_over_year_table(series, &YOY_METRICS) {
        Some(rows) => {
            let _ = writeln!(output, "| Metric | This year | Last year | Change |");
            let _ = writeln!(output, "|---|---|---|---|");
            for row in rows {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {} |",
                    row.metric,
                    format_value(row.metric, row.current),
                    format_value(row.metric, row.last_year),
                    format_signed_change(row.change)
                );
            }
        }
        None => {
            let _ = writeln!(
                output,
                "Year-over-year data not available. Need at least 13 months of data."
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Quarterly Performance");
    for quarter in quarterly_rollup(series)? {
        let partial = if quarter.is_partial() {
            format!(" (partial, {} months)", quarter.months)
        } else {
            String::new()
        };
        let _ = writeln!(
            output,
            "- {}{}: revenue {} (avg {} / month), avg {:.0} new customers / month",
            quarter.quarter,
            partial,
            format_currency(quarter.total_revenue),
            format_currency(quarter.avg_monthly_revenue),
            quarter.avg_monthly_new_customers.round()
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Retention");
    let impact = retention_impact(series, IMPACT_IMPROVEMENT_PCT)?;
    let _ = writeln!(
        output,
        "- Current retention rate: {:.1}% (average {:.1}%)",
        impact.current_rate,
        average_retention_rate(series)
    );
    let _ = writeln!(
        output,
        "- A {:.0} point improvement would add about {} per month",
        IMPACT_IMPROVEMENT_PCT,
        format_currency(impact.additional_revenue)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Month-over-Month Changes");
    let mut header = String::from("| Metric |");
    let mut divider = String::from("|---|");
    for record in &series[1..] {
        let label = MonthLabel::parse(&record.month)?;
        let _ = write!(header, " {} |", label.short());
        divider.push_str("---|");
    }
    let _ = writeln!(output, "{header}");
    let _ = writeln!(output, "{divider}");
    for metric in HEATMAP_METRICS {
        let _ = write!(output, "| {metric} |");
        for change in compare::month_over_month_series(series, metric) {
            let _ = write!(output, " {} |", format_signed_change(change));
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Insights");
    for insight in generate_insights(series)? {
        let _ = writeln!(output, "- {}", insight.text);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{approx, flat, series};

    #[test]
    fn kpis_compare_latest_months() {
        let mut revenue = vec![1000.0; 13];
        revenue[0] = 800.0;
        revenue[11] = 900.0;
        let data = series(&vec![100; 13], &revenue);
        let kpis = KpiSummary::from_series(&data).unwrap();
        assert_eq!(kpis.month, "January 2025");
        assert!(approx(kpis.revenue_mom, 100.0 / 9.0));
        assert!(approx(kpis.revenue_yoy, 25.0));
        assert!(approx(kpis.retention_rate, 600.0 / 700.0 * 100.0));
    }

    #[test]
    fn kpis_need_two_months() {
        assert!(KpiSummary::from_series(&flat(1)).is_err());
        assert_eq!(KpiSummary::from_series(&[]), Err(MetricsError::EmptySeries));
    }

    #[test]
    fn report_contains_every_section() {
        let report = build_report(Some("Alluraderm.com"), &flat(14)).unwrap();
        assert!(report.starts_with("# Marketing Dashboard Report"));
        assert!(report.contains("Generated for Alluraderm.com (January 2024 to February 2025, 14 months)"));
        for section in [
            "## Executive Summary",
            "## Three-Month Comparison",
            "## New Customers",
            "## Year-over-Year",
            "## Quarterly Performance",
            "## Retention",
            "## Month-over-Month Changes",
            "## Insights",
        ] {
            assert!(report.contains(section), "missing {section}");
        }
        assert!(report.contains("- Q1 2025 (partial, 2 months)"));
        assert!(report.contains("| Feb 25 |"));
        assert!(report.contains("- Revenue share: 15% new, 85% returning"));
        assert!(report.contains("Comparing December 2024 to February 2025 with September 2024 to November 2024"));
        assert!(report.contains("- 100 new customers in February 2025, 14.3% of all customers"));
        assert!(report.contains("- At or below the February average of 100"));
        assert!(report.contains("- Revenue per new customer $2 (+0.0% MoM), per returning customer $1"));
        assert!(report.contains("- Returning customers added -$50 beyond new-customer spending"));
        assert!(!report.contains("- Alert:"));
    }

    #[test]
    fn report_flags_new_customer_swings() {
        let data = series(&[100, 100, 100, 70], &[1000.0; 4]);
        let report = build_report(None, &data).unwrap();
        assert!(report.contains(
            "- Alert: Significant decrease (30.0%) in new customers month-over-month."
        ));
    }

    #[test]
    fn short_reports_explain_missing_year_over_year() {
        let report = build_report(None, &flat(4)).unwrap();
        assert!(report.contains("Generated for all clients"));
        assert!(report.contains("Year-over-year data not available."));
    }

    #[test]
    fn values_format_by_metric_kind() {
        assert_eq!(format_value(Metric::TotalRevenue, 474812.0), "$474,812");
        assert_eq!(format_value(Metric::TotalCustomers, 1768.0), "1,768");
        assert_eq!(format_value(Metric::NewCustomerRevenuePercentage, 16.0), "16.0%");
    }
}
