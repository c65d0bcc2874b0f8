//! Ranked, human-readable observations about the latest months.

use crate::compare::{month_over_month_change, year_over_year_change};
use crate::error::MetricsError;
use crate::format::{format_change, format_currency};
use crate::models::{InsightKind, InsightRecord, Metric, MonthlyRecord};
use crate::window::{latest_three_month_average, three_month_change_percentage};

const MIN_MONTHS: usize = 2;
const MONTHS_PER_YEAR: usize = 12;

/// Builds three-month, year-over-year and month-over-month insights for new customers
/// and total revenue, sorted by priority.
///
/// Year-over-year insights are only emitted for series longer than twelve months.
pub fn generate_insights(series: &[MonthlyRecord]) -> Result<Vec<InsightRecord>, MetricsError> {
    if series.len() < MIN_MONTHS {
        return Err(MetricsError::InsufficientData {
            required: MIN_MONTHS,
            actual: series.len(),
        });
    }
    let last = series.len() - 1;
    let current = &series[last];
    let previous = &series[last - 1];

    let mut insights = Vec::with_capacity(6);

    let change = three_month_change_percentage(series, Metric::NewCustomers)?;
    let average = latest_three_month_average(series, Metric::NewCustomers)?;
    insights.push(insight(
        InsightKind::ThreeMonthComparison,
        Metric::NewCustomers,
        format!("{:.0}", average.round()),
        change,
        format!(
            "Average monthly new customers over the last 3 months {} by {}% compared to the previous 3 months.",
            direction(change),
            format_change(change.abs())
        ),
    ));

    let change = three_month_change_percentage(series, Metric::TotalRevenue)?;
    let average = latest_three_month_average(series, Metric::TotalRevenue)?;
    insights.push(insight(
        InsightKind::ThreeMonthComparison,
        Metric::TotalRevenue,
        format_currency(average),
        change,
        format!(
            "Average monthly revenue over the last 3 months {} by {}% compared to the previous 3 months.",
            direction(change),
            format_change(change.abs())
        ),
    ));

    if series.len() > MONTHS_PER_YEAR {
        let change = year_over_year_change(series, last, Metric::NewCustomers)?;
        insights.push(insight(
            InsightKind::YearOverYear,
            Metric::NewCustomers,
            current.new_customers.to_string(),
            change,
            format!(
                "New customer acquisition is {} {}% compared to the same month last year.",
                trend(change),
                format_change(change.abs())
            ),
        ));

        let change = year_over_year_change(series, last, Metric::TotalRevenue)?;
        insights.push(insight(
            InsightKind::YearOverYear,
            Metric::TotalRevenue,
            format_currency(current.total_revenue),
            change,
            format!(
                "Total revenue is {} {}% compared to the same month last year.",
                trend(change),
                format_change(change.abs())
            ),
        ));
    }

    let change = month_over_month_change(
        current.new_customers as f64,
        previous.new_customers as f64,
    );
    insights.push(insight(
        InsightKind::MonthOverMonth,
        Metric::NewCustomers,
        current.new_customers.to_string(),
        change,
        format!(
            "New customers {} by {}% from last month.",
            direction(change),
            format_change(change.abs())
        ),
    ));

    let change = month_over_month_change(current.total_revenue, previous.total_revenue);
    insights.push(insight(
        InsightKind::MonthOverMonth,
        Metric::TotalRevenue,
        format_currency(current.total_revenue),
        change,
        format!(
            "Total revenue {} by {}% from last month.",
            direction(change),
            format_change(change.abs())
        ),
    ));

    insights.sort_by_key(|insight| insight.priority);
    Ok(insights)
}

fn insight(
    kind: InsightKind,
    metric: Metric,
    value: String,
    change: f64,
    text: String,
) -> InsightRecord {
    InsightRecord {
        kind,
        metric: metric.label().to_string(),
        value,
        change: format_change(change),
        is_positive: change >= 0.0,
        priority: kind.priority(),
        text,
    }
}

fn direction(change: f64) -> &'static str {
    if change >= 0.0 { "increased" } else { "decreased" }
}

fn trend(change: f64) -> &'static str {
    if change >= 0.0 { "up" } else { "down" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{flat, series};

    #[test]
    fn short_series_is_rejected() {
        assert_eq!(
            generate_insights(&flat(1)),
            Err(MetricsError::InsufficientData {
                required: 2,
                actual: 1
            })
        );
        assert!(generate_insights(&[]).is_err());
    }

    #[test]
    fn twelve_months_produce_four_insights() {
        for len in [2, 6, 12] {
            let insights = generate_insights(&flat(len)).unwrap();
            assert_eq!(insights.len(), 4, "len {len}");
            assert!(insights.iter().all(|i| i.kind != InsightKind::YearOverYear));
        }
    }

    #[test]
    fn thirteen_months_add_year_over_year() {
        let insights = generate_insights(&flat(13)).unwrap();
        assert_eq!(insights.len(), 6);
        let kinds: Vec<InsightKind> = insights.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            [
                InsightKind::ThreeMonthComparison,
                InsightKind::ThreeMonthComparison,
                InsightKind::YearOverYear,
                InsightKind::YearOverYear,
                InsightKind::MonthOverMonth,
                InsightKind::MonthOverMonth,
            ]
        );
        assert!(insights.windows(2).all(|w| w[0].priority <= w[1].priority));
        assert_eq!(insights[0].metric, "New Customers");
        assert_eq!(insights[1].metric, "Total Revenue");
    }

    #[test]
    fn year_over_year_insight_reports_decline() {
        let mut customers = vec![100; 13];
        customers[0] = 120;
        customers[12] = 115;
        let insights = generate_insights(&series(&customers, &vec![1000.0; 13])).unwrap();
        let yoy = &insights[2];
        assert_eq!(yoy.kind, InsightKind::YearOverYear);
        assert_eq!(yoy.value, "115");
        assert_eq!(yoy.change, "-4.2");
        assert!(!yoy.is_positive);
        assert_eq!(
            yoy.text,
            "New customer acquisition is down 4.2% compared to the same month last year."
        );
    }

    #[test]
    fn texts_follow_change_direction() {
        let data = series(
            &[100, 100, 100, 200, 200, 150],
            &[100.0, 100.0, 100.0, 200.0, 200.0, 200.0],
        );
        let insights = generate_insights(&data).unwrap();

        assert_eq!(insights[0].value, "183");
        assert_eq!(insights[1].value, "$200");
        assert_eq!(insights[1].change, "100.0");
        assert_eq!(
            insights[1].text,
            "Average monthly revenue over the last 3 months increased by 100.0% compared to the previous 3 months."
        );

        let mom_customers = &insights[2];
        assert_eq!(mom_customers.kind, InsightKind::MonthOverMonth);
        assert_eq!(mom_customers.change, "-25.0");
        assert!(!mom_customers.is_positive);
        assert_eq!(mom_customers.text, "New customers decreased by 25.0% from last month.");

        let mom_revenue = &insights[3];
        assert_eq!(mom_revenue.change, "0.0");
        assert!(mom_revenue.is_positive);
        assert_eq!(mom_revenue.text, "Total revenue increased by 0.0% from last month.");
    }

    #[test]
    fn three_month_average_rounds_half_up() {
        let insights = generate_insights(&series(&[100, 101], &[1.0, 1.0])).unwrap();
        assert_eq!(insights[0].metric, "New Customers");
        assert_eq!(insights[0].value, "101");
    }
}
