use std::fmt;
use std::str::FromStr;

use chrono::Month;
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    pub month: String,
    pub new_customers: u64,
    pub new_customer_revenue: f64,
    pub new_customer_revenue_percentage: f64,
    pub returning_customers: u64,
    pub returning_customer_revenue_percentage: f64,
    pub returning_customer_revenue: f64,
    pub total_customers: u64,
    pub total_revenue: f64,
    pub average_revenue_per_customer: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    NewCustomers,
    ReturningCustomers,
    TotalCustomers,
    NewCustomerRevenue,
    ReturningCustomerRevenue,
    TotalRevenue,
    NewCustomerRevenuePercentage,
    ReturningCustomerRevenuePercentage,
    AverageRevenuePerCustomer,
}

impl Metric {
    pub fn value(self, record: &MonthlyRecord) -> f64 {
        match self {
            Metric::NewCustomers => record.new_customers as f64,
            Metric::ReturningCustomers => record.returning_customers as f64,
            Metric::TotalCustomers => record.total_customers as f64,
            Metric::NewCustomerRevenue => record.new_customer_revenue,
            Metric::ReturningCustomerRevenue => record.returning_customer_revenue,
            Metric::TotalRevenue => record.total_revenue,
            Metric::NewCustomerRevenuePercentage => record.new_customer_revenue_percentage,
            Metric::ReturningCustomerRevenuePercentage => {
                record.returning_customer_revenue_percentage
            }
            Metric::AverageRevenuePerCustomer => record.average_revenue_per_customer,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::NewCustomers => "New Customers",
            Metric::ReturningCustomers => "Returning Customers",
            Metric::TotalCustomers => "Total Customers",
            Metric::NewCustomerRevenue => "New Customer Revenue",
            Metric::ReturningCustomerRevenue => "Returning Customer Revenue",
            Metric::TotalRevenue => "Total Revenue",
            Metric::NewCustomerRevenuePercentage => "New Customer Revenue %",
            Metric::ReturningCustomerRevenuePercentage => "Returning Customer Revenue %",
            Metric::AverageRevenuePerCustomer => "Avg Revenue per Customer",
        }
    }

    pub fn field_name(self) -> &'static str {
        match self {
            Metric::NewCustomers => "newCustomers",
            Metric::ReturningCustomers => "returningCustomers",
            Metric::TotalCustomers => "totalCustomers",
            Metric::NewCustomerRevenue => "newCustomerRevenue",
            Metric::ReturningCustomerRevenue => "returningCustomerRevenue",
            Metric::TotalRevenue => "totalRevenue",
            Metric::NewCustomerRevenuePercentage => "newCustomerRevenuePercentage",
            Metric::ReturningCustomerRevenuePercentage => "returningCustomerRevenuePercentage",
            Metric::AverageRevenuePerCustomer => "averageRevenuePerCustomer",
        }
    }

    pub fn is_currency(self) -> bool {
        matches!(
            self,
            Metric::NewCustomerRevenue
                | Metric::ReturningCustomerRevenue
                | Metric::TotalRevenue
                | Metric::AverageRevenuePerCustomer
        )
    }

    pub const ALL: [Metric; 9] = [
        Metric::NewCustomers,
        Metric::ReturningCustomers,
        Metric::TotalCustomers,
        Metric::NewCustomerRevenue,
        Metric::ReturningCustomerRevenue,
        Metric::TotalRevenue,
        Metric::NewCustomerRevenuePercentage,
        Metric::ReturningCustomerRevenuePercentage,
        Metric::AverageRevenuePerCustomer,
    ];
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.field_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A parsed "January 2024" style month label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthLabel {
    pub month: Month,
    pub year: i32,
}

impl MonthLabel {
    pub fn parse(label: &str) -> Result<Self, MetricsError> {
        let malformed = || MetricsError::MalformedMonth(label.to_string());
        let mut parts = label.split_whitespace();
        let month = parts
            .next()
            .and_then(|name| name.parse::<Month>().ok())
            .ok_or_else(malformed)?;
        let year = parts
            .next()
            .and_then(|year| year.parse::<i32>().ok())
            .ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(Self { month, year })
    }

    /// Calendar quarter, 1 through 4.
    pub fn quarter(&self) -> u8 {
        (self.month.number_from_month() as u8 - 1) / 3 + 1
    }

    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + self.month.number_from_month() as i64 - 1
    }

    /// Compact label such as "Jan 24".
    pub fn short(&self) -> String {
        let name = self.month.name();
        format!("{} {:02}", &name[..3], self.year.rem_euclid(100))
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month.name(), self.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    ThreeMonthComparison,
    YearOverYear,
    MonthOverMonth,
}

impl InsightKind {
    pub fn priority(self) -> u8 {
        match self {
            InsightKind::ThreeMonthComparison => 1,
            InsightKind::YearOverYear => 2,
            InsightKind::MonthOverMonth => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRecord {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub metric: String,
    pub value: String,
    pub change: String,
    pub is_positive: bool,
    pub priority: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterSummary {
    pub quarter: String,
    pub year: i32,
    pub quarter_number: u8,
    pub months: usize,
    pub total_revenue: f64,
    pub total_customers: u64,
    pub new_customers: u64,
    pub returning_customers: u64,
    pub avg_monthly_revenue: f64,
    pub avg_monthly_new_customers: f64,
    pub avg_monthly_total_customers: f64,
}

impl QuarterSummary {
    pub fn is_partial(&self) -> bool {
        self.months < 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YoyRow {
    pub metric: Metric,
    pub current: f64,
    pub last_year: f64,
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerValue {
    pub new_customer: f64,
    pub returning_customer: f64,
    pub previous_new_customer: f64,
    pub previous_returning_customer: f64,
    pub returning_premium: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetentionImpact {
    pub current_rate: f64,
    pub improved_rate: f64,
    pub retention_revenue_portion: f64,
    pub additional_revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub background: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::MonthlyRecord;

    const MONTHS: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    pub fn record(month: &str, new_customers: u64, total_revenue: f64) -> MonthlyRecord {
        let returning_customers = 600;
        let new_customer_revenue = total_revenue * 0.15;
        MonthlyRecord {
            month: month.to_string(),
            new_customers,
            new_customer_revenue,
            new_customer_revenue_percentage: 15.0,
            returning_customers,
            returning_customer_revenue_percentage: 85.0,
            returning_customer_revenue: total_revenue - new_customer_revenue,
            total_customers: new_customers + returning_customers,
            total_revenue,
            average_revenue_per_customer: 600.0,
        }
    }

    pub fn series(new_customers: &[u64], revenue: &[f64]) -> Vec<MonthlyRecord> {
        new_customers
            .iter()
            .zip(revenue)
            .enumerate()
            .map(|(i, (&customers, &revenue))| {
                let label = format!("{} {}", MONTHS[i % 12], 2024 + i / 12);
                record(&label, customers, revenue)
            })
            .collect()
    }

    pub fn flat(len: usize) -> Vec<MonthlyRecord> {
        series(&vec![100; len], &vec![1000.0; len])
    }

    pub fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }
}
