use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;

use crate::error::{LoadError, MetricsError};
use crate::models::{MonthLabel, MonthlyRecord, Theme};

pub const DEFAULT_API_URL: &str =
    "https://dev2.brandrapdev.co/creports/wp-json/client-reports/v1/report";

#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub series: Vec<MonthlyRecord>,
    pub theme: Option<Theme>,
}

#[derive(Deserialize)]
struct ReportPayload {
    metrices: Option<Vec<MonthlyRecord>>,
    #[serde(rename = "primary-color")]
    primary_color: Option<String>,
    #[serde(rename = "secondary-color")]
    secondary_color: Option<String>,
    #[serde(rename = "background-color")]
    background_color: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeriesFile {
    Bare(Vec<MonthlyRecord>),
    Payload(ReportPayload),
}

pub fn report_url(base: &str, client: &str) -> Result<Url, LoadError> {
    Ok(Url::parse_with_params(base, &[("client_url", client)])?)
}

pub async fn fetch_report(
    http: &reqwest::Client,
    base: &str,
    client: &str,
) -> Result<LoadedReport, LoadError> {
    let url = report_url(base, client)?;
    tracing::debug!(%url, "requesting report");

    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status(status));
    }
    let text = response.text().await?;
    let report = parse_payload(&text)?;
    tracing::info!(client, months = report.series.len(), "fetched report");
    Ok(report)
}

pub fn parse_payload(text: &str) -> Result<LoadedReport, LoadError> {
    let payload: ReportPayload = serde_json::from_str(text)?;
    into_report(payload)
}

fn into_report(payload: ReportPayload) -> Result<LoadedReport, LoadError> {
    let series = payload.metrices.ok_or(LoadError::MissingMetrics)?;
    let theme = Theme {
        primary: payload.primary_color.map(hex_color),
        secondary: payload.secondary_color.map(hex_color),
        background: payload.background_color.map(hex_color),
    };
    let theme = if theme == Theme::default() {
        tracing::warn!("report payload carries no theme colors");
        None
    } else {
        Some(theme)
    };
    Ok(LoadedReport { series, theme })
}

fn hex_color(value: String) -> String {
    if value.starts_with('#') {
        value
    } else {
        format!("#{value}")
    }
}

/// Loads a series from a `.json` (bare array or full payload) or `.csv` file.
pub fn load_file(path: &Path) -> Result<LoadedReport, LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let report = match extension.as_deref() {
        Some("json") => {
            let text = std::fs::read_to_string(path)?;
            match serde_json::from_str::<SeriesFile>(&text)? {
                SeriesFile::Bare(series) => LoadedReport {
                    series,
                    theme: None,
                },
                SeriesFile::Payload(payload) => into_report(payload)?,
            }
        }
        Some("csv") => {
            let mut reader = csv::Reader::from_path(path)?;
            let mut series = Vec::new();
            for result in reader.deserialize::<MonthlyRecord>() {
                series.push(result?);
            }
            LoadedReport {
                series,
                theme: None,
            }
        }
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };

    tracing::info!(path = %path.display(), months = report.series.len(), "loaded series");
    Ok(report)
}

pub fn write_json(path: &Path, series: &[MonthlyRecord]) -> Result<(), LoadError> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, series)?;
    Ok(())
}

/// Every label must parse and each month must follow the previous one by exactly one month.
pub fn ensure_contiguous(series: &[MonthlyRecord]) -> Result<(), MetricsError> {
    let mut previous: Option<(&str, MonthLabel)> = None;
    for record in series {
        let label = MonthLabel::parse(&record.month)?;
        if let Some((previous_month, previous_label)) = previous {
            if label.ordinal() != previous_label.ordinal() + 1 {
                return Err(MetricsError::NotContiguous {
                    previous: previous_month.to_string(),
                    current: record.month.clone(),
                });
            }
        }
        previous = Some((&record.month, label));
    }
    Ok(())
}

pub fn export_csv<W: Write>(writer: W, series: &[MonthlyRecord]) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "Month",
        "New Customers",
        "New Customer Revenue",
        "New Customer Revenue %",
        "Returning Customers",
        "Returning Customer Revenue %",
        "Returning Customer Revenue",
        "Total Customers",
        "Total Revenue",
        "Average Revenue per Customer",
    ])?;

    for record in series {
        wtr.write_record([
            record.month.clone(),
            record.new_customers.to_string(),
            record.new_customer_revenue.to_string(),
            format!("{}%", record.new_customer_revenue_percentage),
            record.returning_customers.to_string(),
            format!("{}%", record.returning_customer_revenue_percentage),
            record.returning_customer_revenue.to_string(),
            record.total_customers.to_string(),
            record.total_revenue.to_string(),
            record.average_revenue_per_customer.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// `{client}MD_Report_{date}.csv`, where `client` is the domain up to its first dot.
pub fn export_file_name(client: Option<&str>, date: NaiveDate) -> String {
    let stem = client
        .and_then(|client| client.split('.').next())
        .unwrap_or("client");
    format!("{stem}MD_Report_{}.csv", date.format("%Y-%m-%d"))
}
