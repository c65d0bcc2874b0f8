use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod compare;
mod error;
mod format;
mod insights;
mod loader;
mod models;
mod quarterly;
mod report;
mod retention;
mod window;

use crate::format::{format_count, format_currency, format_signed_change};
use crate::loader::LoadedReport;
use crate::models::Metric;

#[derive(Parser)]
#[command(name = "client-report")]
#[command(about = "Customer and revenue metrics for monthly client reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// Local series as JSON (array or API payload) or CSV
    #[arg(long)]
    input: Option<PathBuf>,
    /// Client domain to fetch from the report endpoint, e.g. example.com
    #[arg(long)]
    client: Option<String>,
}

#[derive(Args)]
struct Endpoint {
    #[arg(long, env = "REPORT_API_URL", default_value = loader::DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a client's series and save it as JSON
    Fetch {
        #[arg(long)]
        client: String,
        #[command(flatten)]
        endpoint: Endpoint,
        #[arg(long, default_value = "series.json")]
        out: PathBuf,
    },
    /// Print headline KPIs for the latest month
    Summary {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        endpoint: Endpoint,
        #[arg(long)]
        json: bool,
    },
    /// Print ranked insights
    Insights {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        endpoint: Endpoint,
        #[arg(long)]
        json: bool,
    },
    /// Print one metric per month with its MoM, YoY and 3-month figures
    Trend {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        endpoint: Endpoint,
        /// Field name such as newCustomers or totalRevenue
        #[arg(long, default_value = "totalRevenue")]
        metric: Metric,
    },
    /// Print quarterly rollups
    Quarterly {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        endpoint: Endpoint,
    },
    /// Print retention tracking and the revenue impact of an improvement
    Retention {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        endpoint: Endpoint,
        /// Retention improvement in percentage points
        #[arg(long, default_value_t = 5.0)]
        improvement: f64,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        endpoint: Endpoint,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export the series as CSV
    Export {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        endpoint: Endpoint,
        /// Defaults to `{client}MD_Report_{date}.csv`
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

async fn load(source: &Source, endpoint: &Endpoint) -> anyhow::Result<LoadedReport> {
    let report = match (&source.input, &source.client) {
        (Some(path), _) => loader::load_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        (None, Some(client)) => {
            let http = reqwest::Client::new();
            loader::fetch_report(&http, &endpoint.api_url, client)
                .await
                .with_context(|| format!("failed to fetch report for {client}"))?
        }
        (None, None) => anyhow::bail!("either --input or --client is required"),
    };

    loader::ensure_contiguous(&report.series)
        .context("series must hold consecutive months in ascending order")?;
    Ok(report)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            client,
            endpoint,
            out,
        } => {
            let http = reqwest::Client::new();
            let fetched = loader::fetch_report(&http, &endpoint.api_url, &client)
                .await
                .with_context(|| format!("failed to fetch report for {client}"))?;
            loader::write_json(&out, &fetched.series)?;
            println!("Saved {} months to {}.", fetched.series.len(), out.display());
        }
        Commands::Summary {
            source,
            endpoint,
            json,
        } => {
            let loaded = load(&source, &endpoint).await?;
            let kpis = report::KpiSummary::from_series(&loaded.series)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&kpis)?);
                return Ok(());
            }

            println!("Latest month: {}", kpis.month);
            println!(
                "- Total customers {} ({} MoM, {} YoY, {} 3-month)",
                format_count(kpis.total_customers),
                format_signed_change(kpis.customers_mom),
                format_signed_change(kpis.customers_yoy),
                format_signed_change(kpis.customers_three_month)
            );
            println!(
                "- Total revenue {} ({} MoM, {} YoY, {} 3-month)",
                format_currency(kpis.total_revenue),
                format_signed_change(kpis.revenue_mom),
                format_signed_change(kpis.revenue_yoy),
                format_signed_change(kpis.revenue_three_month)
            );
            println!("- Retention rate {:.1}%", kpis.retention_rate);
            if let Some(theme) = &loaded.theme {
                println!(
                    "Theme: primary {} secondary {} background {}",
                    theme.primary.as_deref().unwrap_or("-"),
                    theme.secondary.as_deref().unwrap_or("-"),
                    theme.background.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::Insights {
            source,
            endpoint,
            json,
        } => {
            let loaded = load(&source, &endpoint).await?;
            let insights = insights::generate_insights(&loaded.series)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
                return Ok(());
            }

            for insight in &insights {
                println!(
                    "[P{}] {}: {} ({}%) {}",
                    insight.priority, insight.metric, insight.value, insight.change, insight.text
                );
            }
        }
        Commands::Trend {
            source,
            endpoint,
            metric,
        } => {
            let loaded = load(&source, &endpoint).await?;
            let series = &loaded.series;
            let changes = compare::month_over_month_series(series, metric);

            println!("{} by month:", metric);
            for (index, record) in series.iter().enumerate() {
                let mom = match index {
                    0 => "-".to_string(),
                    _ => format_signed_change(changes[index - 1]),
                };
                println!(
                    "- {}: {} (MoM {}, YoY {}, 3-month avg {})",
                    record.month,
                    report::format_value(metric, metric.value(record)),
                    mom,
                    format_signed_change(compare::year_over_year_change(series, index, metric)?),
                    report::format_value(metric, window::three_month_average(series, metric, index)?)
                );
            }
        }
        Commands::Quarterly { source, endpoint } => {
            let loaded = load(&source, &endpoint).await?;
            let quarters = quarterly::quarterly_rollup(&loaded.series)?;

            for quarter in &quarters {
                let marker = if quarter.is_partial() { "*" } else { "" };
                println!(
                    "- {}{} revenue {} avg/month {} new customers {} ({} months)",
                    quarter.quarter,
                    marker,
                    format_currency(quarter.total_revenue),
                    format_currency(quarter.avg_monthly_revenue),
                    format_count(quarter.new_customers),
                    quarter.months
                );
            }
            if quarters.iter().any(|quarter| quarter.is_partial()) {
                println!("* partial quarter");
            }
        }
        Commands::Retention {
            source,
            endpoint,
            improvement,
        } => {
            let loaded = load(&source, &endpoint).await?;
            let rates = retention::retention_rates(&loaded.series);
            let smoothed = retention::retention_moving_average(&rates);

            for ((record, rate), average) in loaded.series.iter().zip(&rates).zip(&smoothed).skip(1)
            {
                println!(
                    "- {}: {:.1}% (3-month avg {:.1}%)",
                    record.month, rate, average
                );
            }
            println!(
                "Average retention rate: {:.1}%",
                retention::average_retention_rate(&loaded.series)
            );

            let impact = retention::retention_impact(&loaded.series, improvement)?;
            println!(
                "Improving retention from {:.1}% to {:.1}% adds about {} per month (of {} retention revenue).",
                impact.current_rate,
                impact.improved_rate,
                format_currency(impact.additional_revenue),
                format_currency(impact.retention_revenue_portion)
            );
        }
        Commands::Report {
            source,
            endpoint,
            out,
        } => {
            let loaded = load(&source, &endpoint).await?;
            let markdown = report::build_report(source.client.as_deref(), &loaded.series)?;
            std::fs::write(&out, markdown)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            source,
            endpoint,
            out,
        } => {
            let loaded = load(&source, &endpoint).await?;
            let out = out.unwrap_or_else(|| {
                PathBuf::from(loader::export_file_name(
                    source.client.as_deref(),
                    Utc::now().date_naive(),
                ))
            });
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            loader::export_csv(file, &loaded.series)?;
            println!(
                "Exported {} months to {}.",
                loaded.series.len(),
                out.display()
            );
        }
    }

    Ok(())
}
