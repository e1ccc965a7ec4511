//! Run summary publishers.

use std::path::{Path, PathBuf};

use askama::Template;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crossover_core::error::SinkError;
use crossover_core::traits::SummaryPublisher;
use crossover_core::types::{PassStatus, RunSummary, Side, SymbolFailure, TradeReason};

/// Writes the summary text block through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSummaryPublisher;

#[async_trait]
impl SummaryPublisher for LogSummaryPublisher {
    async fn publish_summary(&self, summary: &RunSummary) -> Result<(), SinkError> {
        for line in summary.text().lines() {
            info!("{}", line);
        }
        Ok(())
    }
}

/// Writes one HTML report per pass into a directory and refreshes
/// `latest_report.html`.
#[derive(Debug, Clone)]
pub struct HtmlReportPublisher {
    dir: PathBuf,
}

impl HtmlReportPublisher {
    pub const LATEST: &'static str = "latest_report.html";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Report file name, stamped with the pass finish time (UTC).
    pub fn file_name(summary: &RunSummary) -> String {
        format!(
            "trading_report_{}.html",
            summary.finished_at.format("%Y-%m-%d_%H-%M-%S")
        )
    }
}

#[async_trait]
impl SummaryPublisher for HtmlReportPublisher {
    async fn publish_summary(&self, summary: &RunSummary) -> Result<(), SinkError> {
        let html = render_html(summary)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let report = self.dir.join(Self::file_name(summary));
        tokio::fs::write(&report, &html).await?;
        tokio::fs::write(self.dir.join(Self::LATEST), &html).await?;

        info!(path = %report.display(), "Daily report saved");
        Ok(())
    }
}

/// Money with thousands separators, e.g. `12,345.67`.
fn money(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative();
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac)
}

struct PositionRow<'a> {
    symbol: &'a str,
    quantity: u64,
    entry: String,
    current: String,
    pnl: String,
}

struct TradeRow<'a> {
    class: &'static str,
    action: Side,
    symbol: &'a str,
    quantity: u64,
    price: String,
    reason: TradeReason,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    date: String,
    generated: String,
    portfolio: String,
    cash: String,
    positions: Vec<PositionRow<'a>>,
    trades: Vec<TradeRow<'a>>,
    scanned: usize,
    golden: usize,
    seconds: String,
    aborted: Option<&'a str>,
    failures: &'a [SymbolFailure],
}

impl<'a> ReportTemplate<'a> {
    fn new(summary: &'a RunSummary) -> Self {
        let positions = summary
            .positions
            .iter()
            .map(|p| PositionRow {
                symbol: &p.symbol,
                quantity: p.quantity,
                entry: money(p.entry_price),
                current: p
                    .current_price
                    .map(|c| format!("${}", money(c)))
                    .unwrap_or_else(|| "n/a".to_string()),
                pnl: p
                    .unrealized_pnl_percent()
                    .map(|v| format!("{:+.2}%", v))
                    .unwrap_or_else(|| "n/a".to_string()),
            })
            .collect();

        let trades = summary
            .intents
            .iter()
            .map(|intent| TradeRow {
                class: match intent.action() {
                    Side::Buy => "trade",
                    Side::Sell => "trade sell",
                },
                action: intent.action(),
                symbol: intent.symbol(),
                quantity: intent.quantity(),
                price: money(intent.reference_price()),
                reason: intent.reason(),
            })
            .collect();

        let aborted = match &summary.status {
            PassStatus::Aborted { reason } => Some(reason.as_str()),
            PassStatus::Completed => None,
        };

        Self {
            date: summary.finished_at.format("%Y-%m-%d").to_string(),
            generated: summary.finished_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            portfolio: money(summary.portfolio_value),
            cash: money(summary.cash),
            positions,
            trades,
            scanned: summary.symbols_scanned,
            golden: summary.golden_crosses_found,
            seconds: format!(
                "{:.2}",
                summary.execution_time().num_milliseconds() as f64 / 1000.0
            ),
            aborted,
            failures: &summary.failures,
        }
    }
}

/// Render the summary as a standalone HTML page.
pub fn render_html(summary: &RunSummary) -> Result<String, SinkError> {
    ReportTemplate::new(summary)
        .render()
        .map_err(|e| SinkError::Encoding(e.to_string()))
}
