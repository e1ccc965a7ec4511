//! Historical crossover scan across the watchlist.

use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crossover_config::AppConfig;
use crossover_strategy::{rank, recommendation, CrossoverScanner, ScanHit, ScanOutcome};

use super::market_data;
use crate::cli::{OutputFormat, ScanArgs};

#[derive(Debug, Serialize)]
struct ScanReport<'a> {
    lookback: usize,
    symbols_scanned: usize,
    hits: &'a [ScanHit],
    recommendation: Option<&'a ScanHit>,
    skipped: &'a [Skipped],
}

#[derive(Debug, Serialize)]
struct Skipped {
    symbol: String,
    reason: String,
}

pub async fn run(args: ScanArgs, config: &AppConfig) -> Result<ExitCode> {
    let s = &config.strategy;
    let lookback = args.lookback.unwrap_or(s.lookback);
    let scanner = CrossoverScanner::new(s.short_window, s.long_window, lookback)
        .context("Invalid scan parameters")?
        .with_death_crosses(args.include_death);
    let source = market_data(config, args.data.as_deref())?;

    let symbols = if args.symbols.is_empty() {
        config.watchlist.symbols.clone()
    } else {
        args.symbols.clone()
    };
    info!(symbols = symbols.len(), lookback, "Scanning for crossovers");

    let mut hits = Vec::new();
    let mut skipped = Vec::new();
    for symbol in &symbols {
        let history = match source.fetch_price_history(symbol, s.history_days).await {
            Ok(history) => history,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Skipping symbol");
                skipped.push(Skipped {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match scanner.scan(&history)? {
            ScanOutcome::Hit(hit) => {
                info!(symbol = %symbol, event = %hit.event, days_ago = hit.days_ago, "Crossover found");
                hits.push(hit);
            }
            ScanOutcome::NoRecentCross { .. } => {}
            ScanOutcome::InsufficientData { required, available } => skipped.push(Skipped {
                symbol: symbol.clone(),
                reason: format!("insufficient data ({} of {} closes)", available, required),
            }),
        }
    }

    rank(&mut hits);
    let report = ScanReport {
        lookback,
        symbols_scanned: symbols.len(),
        hits: &hits,
        recommendation: recommendation(&hits),
        skipped: &skipped,
    };

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", render_text(&report)),
    }

    Ok(ExitCode::SUCCESS)
}

fn render_text(report: &ScanReport<'_>) -> String {
    let mut s = String::new();

    s.push_str(&format!(
        "Crossovers in the last {} trading days ({} symbols scanned)\n\n",
        report.lookback, report.symbols_scanned
    ));

    if report.hits.is_empty() {
        s.push_str("No recent crossovers found.\n");
    } else {
        s.push_str(&format!(
            "{:<8} {:<14} {:>8} {:<12} {:>10} {:>10} {:>10}\n",
            "Symbol", "Event", "Days Ago", "Date", "Price", "Short MA", "Long MA"
        ));
        for hit in report.hits {
            s.push_str(&format!(
                "{:<8} {:<14} {:>8} {:<12} {:>10.2} {:>10.2} {:>10.2}\n",
                hit.symbol,
                hit.event.to_string(),
                hit.days_ago,
                hit.crossover_date.to_string(),
                hit.current_price,
                hit.short_ma,
                hit.long_ma
            ));
        }
    }

    s.push('\n');
    match report.recommendation {
        Some(hit) => s.push_str(&format!(
            "Recommendation: {} (golden cross {} trading days ago on {})\n",
            hit.symbol, hit.days_ago, hit.crossover_date
        )),
        None => s.push_str("Recommendation: none\n"),
    }

    if !report.skipped.is_empty() {
        s.push_str(&format!("\nSkipped {} symbols:\n", report.skipped.len()));
        for skip in report.skipped {
            s.push_str(&format!("  {}: {}\n", skip.symbol, skip.reason));
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crossover_indicators::CrossoverEvent;

    fn hit(symbol: &str, event: CrossoverEvent, days_ago: usize) -> ScanHit {
        ScanHit {
            symbol: symbol.to_string(),
            event,
            days_ago,
            crossover_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            current_price: 101.5,
            short_ma: 100.25,
            long_ma: 99.75,
        }
    }

    #[test]
    fn test_render_text_names_recommendation() {
        let hits = vec![
            hit("XOM", CrossoverEvent::Death, 1),
            hit("AAPL", CrossoverEvent::Golden, 3),
        ];
        let skipped = vec![Skipped {
            symbol: "BRK.B".to_string(),
            reason: "Symbol not found: BRK.B".to_string(),
        }];
        let report = ScanReport {
            lookback: 20,
            symbols_scanned: 3,
            hits: &hits,
            recommendation: recommendation(&hits),
            skipped: &skipped,
        };

        let text = render_text(&report);
        assert!(text.contains("last 20 trading days (3 symbols scanned)"));
        assert!(text.contains("DEATH CROSS"));
        assert!(text.contains("Recommendation: AAPL (golden cross 3 trading days ago on 2024-05-01)"));
        assert!(text.contains("BRK.B: Symbol not found"));
    }

    #[test]
    fn test_render_text_without_hits() {
        let report = ScanReport {
            lookback: 5,
            symbols_scanned: 0,
            hits: &[],
            recommendation: None,
            skipped: &[],
        };

        let text = render_text(&report);
        assert!(text.contains("No recent crossovers found."));
        assert!(text.contains("Recommendation: none"));
    }
}
