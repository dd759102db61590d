//! Plain-text renderings of a `ScanSummary`.
//!
//! `render_summary` is the full console table; `render_alert` is the short
//! message pushed to chat sinks when opportunities exist.

use std::fmt::Write;

use common::{AnalysisResult, ScanSummary};

const RULE: &str = "============================================================";

/// Full console report: header, every ticker, then BUY and SELL sections.
pub fn render_summary(summary: &ScanSummary) -> String {
    let mut out = String::new();
    let period = summary.sma_period;
    let threshold = summary.dispersion_threshold;

    let _ = writeln!(out, "{RULE}\nSCAN RESULTS\n{RULE}");
    let _ = writeln!(out, "Scan Time: {}", summary.scanned_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(
        out,
        "Tickers Analyzed: {}/{}",
        summary.tickers_analyzed(),
        summary.results.len()
    );
    let _ = writeln!(out, "SMA Period: {period} days");
    let _ = writeln!(out, "Dispersion Threshold: +/-{threshold:.1}%");
    let _ = writeln!(out, "Total Opportunities: {}", summary.total_opportunities());

    if !summary.results.is_empty() {
        let _ = writeln!(out, "\n{RULE}\nALL TICKERS:\n{RULE}");
        let sma_header = format!("SMA-{period}");
        let _ = writeln!(
            out,
            "{:<8} {:>10} {:>10} {:>12} {:>8}",
            "Ticker", "Close", sma_header, "Dispersion", "Signal"
        );
        let _ = writeln!(out, "{}", "-".repeat(60));
        for r in &summary.results {
            let _ = writeln!(out, "{}", table_row(r));
        }
    }

    if summary.buy_opportunities.is_empty() {
        let _ = writeln!(out, "\nNo BUY opportunities detected (dispersion > -{threshold:.1}%)");
    } else {
        let _ = writeln!(out, "\n{RULE}\nBUY OPPORTUNITIES (Price significantly BELOW SMA):\n{RULE}");
        for r in &summary.buy_opportunities {
            let _ = writeln!(out, "  {}", opportunity_line(r));
        }
    }

    if summary.sell_opportunities.is_empty() {
        let _ = writeln!(out, "\nNo SELL opportunities detected (dispersion < +{threshold:.1}%)");
    } else {
        let _ = writeln!(out, "\n{RULE}\nSELL OPPORTUNITIES (Price significantly ABOVE SMA):\n{RULE}");
        for r in &summary.sell_opportunities {
            let _ = writeln!(out, "  {}", opportunity_line(r));
        }
    }

    out
}

/// Compact notification text. Lists only BUY/SELL tickers plus failures.
pub fn render_alert(summary: &ScanSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "SMA-{} dispersion alert ({})",
        summary.sma_period,
        summary.scanned_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        out,
        "Threshold: +/-{:.1}% | Analyzed: {}/{} | Opportunities: {}",
        summary.dispersion_threshold,
        summary.tickers_analyzed(),
        summary.results.len(),
        summary.total_opportunities()
    );

    if !summary.buy_opportunities.is_empty() {
        let _ = writeln!(out, "\nBUY (below SMA):");
        for r in &summary.buy_opportunities {
            let _ = writeln!(out, "  {}", opportunity_line(r));
        }
    }
    if !summary.sell_opportunities.is_empty() {
        let _ = writeln!(out, "\nSELL (above SMA):");
        for r in &summary.sell_opportunities {
            let _ = writeln!(out, "  {}", opportunity_line(r));
        }
    }

    let failed: Vec<String> = summary
        .failed()
        .map(|r| format!("{} ({})", r.ticker, r.status))
        .collect();
    if !failed.is_empty() {
        let _ = writeln!(out, "\nSkipped: {}", failed.join(", "));
    }
    out
}

fn table_row(r: &AnalysisResult) -> String {
    match (r.last_price, r.sma, r.dispersion_display(), r.signal) {
        (Some(close), Some(sma), Some(disp), Some(signal)) => format!(
            "{:<8} ${:>9.2} ${:>9.2} {:>11} {:>8}",
            r.ticker,
            close,
            sma,
            format_pct(disp),
            signal.to_string()
        ),
        _ => format!(
            "{:<8} {}{}",
            r.ticker,
            r.status,
            r.error.as_deref().map(|e| format!(": {e}")).unwrap_or_default()
        ),
    }
}

fn opportunity_line(r: &AnalysisResult) -> String {
    let close = r.last_price.unwrap_or_default();
    let disp = r.dispersion_display().unwrap_or_default();
    format!("{}: ${close:.2} (Dispersion: {})", r.ticker, format_pct(disp))
}

/// Signed percentage with two decimals, e.g. `+3.10%`, `-16.67%`.
pub fn format_pct(value: f64) -> String {
    if value > 0.0 {
        format!("+{value:.2}%")
    } else {
        format!("{value:.2}%")
    }
}
