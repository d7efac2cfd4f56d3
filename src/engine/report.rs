//! Markdown table output

use crate::types::SignalResult;

pub const EMPTY_MESSAGE: &str = "No signals generated";

const HEADER: [&str; 8] = [
    "Symbol",
    "Signal",
    "Prob BUY",
    "RSI",
    "Confidence",
    "Price x100",
    "Plan",
    "Top Features",
];

/// Render rows as a markdown table, or [`EMPTY_MESSAGE`] when there are none
pub fn render_table(results: &[SignalResult]) -> String {
    if results.is_empty() {
        return EMPTY_MESSAGE.to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("| {} |\n", HEADER.join(" | ")));
    out.push_str(&format!("|{}\n", "---|".repeat(HEADER.len())));

    for r in results {
        let cells = [
            r.symbol.clone(),
            r.signal.to_string(),
            format!("{:.2}", r.prob_buy),
            format!("{:.1}", r.rsi),
            r.confidence.to_string(),
            r.price_x100.normalize().to_string(),
            r.plan.to_string(),
            r.top_features.clone().unwrap_or_else(|| "-".to_string()),
        ];
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    out
}
