//! CLI output formatting.
//!
//! Renders vault status and scenario reports as text tables or JSON.

use console::style;
use serde::Serialize;

use super::scenario::ScenarioReport;
use crate::utils::address::Address;
use crate::utils::math::{format_units, FixedPoint};
use crate::vault::VaultStatus;

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Pretty JSON, or an error message in JSON form if serialization fails
pub fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT RENDERING
// ═══════════════════════════════════════════════════════════════════════════════

/// Render a scenario report
pub fn render_report(report: &ScenarioReport, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = String::new();
    out.push_str(&section(&format!("Scenario: {}", report.name)));
    let rows: Vec<Vec<String>> = report
        .steps
        .iter()
        .map(|s| vec![s.index.to_string(), s.action.clone(), s.outcome.clone()])
        .collect();
    out.push_str(&table(&["#", "action", "outcome"], &rows));
    out.push_str(&render_status(&report.status, format));
    out.push_str(&format!("\nstate hash: {}\n", report.state_hash));
    out
}

/// Render a vault status report
pub fn render_status(status: &VaultStatus, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return to_json(status);
    }

    let mut out = String::new();
    out.push_str(&section("Vault"));
    let summary = vec![
        vec!["total value".into(), format_units(status.total_value, 18)],
        vec!["total supply".into(), format_units(status.total_supply, 18)],
        vec![
            "non-rebasing supply".into(),
            format_units(status.non_rebasing_supply, 18),
        ],
        vec![
            "credits per token".into(),
            format_units(status.credits_per_token, 18),
        ],
        vec![
            "vault buffer".into(),
            FixedPoint::from_raw(status.vault_buffer).to_percent_string(),
        ],
        vec!["capital paused".into(), status.capital_paused.to_string()],
        vec!["rebase paused".into(), status.rebase_paused.to_string()],
    ];
    out.push_str(&table(&["field", "value"], &summary));

    out.push_str(&section("Assets"));
    let assets: Vec<Vec<String>> = status
        .assets
        .iter()
        .map(|a| {
            vec![
                a.symbol.clone(),
                format_units(a.vault_balance, a.decimals),
                format_units(a.total_balance, a.decimals),
                format_units(a.value, 18),
                a.default_strategy
                    .as_ref()
                    .map_or_else(|| "-".to_string(), Address::short),
            ]
        })
        .collect();
    out.push_str(&table(
        &["asset", "in vault", "total", "value", "default strategy"],
        &assets,
    ));

    out.push_str(&section("Strategies"));
    let symbol_of = |asset: &Address| {
        status
            .assets
            .iter()
            .find(|a| a.address == *asset)
            .map(|a| (a.symbol.clone(), a.decimals))
    };
    let mut strategies = Vec::new();
    for strategy in &status.strategies {
        for (asset, balance) in &strategy.balances {
            let (symbol, decimals) = symbol_of(asset).unwrap_or_else(|| (asset.short(), 18));
            strategies.push(vec![
                strategy.id.short(),
                symbol,
                format_units(*balance, decimals),
            ]);
        }
    }
    out.push_str(&table(&["strategy", "asset", "balance"], &strategies));
    out
}

fn section(title: &str) -> String {
    format!("\n{}\n\n", style(format!("=== {} ===", title)).cyan().bold())
}

/// Plain text table
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let mut out = String::new();
    let header = line(headers.iter().map(|h| h.to_string()).collect());
    out.push_str(&format!("{}\n", style(header).bold()));
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", separator.join("-+-")));
    for row in rows {
        let cells = (0..widths.len())
            .map(|i| row.get(i).cloned().unwrap_or_default())
            .collect();
        out.push_str(&format!("{}\n", line(cells)));
    }
    out
}
