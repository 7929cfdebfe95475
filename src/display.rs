/// Terminal tables for the cart, the swap preview and the batch report
use crate::cart::AllocationSet;
use crate::constants::WEIGHT_TOTAL;
use crate::fees::FeeBreakdown;
use crate::swaps::{BatchReport, OutcomeCategory, SwapOutcome};
use crate::tokens::{short_mint, InputCurrency};
use comfy_table::{modifiers, presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::collections::HashMap;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

pub fn cart_table(set: &AllocationSet, prices: Option<&HashMap<String, f64>>) -> Table {
    let mut headers = vec!["#", "Token", "Name", "Mint", "Weight"];
    if prices.is_some() {
        headers.push("Price (USD)");
    }
    let mut table = new_table(&headers);

    for (position, item) in set.iter().enumerate() {
        let mut row = vec![
            Cell::new(position + 1),
            Cell::new(item.token.label()).add_attribute(Attribute::Bold),
            Cell::new(&item.token.name),
            Cell::new(short_mint(&item.token.mint)),
            Cell::new(format!("{:.2}%", item.weight)),
        ];
        if let Some(prices) = prices {
            row.push(match prices.get(item.mint()) {
                Some(price) => Cell::new(format!("${:.6}", price)),
                None => Cell::new("-").fg(Color::DarkGrey),
            });
        }
        table.add_row(row);
    }

    table
}

/// How the net amount will be split, before anything is sent
pub fn split_preview_table(
    set: &AllocationSet,
    currency: InputCurrency,
    fee: &FeeBreakdown,
) -> Table {
    let amount_header = format!("Amount ({})", currency.symbol());
    let mut table = new_table(&["Token", "Weight", amount_header.as_str()]);

    for item in set.iter().filter(|item| item.weight > 0.0) {
        let amount_cell = if item.mint() == currency.mint() {
            Cell::new("skipped (input currency)").fg(Color::Yellow)
        } else {
            Cell::new(format!("{:.6}", fee.net_amount * item.weight / WEIGHT_TOTAL))
        };
        table.add_row(vec![
            Cell::new(item.token.label()),
            Cell::new(format!("{:.2}%", item.weight)),
            amount_cell,
        ]);
    }

    table
}

fn status_cell(outcome: &SwapOutcome) -> Cell {
    let color = match outcome.status.category() {
        OutcomeCategory::Succeeded => Color::Green,
        OutcomeCategory::NoRouteAvailable => Color::Yellow,
        OutcomeCategory::Failed => Color::Red,
    };
    Cell::new(outcome.status.as_str()).fg(color)
}

pub fn report_table(report: &BatchReport) -> Table {
    let currency = report.input_currency;
    let mut table = new_table(&["Token", "Status", "Spent", "Expected out", "Detail"]);

    for outcome in &report.outcomes {
        table.add_row(vec![
            Cell::new(outcome.token.label()),
            status_cell(outcome),
            Cell::new(format!(
                "{:.6} {}",
                currency.to_ui_amount(outcome.input_amount),
                currency.symbol()
            )),
            Cell::new(
                outcome
                    .expected_output
                    .map(|out| out.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(&outcome.detail),
        ]);
    }

    table
}

/// One-line totals, e.g. "2 succeeded, 1 without route, 0 failed"
pub fn report_summary(report: &BatchReport) -> String {
    let breakdown = report.breakdown();
    let mut summary = format!(
        "{} succeeded, {} without route, {} failed",
        breakdown.succeeded, breakdown.no_route, breakdown.failed
    );
    if !report.skipped.is_empty() {
        summary.push_str(&format!(", {} skipped", report.skipped.len()));
    }
    if report.fee.fee_amount > 0.0 {
        summary.push_str(&format!(
            " (fee {:.6} {})",
            report.fee.fee_amount,
            report.input_currency.symbol()
        ));
    }
    summary
}
