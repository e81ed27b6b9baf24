use super::ui;
use crate::core::holdings::HoldingsSnapshot;
use crate::service::HoldingsService;
use anyhow::Result;
use comfy_table::Cell;

/// Number of holdings shown when the caller does not ask for a limit.
pub const DEFAULT_DISPLAY_LIMIT: usize = 25;

impl HoldingsSnapshot {
    /// Renders the `limit` largest positions, followed by a summary line.
    pub fn display_as_table(&self, limit: usize) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Holding"),
            ui::header_cell("CUSIP"),
            ui::header_cell("Weight (%)"),
            ui::header_cell("Value (USD)"),
        ]);

        for (rank, holding) in self.holdings.iter().take(limit).enumerate() {
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(&holding.name),
                Cell::new(holding.cusip.as_deref().unwrap_or("-")),
                ui::weight_cell(holding.percentage),
                ui::format_optional_cell(holding.value, |v| format!("{v:.0}")),
            ]);
        }

        let as_of = self
            .as_of_date
            .map_or("unknown".to_string(), |d| d.to_string());

        let mut output = format!(
            "{} ({})\n{}\n\n",
            ui::style_text(&self.ticker, ui::StyleType::Title),
            self.name,
            ui::style_text(&format!("Holdings as of {as_of}"), ui::StyleType::Subtle)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{} {} of {} holdings, {}",
            ui::style_text("Showing", ui::StyleType::TotalLabel),
            limit.min(self.holdings.len()),
            self.holdings.len(),
            ui::style_text(
                &format!("{:.2}% of net assets", self.total_weight()),
                ui::StyleType::TotalValue
            )
        ));
        output
    }
}

pub async fn run(
    service: &HoldingsService,
    ticker: &str,
    force_refresh: bool,
    limit: usize,
) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching holdings for {}...", ticker.to_uppercase()));
    let result = service.get_holdings(ticker, force_refresh).await;
    pb.finish_and_clear();

    println!("{}", result?.display_as_table(limit));
    Ok(())
}
