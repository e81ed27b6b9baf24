use super::ui;
use crate::core::overlap::OverlapResult;
use crate::service::HoldingsService;
use anyhow::Result;
use comfy_table::Cell;

impl OverlapResult {
    pub fn display_as_table(&self) -> String {
        let mut output = format!(
            "{} {} ({}) vs {} ({})\n\n",
            ui::style_text("Overlap:", ui::StyleType::Title),
            self.fund1_ticker,
            self.fund1_name,
            self.fund2_ticker,
            self.fund2_name
        );

        let mut summary = ui::new_styled_table();
        summary.set_header(vec![
            ui::header_cell("Overlap (%)"),
            ui::header_cell("Common Holdings"),
            ui::header_cell(&format!("{} Holdings", self.fund1_ticker)),
            ui::header_cell(&format!("{} Holdings", self.fund2_ticker)),
        ]);
        summary.add_row(vec![
            ui::highlight_cell(self.overlap_percentage, |v| format!("{v:.2}%")),
            Cell::new(self.common_holdings_count),
            Cell::new(self.fund1_total_holdings),
            Cell::new(self.fund2_total_holdings),
        ]);
        output.push_str(&summary.to_string());

        if self.top_overlapping.is_empty() {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text("No common holdings.", ui::StyleType::Subtle)
            ));
            return output;
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Holding"),
            ui::header_cell(&format!("{} (%)", self.fund1_ticker)),
            ui::header_cell(&format!("{} (%)", self.fund2_ticker)),
            ui::header_cell("Overlap (%)"),
        ]);
        for holding in &self.top_overlapping {
            table.add_row(vec![
                Cell::new(&holding.name),
                ui::weight_cell(holding.weight_fund1),
                ui::weight_cell(holding.weight_fund2),
                ui::highlight_cell(holding.contribution, |v| format!("{v:.2}%")),
            ]);
        }

        output.push_str(&format!(
            "\n\n{}\n\n{}",
            ui::style_text("Top overlapping holdings", ui::StyleType::TotalLabel),
            table
        ));
        output
    }
}

pub async fn run(service: &HoldingsService, ticker1: &str, ticker2: &str) -> Result<()> {
    let pb = ui::new_spinner(&format!(
        "Comparing {} and {}...",
        ticker1.to_uppercase(),
        ticker2.to_uppercase()
    ));
    let result = service.analyze_overlap(ticker1, ticker2).await;
    pb.finish_and_clear();

    println!("{}", result?.display_as_table());
    Ok(())
}
