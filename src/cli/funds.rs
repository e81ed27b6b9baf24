use super::ui;
use crate::core::registry::FundEntry;
use comfy_table::Cell;

pub fn display_funds(funds: &[FundEntry]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Name"),
        ui::header_cell("CIK"),
    ]);

    for fund in funds {
        table.add_row(vec![
            Cell::new(&fund.ticker),
            Cell::new(&fund.name),
            Cell::new(&fund.cik),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Available ETFs", ui::StyleType::Title),
        table
    )
}

pub fn run(funds: &[FundEntry]) {
    println!("{}", display_funds(funds));
}
