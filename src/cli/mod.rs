//! Terminal front end: one module per subcommand plus shared table styling

pub mod funds;
pub mod holdings;
pub mod overlap;
pub mod setup;
pub mod ui;
