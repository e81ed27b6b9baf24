use clap::{CommandFactory, Parser, Subcommand};
use etf_overlap::cli::holdings::DEFAULT_DISPLAY_LIMIT;
use etf_overlap::cli::ui;
use etf_overlap::core::HoldingsError;
use etf_overlap::core::log::init_logging;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List the ETFs available for analysis
    List,
    /// Show the holdings of an ETF from its latest N-PORT filing
    Holdings {
        ticker: String,
        /// Ignore cached holdings and fetch from SEC EDGAR
        #[arg(short, long)]
        refresh: bool,
        /// Number of holdings to display
        #[arg(short, long, default_value_t = DEFAULT_DISPLAY_LIMIT)]
        limit: usize,
    },
    /// Compare the holdings of two ETFs
    Overlap { ticker1: String, ticker2: String },
    /// Manage the holdings cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove all cached holdings
    Clear,
}

impl From<Commands> for etf_overlap::AppCommand {
    fn from(cmd: Commands) -> etf_overlap::AppCommand {
        match cmd {
            Commands::List => etf_overlap::AppCommand::List,
            Commands::Holdings {
                ticker,
                refresh,
                limit,
            } => etf_overlap::AppCommand::Holdings {
                ticker,
                refresh,
                limit,
            },
            Commands::Overlap { ticker1, ticker2 } => {
                etf_overlap::AppCommand::Overlap { ticker1, ticker2 }
            }
            Commands::Cache {
                action: CacheAction::Clear,
            } => etf_overlap::AppCommand::ClearCache,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => etf_overlap::cli::setup::setup(),
        Some(cmd) => etf_overlap::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => Cli::command().print_help().map_err(Into::into),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Application failed");
            eprintln!("{}", ui::style_text(&format!("Error: {e:#}"), ui::StyleType::Error));
            let code = e
                .downcast_ref::<HoldingsError>()
                .map_or(1, HoldingsError::exit_code);
            ExitCode::from(code)
        }
    }
}
