mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::real_estate::{AmortizeArgs, ModelArgs, ProjectArgs, ReturnsArgs};

/// Commercial real-estate pro-forma return model
#[derive(Parser)]
#[command(
    name = "proforma",
    version,
    about = "Commercial real-estate pro-forma return model",
    long_about = "Builds a levered hold model for a commercial real-estate acquisition \
                  with decimal precision: loan amortisation, NOI projection, DSCR, \
                  direct-cap exit value, IRR and equity multiple."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pro-forma (financing, yearly cash flows, exit, returns)
    Model(ModelArgs),
    /// Build a fixed-rate loan amortisation schedule
    Amortize(AmortizeArgs),
    /// Project NOI, debt service, free cash flow and DSCR
    Project(ProjectArgs),
    /// Exit value, IRR and equity multiple from a cash-flow stream
    Returns(ReturnsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Model(args) => commands::real_estate::run_model(args),
        Commands::Amortize(args) => commands::real_estate::run_amortize(args),
        Commands::Project(args) => commands::real_estate::run_project(args),
        Commands::Returns(args) => commands::real_estate::run_returns(args),
        Commands::Version => {
            println!("proforma {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
