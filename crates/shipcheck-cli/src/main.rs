//! shipcheck CLI - production-readiness scanner for Next.js and Supabase projects

mod commands;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use commands::Commands;
use logging::LogArgs;

#[derive(Parser, Debug)]
#[command(
    name = "shipcheck",
    author,
    version,
    about = "Production-readiness scanner for Next.js and Supabase projects",
    long_about = "shipcheck scans a Next.js App Router project and its Supabase migrations for\n\
                  unwired UI, orphan routes, leaked secrets, missing row level security and\n\
                  unbounded queries, then decides whether the project is ready to ship."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub logging: LogArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let guard = logging::init_logging(&cli.logging);

    let result = match cli.command {
        Commands::Scan(args) => args.run(),
        Commands::Explain(args) => args.run(),
        Commands::Init(args) => args.run(),
    };

    // Flushes the non-blocking log writer before the process exits.
    drop(guard);

    match result {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
