pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "wardrobe",
    about = "Wardrobe outfit planner operator CLI",
    long_about = "Inspect configuration, manage the database, load demo data, and generate weekly outfit plans.",
    after_help = "Examples:\n  wardrobe config\n  wardrobe seed --owner demo-owner\n  wardrobe plan --owner demo-owner"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load reference data and a demo wardrobe for one owner")]
    Seed {
        #[arg(long, default_value = wardrobe_db::DEMO_OWNER_ID, help = "Owner that receives the demo items")]
        owner: String,
    },
    #[command(about = "Generate a weekly outfit plan and print it as JSON")]
    Plan {
        #[arg(long, help = "Owner whose wardrobe is planned")]
        owner: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed { owner } => commands::seed::run(&owner),
        Command::Plan { owner } => commands::plan::run(&owner),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
