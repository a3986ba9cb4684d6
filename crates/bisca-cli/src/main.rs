use clap::{Parser, Subcommand};

mod commands;
mod config;

/// Bisca CLI: bootstrap and inspect the Bisca MongoDB database
#[derive(Parser)]
#[command(name = "bisca", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create every collection with its validator and indexes
    Init(commands::init::InitArgs),

    /// Show collections, fields and indexes
    Status(commands::status::StatusArgs),

    /// Emit a mongosh bootstrap script or a JSON dump of the schema
    Generate(commands::generate::GenerateArgs),

    /// Validate a document file against a collection, offline
    Check(commands::check::CheckArgs),
}

#[tokio::main]
async fn main() {
    bisca_core::env::init_logger();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => commands::init::run(args).await,
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Check(args) => commands::check::run(args),
    };

    if let Err(e) = result {
        eprintln!("{} {}", colored::Colorize::red("error:"), e);
        std::process::exit(1);
    }
}
