// `bisca init`: create the Bisca collections, validators and indexes.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use colored::Colorize;

use bisca_core::{Adapter, DatabaseSchema, SchemaOptions};
use bisca_mongodb::MongoAdapter;

use crate::config::{self, Overrides};

#[derive(Args)]
pub struct InitArgs {
    /// MongoDB connection string
    #[arg(long)]
    uri: Option<String>,

    /// Database name
    #[arg(long)]
    db: Option<String>,

    /// Path to configuration file (defaults to ./bisca.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip collections that already exist instead of failing
    #[arg(long)]
    if_not_exists: bool,

    /// Drop the Bisca collections first. Destroys their data.
    #[arg(long)]
    reset: bool,
}

pub async fn run(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config::settings(
        args.config.as_ref(),
        Overrides {
            uri: args.uri,
            db_name: args.db,
        },
    )?;
    let schema = DatabaseSchema::bisca_named(&settings.db_name);

    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_message(format!("Connecting to {}…", settings.db_name));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let adapter = MongoAdapter::connect(&settings.uri, &settings.db_name).await?;

    if args.reset {
        spinner.set_message("Dropping existing collections…");
        let existing = adapter.list_collections().await?;
        for name in schema.collection_names() {
            if existing.iter().any(|c| c == name) {
                adapter.drop_collection(name).await?;
                tracing::warn!(collection = name, "Dropped collection");
            }
        }
    }

    spinner.set_message("Creating collections and indexes…");
    let options = SchemaOptions {
        if_not_exists: args.if_not_exists,
    };
    let status = adapter.create_schema(&schema, &options).await;
    spinner.finish_and_clear();
    let status = status?;

    println!();
    println!("{} {}", "Database".bold(), settings.db_name.yellow());
    for name in &status.created {
        println!("  {} {}", "✓".green(), name);
    }
    for name in &status.skipped {
        println!("  {} {} {}", "•".yellow(), name, "(exists)".dimmed());
    }
    println!();
    println!(
        "{}",
        format!(
            "{} collections created, {} skipped, {} indexes ensured",
            status.created.len(),
            status.skipped.len(),
            status.indexes
        )
        .green()
    );
    tracing::info!(db = %settings.db_name, created = status.created.len(), "Bootstrap complete");

    Ok(())
}
