// `bisca status`: describe the schema and, when reachable, what the
// database actually holds.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use colored::Colorize;

use bisca_core::{Adapter, CollectionSchema, DatabaseSchema, FieldSchema};
use bisca_mongodb::MongoAdapter;

use crate::config::{self, Overrides};

#[derive(Args)]
pub struct StatusArgs {
    /// Only show this collection
    #[arg(long)]
    collection: Option<String>,

    /// Describe the schema without connecting
    #[arg(long)]
    offline: bool,

    /// MongoDB connection string
    #[arg(long)]
    uri: Option<String>,

    /// Database name
    #[arg(long)]
    db: Option<String>,

    /// Path to configuration file (defaults to ./bisca.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

pub async fn run(args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config::settings(
        args.config.as_ref(),
        Overrides {
            uri: args.uri,
            db_name: args.db,
        },
    )?;
    let schema = DatabaseSchema::bisca_named(&settings.db_name);

    let selected: Vec<&CollectionSchema> = match args.collection {
        Some(ref name) => vec![schema
            .get(name)
            .ok_or_else(|| format!("Unknown collection `{name}`"))?],
        None => schema.collections.iter().collect(),
    };

    let existing = if args.offline {
        None
    } else {
        let spinner = indicatif::ProgressBar::new_spinner();
        spinner.set_message(format!("Reading {}…", settings.db_name));
        spinner.enable_steady_tick(Duration::from_millis(80));
        let adapter = MongoAdapter::connect(&settings.uri, &settings.db_name).await?;
        let names = adapter.list_collections().await;
        spinner.finish_and_clear();
        Some(names?)
    };

    println!();
    println!("{} {}", "📊 Schema".bold(), settings.db_name.yellow());
    println!("{}", "─".repeat(40).dimmed());

    for collection in &selected {
        let presence = match existing {
            Some(ref names) if names.contains(&collection.name) => " present".green(),
            Some(_) => " missing".red(),
            None => "".normal(),
        };
        println!();
        println!(
            "  {} {}{}",
            "→".magenta(),
            collection.name.yellow(),
            presence
        );
        if !collection.description.is_empty() {
            println!("    {}", collection.description.dimmed());
        }

        for (name, field) in &collection.validator.properties {
            let required = collection.validator.is_required(name);
            println!("    {} {}", "·".dimmed(), describe_field(name, field, required));
            if let Some(ref nested) = field.object.as_ref().or_else(|| {
                field.items.as_ref().and_then(|items| items.object.as_ref())
            }) {
                for (inner, inner_field) in &nested.properties {
                    let path = format!("{name}.{inner}");
                    println!(
                        "        {} {}",
                        "·".dimmed(),
                        describe_field(&path, inner_field, nested.is_required(inner))
                    );
                }
            }
        }

        for index in &collection.indexes {
            let marker = if index.unique { " [unique]" } else { "" };
            println!(
                "    {} {}{}",
                "#".cyan(),
                index.name(),
                marker.dimmed()
            );
        }
    }

    println!();
    let index_count: usize = selected.iter().map(|c| c.indexes.len()).sum();
    println!(
        "{} {} collections, {} indexes",
        "ℹ".blue(),
        selected.len(),
        index_count
    );
    if let Some(names) = existing {
        let missing = selected
            .iter()
            .filter(|c| !names.contains(&c.name))
            .count();
        if missing > 0 {
            println!(
                "{} {} collection(s) missing, run `bisca init --if-not-exists`",
                "!".yellow(),
                missing
            );
        }
    }

    Ok(())
}

/// One line per field: name, BSON types, required and enum markers.
pub fn describe_field(name: &str, field: &FieldSchema, required: bool) -> String {
    let types: Vec<&str> = field.types.iter().map(|t| t.as_str()).collect();
    let mut line = format!("{name} {}", types.join(" | "));
    if required {
        line.push_str(" [required]");
    }
    if let Some(ref values) = field.enum_values {
        line.push_str(&format!(" [enum: {}]", values.join(", ")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_required_enum() {
        let schema = DatabaseSchema::bisca();
        let friends = schema.get("user_friends").unwrap();
        let status = friends.validator.property("status").unwrap();
        assert_eq!(
            describe_field("status", status, true),
            "status string [required] [enum: Pending, Accepted, Blocked]"
        );
    }

    #[test]
    fn test_describe_nullable() {
        let schema = DatabaseSchema::bisca();
        let profiles = schema.get("user_profiles").unwrap();
        let picture = profiles.validator.property("profile_picture").unwrap();
        assert_eq!(
            describe_field("profile_picture", picture, false),
            "profile_picture string | null"
        );
    }
}
