// `bisca check`: run a collection validator against a document file.

use std::path::PathBuf;

use bson::{Bson, Document};
use clap::Args;
use colored::Colorize;

use bisca_core::db::schema::bson_type_name;
use bisca_core::{DatabaseSchema, ValidationError};

#[derive(Args)]
pub struct CheckArgs {
    /// Collection whose validator applies
    #[arg(long)]
    collection: String,

    /// Extended JSON file holding one document
    file: PathBuf,
}

pub fn run(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("Cannot read {}: {e}", args.file.display()))?;
    let doc = parse_document(&source)?;

    let violations = check_document(&args.collection, &doc)?;
    if violations.is_empty() {
        println!(
            "{} {} is a valid `{}` document",
            "✓".green(),
            args.file.display(),
            args.collection
        );
        return Ok(());
    }

    for violation in &violations {
        println!("  {} {}", "✗".red(), violation);
    }
    Err(format!(
        "{} violation(s) against `{}`",
        violations.len(),
        args.collection
    )
    .into())
}

/// Parse canonical or relaxed Extended JSON into a document.
pub fn parse_document(source: &str) -> Result<Document, Box<dyn std::error::Error>> {
    let value: serde_json::Value = serde_json::from_str(source)?;
    match Bson::try_from(value)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(format!("Expected a JSON object, found {}", bson_type_name(&other)).into()),
    }
}

pub fn check_document(
    collection: &str,
    doc: &Document,
) -> Result<Vec<ValidationError>, Box<dyn std::error::Error>> {
    let schema = DatabaseSchema::bisca();
    let target = schema
        .get(collection)
        .ok_or_else(|| format!("Unknown collection `{collection}`"))?;
    Ok(target.validator.validate(doc))
}
