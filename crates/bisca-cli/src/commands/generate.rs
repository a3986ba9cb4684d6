// `bisca generate`: render the schema as a mongosh script or as JSON.

use std::path::PathBuf;

use bson::{Bson, Document};
use clap::{Args, ValueEnum};
use colored::Colorize;

use bisca_core::{CollectionSchema, DatabaseSchema, IndexSpec, DATABASE_NAME};

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// mongosh script creating every collection and index
    Mongosh,
    /// JSON dump of validators and indexes
    Json,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "mongosh")]
    format: OutputFormat,

    /// Database name used by the script
    #[arg(long, default_value = DATABASE_NAME)]
    db: String,

    /// Output file path (prints to stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub fn run(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let schema = DatabaseSchema::bisca_named(&args.db);
    let generated_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let output = match args.format {
        OutputFormat::Mongosh => render_mongosh(&schema, &generated_at),
        OutputFormat::Json => serde_json::to_string_pretty(&render_json(&schema))? + "\n",
    };

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &output)?;
            println!(
                "{}",
                format!("Schema generated → {}", path.display()).green()
            );
        }
        None => print!("{output}"),
    }

    Ok(())
}

/// A mongosh script equivalent to running the bootstrap by hand.
pub fn render_mongosh(schema: &DatabaseSchema, generated_at: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("// Bisca database bootstrap, generated {generated_at}\n"));
    out.push_str(&format!("db = db.getSiblingDB('{}');\n\n", schema.name));
    out.push_str("print('Initializing Bisca database...');\n");

    for collection in &schema.collections {
        out.push('\n');
        out.push_str(&section_header(collection));
        out.push_str(&format!("db.createCollection(\"{}\", {{\n", collection.name));
        out.push_str("  validator: ");
        out.push_str(&js_document(&collection.validator_document(), 1));
        out.push_str("\n});\n");
    }

    out.push_str("\nprint('Creating indexes...');\n");
    for collection in &schema.collections {
        out.push('\n');
        for index in &collection.indexes {
            out.push_str(&create_index_line(&collection.name, index));
        }
    }

    out.push_str("\nprint('Database initialization completed successfully!');\n");
    out
}

fn section_header(collection: &CollectionSchema) -> String {
    let rule = "=".repeat(43);
    let title = collection.name.to_uppercase();
    if collection.description.is_empty() {
        format!("// {rule}\n// {title} COLLECTION\n// {rule}\n")
    } else {
        format!("// {rule}\n// {title} COLLECTION ({})\n// {rule}\n", collection.description)
    }
}

fn create_index_line(collection: &str, index: &IndexSpec) -> String {
    let keys: Vec<String> = index
        .keys
        .iter()
        .map(|(field, dir)| format!("\"{}\": {}", field, dir.as_i32()))
        .collect();
    let options = if index.unique { ", { unique: true }" } else { "" };
    format!("db.{collection}.createIndex({{ {} }}{options});\n", keys.join(", "))
}

fn js_key(key: &str) -> String {
    let plain = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain && !key.starts_with(|c: char| c.is_ascii_digit()) {
        key.to_string()
    } else {
        format!("\"{key}\"")
    }
}

fn is_flat(value: &Bson) -> bool {
    match value {
        Bson::Document(d) => d.values().all(|v| !matches!(v, Bson::Document(_))),
        _ => true,
    }
}

fn js_value(value: &Bson, depth: usize) -> String {
    match value {
        Bson::String(s) => format!("{s:?}"),
        Bson::Array(items) => {
            let rendered: Vec<String> = items.iter().map(|v| js_value(v, depth)).collect();
            format!("[{}]", rendered.join(", "))
        }
        Bson::Document(d) => js_document(d, depth),
        Bson::Boolean(b) => b.to_string(),
        Bson::Int32(i) => i.to_string(),
        Bson::Int64(i) => i.to_string(),
        Bson::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Render a document as a JS object literal.
///
/// Objects whose values are all scalars stay on one line, as in
/// `{ bsonType: "string" }`.
fn js_document(doc: &Document, depth: usize) -> String {
    if doc.is_empty() {
        return "{}".to_string();
    }
    if is_flat(&Bson::Document(doc.clone())) {
        let fields: Vec<String> = doc
            .iter()
            .map(|(k, v)| format!("{}: {}", js_key(k), js_value(v, depth)))
            .collect();
        return format!("{{ {} }}", fields.join(", "));
    }

    let indent = "  ".repeat(depth + 1);
    let fields: Vec<String> = doc
        .iter()
        .map(|(k, v)| format!("{indent}{}: {}", js_key(k), js_value(v, depth + 1)))
        .collect();
    format!("{{\n{}\n{}}}", fields.join(",\n"), "  ".repeat(depth))
}

/// Validators and indexes as plain JSON.
pub fn render_json(schema: &DatabaseSchema) -> serde_json::Value {
    let collections: Vec<serde_json::Value> = schema
        .collections
        .iter()
        .map(|collection| {
            let indexes: Vec<serde_json::Value> = collection
                .indexes
                .iter()
                .map(|index| {
                    serde_json::json!({
                        "name": index.name(),
                        "keys": Bson::Document(index.keys_document()).into_relaxed_extjson(),
                        "unique": index.unique,
                    })
                })
                .collect();
            serde_json::json!({
                "name": collection.name,
                "description": collection.description,
                "validator": Bson::Document(collection.validator_document()).into_relaxed_extjson(),
                "indexes": indexes,
            })
        })
        .collect();

    serde_json::json!({
        "database": schema.name,
        "collections": collections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mongosh_script_shape() {
        let script = render_mongosh(&DatabaseSchema::bisca(), "2026-01-01 00:00:00 UTC");
        assert!(script.starts_with("// Bisca database bootstrap, generated 2026-01-01"));
        assert!(script.contains("db = db.getSiblingDB('biscaDB');"));
        assert_eq!(script.matches("db.createCollection(").count(), 9);
        assert_eq!(script.matches(".createIndex(").count(), 41);
        assert!(script.contains("db.users.createIndex({ \"id\": 1 }, { unique: true });"));
        assert!(script.contains(
            "db.user_friends.createIndex({ \"user_id\": 1, \"friend_id\": 1 }, { unique: true });"
        ));
        assert!(script.contains("db.game_states.createIndex({ \"players.player_id\": 1 });"));
    }

    #[test]
    fn test_mongosh_renders_validator_literals() {
        let script = render_mongosh(&DatabaseSchema::bisca(), "now");
        assert!(script.contains("$jsonSchema: {"));
        assert!(script.contains("required: [\"id\", \"username\", \"email\", \"password_hash\"]"));
        assert!(script.contains("profile_picture: { bsonType: [\"string\", \"null\"] }"));
    }

    #[test]
    fn test_mongosh_uses_given_database() {
        let script = render_mongosh(&DatabaseSchema::bisca_named("bisca_test"), "now");
        assert!(script.contains("db.getSiblingDB('bisca_test')"));
    }

    #[test]
    fn test_json_dump() {
        let json = render_json(&DatabaseSchema::bisca());
        assert_eq!(json["database"], "biscaDB");
        let collections = json["collections"].as_array().unwrap();
        assert_eq!(collections.len(), 9);
        assert_eq!(collections[0]["name"], "users");
        assert_eq!(
            collections[0]["validator"]["$jsonSchema"]["required"][0],
            "id"
        );
        let first_index = &collections[0]["indexes"][0];
        assert_eq!(first_index["name"], "id_1");
        assert_eq!(first_index["keys"]["id"], 1);
        assert_eq!(first_index["unique"], true);
    }

    #[test]
    fn test_js_key_quoting() {
        assert_eq!(js_key("bsonType"), "bsonType");
        assert_eq!(js_key("$jsonSchema"), "$jsonSchema");
        assert_eq!(js_key("players.player_id"), "\"players.player_id\"");
    }
}
