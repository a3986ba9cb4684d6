// Connection settings: `bisca.toml`, then environment, then flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use bisca_core::env::{database_name_from_env, mongodb_uri_from_env, DEFAULT_MONGODB_URI};
use bisca_core::DATABASE_NAME;

pub const CONFIG_FILE: &str = "bisca.toml";

/// The on-disk configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub database: DatabaseSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct DatabaseSection {
    pub url: Option<String>,
    pub name: Option<String>,
}

/// Where to connect, after every layer has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub uri: String,
    pub db_name: String,
}

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub uri: Option<String>,
    pub db_name: Option<String>,
}

impl FileConfig {
    pub fn parse(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Read `explicit`, or `bisca.toml` in `cwd` when it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing
    /// default file is not.
    pub fn load(cwd: &Path, explicit: Option<&PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = match explicit {
            Some(p) => cwd.join(p),
            None => {
                let default = cwd.join(CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let source = std::fs::read_to_string(&path)
            .map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(Self::parse(&source)?)
    }
}

/// Layer file, environment and flags, highest last.
pub fn resolve(file: FileConfig, env: Overrides, flags: Overrides) -> Settings {
    let uri = flags
        .uri
        .or(env.uri)
        .or(file.database.url)
        .unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string());
    let db_name = flags
        .db_name
        .or(env.db_name)
        .or(file.database.name)
        .unwrap_or_else(|| DATABASE_NAME.to_string());
    Settings { uri, db_name }
}

/// Load settings the way every connecting command does.
pub fn settings(
    config: Option<&PathBuf>,
    flags: Overrides,
) -> Result<Settings, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let file = FileConfig::load(&cwd, config)?;
    let env = Overrides {
        uri: mongodb_uri_from_env(),
        db_name: database_name_from_env(),
    };
    Ok(resolve(file, env, flags))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = resolve(FileConfig::default(), Overrides::default(), Overrides::default());
        assert_eq!(settings.uri, "mongodb://localhost:27017");
        assert_eq!(settings.db_name, "biscaDB");
    }

    #[test]
    fn test_parse_file() {
        let file = FileConfig::parse(
            r#"
            [database]
            url = "mongodb://db.internal:27017"
            name = "bisca_staging"
            "#,
        )
        .unwrap();
        assert_eq!(file.database.url.as_deref(), Some("mongodb://db.internal:27017"));
        assert_eq!(file.database.name.as_deref(), Some("bisca_staging"));
    }

    #[test]
    fn test_empty_file_is_valid() {
        let file = FileConfig::parse("").unwrap();
        assert!(file.database.url.is_none());
    }

    #[test]
    fn test_layer_precedence() {
        let file = FileConfig::parse("[database]\nurl = \"mongodb://file\"\nname = \"file_db\"").unwrap();
        let env = Overrides {
            uri: Some("mongodb://env".into()),
            db_name: None,
        };
        let flags = Overrides {
            uri: None,
            db_name: Some("flag_db".into()),
        };
        let settings = resolve(file, env, flags);
        assert_eq!(settings.uri, "mongodb://env");
        assert_eq!(settings.db_name, "flag_db");
    }

    #[test]
    fn test_missing_default_file_is_fine() {
        let dir = std::env::temp_dir().join(format!("bisca-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = FileConfig::load(&dir, None).unwrap();
        assert!(file.database.name.is_none());
        assert!(FileConfig::load(&dir, Some(&PathBuf::from("nope.toml"))).is_err());
    }
}
