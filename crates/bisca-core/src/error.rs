// Error taxonomy for schema enforcement and storage access.
//
// A rejected write is always one of: a validator violation (missing field,
// wrong BSON type, value outside an enum domain) or a unique-index collision.
// Everything else is bootstrap/integrity bookkeeping or a driver failure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::db::schema::BsonType;

/// What a single validator violation was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// A `required` field is absent from the document.
    MissingField,
    /// The field is present but its BSON type is not among the allowed ones.
    WrongType {
        expected: Vec<BsonType>,
        found: String,
    },
    /// The field holds a value outside its closed enumeration.
    NotInEnum { value: String, allowed: Vec<String> },
    /// Raised by the server without a structured breakdown.
    Rejected { detail: String },
}

/// One violation, located by a dotted path (`players.1.is_guest`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub path: String,
    #[serde(flatten)]
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ValidationErrorKind::MissingField,
        }
    }

    pub fn wrong_type(path: impl Into<String>, expected: &[BsonType], found: &str) -> Self {
        Self {
            path: path.into(),
            kind: ValidationErrorKind::WrongType {
                expected: expected.to_vec(),
                found: found.to_string(),
            },
        }
    }

    pub fn not_in_enum(path: impl Into<String>, value: &str, allowed: &[String]) -> Self {
        Self {
            path: path.into(),
            kind: ValidationErrorKind::NotInEnum {
                value: value.to_string(),
                allowed: allowed.to_vec(),
            },
        }
    }

    /// A server-side rejection, reported against the whole document.
    pub fn rejected(detail: &str) -> Self {
        Self {
            path: "$".to_string(),
            kind: ValidationErrorKind::Rejected {
                detail: detail.to_string(),
            },
        }
    }

    pub fn is_missing_field(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::MissingField)
    }

    pub fn is_wrong_type(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::WrongType { .. })
    }

    pub fn is_not_in_enum(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::NotInEnum { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::Rejected { .. })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValidationErrorKind::MissingField => {
                write!(f, "{}: required field is missing", self.path)
            }
            ValidationErrorKind::WrongType { expected, found } => {
                let names: Vec<&str> = expected.iter().map(|t| t.as_str()).collect();
                write!(
                    f,
                    "{}: expected {}, found {}",
                    self.path,
                    names.join(" | "),
                    found
                )
            }
            ValidationErrorKind::NotInEnum { value, allowed } => write!(
                f,
                "{}: \"{}\" is not one of [{}]",
                self.path,
                value,
                allowed.join(", ")
            ),
            ValidationErrorKind::Rejected { detail } => write!(f, "{}: {}", self.path, detail),
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "document rejected".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

/// Errors raised by the schema layer and every storage adapter.
#[derive(Debug, thiserror::Error)]
pub enum BiscaError {
    #[error("Document failed validation for `{collection}`: {}", summarize(.errors))]
    Validation {
        collection: String,
        errors: Vec<ValidationError>,
    },

    #[error("Duplicate key in `{collection}` violates unique index `{index}`")]
    DuplicateKey { collection: String, index: String },

    #[error("Collection `{0}` already exists")]
    CollectionExists(String),

    #[error("Collection `{0}` has not been created")]
    UnknownCollection(String),

    #[error("No user with id `{0}`")]
    UnknownUser(String),

    #[error("No game listing with id `{0}`")]
    UnknownGame(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl BiscaError {
    /// The individual violations, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

impl From<bson::ser::Error> for BiscaError {
    fn from(e: bson::ser::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<bson::de::Error> for BiscaError {
    fn from(e: bson::de::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Unified result type for Bisca storage operations.
pub type Result<T> = std::result::Result<T, BiscaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let e = ValidationError::missing("players.0.is_guest");
        assert_eq!(e.to_string(), "players.0.is_guest: required field is missing");

        let e = ValidationError::wrong_type("max_players", &[BsonType::Int], "long");
        assert_eq!(e.to_string(), "max_players: expected int, found long");

        let e = ValidationError::wrong_type("bio", &[BsonType::String, BsonType::Null], "int");
        assert_eq!(e.to_string(), "bio: expected string | null, found int");
    }

    #[test]
    fn test_not_in_enum_display() {
        let allowed = vec!["Pending".to_string(), "Accepted".to_string()];
        let e = ValidationError::not_in_enum("status", "Maybe", &allowed);
        assert_eq!(e.to_string(), "status: \"Maybe\" is not one of [Pending, Accepted]");
        assert!(e.is_not_in_enum());
        assert!(!e.is_missing_field());
    }

    #[test]
    fn test_rejected_covers_whole_document() {
        let e = ValidationError::rejected("Document failed validation");
        assert_eq!(e.path, "$");
        assert_eq!(e.to_string(), "$: Document failed validation");
        assert!(e.is_rejected());
        assert!(!e.is_missing_field());
        assert!(!e.is_wrong_type());
        assert!(!ValidationError::missing("email").is_rejected());
    }

    #[test]
    fn test_validation_summary() {
        let err = BiscaError::Validation {
            collection: "users".into(),
            errors: vec![
                ValidationError::missing("email"),
                ValidationError::missing("password_hash"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Document failed validation for `users`: email: required field is missing (and 1 more)"
        );
        assert_eq!(err.validation_errors().map(|e| e.len()), Some(2));
        assert!(err.is_validation());
    }

    #[test]
    fn test_duplicate_key_display() {
        let err = BiscaError::DuplicateKey {
            collection: "users".into(),
            index: "id_1".into(),
        };
        assert!(err.is_duplicate_key());
        assert_eq!(
            err.to_string(),
            "Duplicate key in `users` violates unique index `id_1`"
        );
    }

    #[test]
    fn test_validation_error_serializes_flat() {
        let e = ValidationError::missing("email");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["path"], "email");
        assert_eq!(json["kind"], "missing_field");
    }
}
