// Offline validator: checks a document against an `ObjectSchema` with the
// same rules MongoDB applies to `$jsonSchema` on insert and update.

use bson::{Bson, Document};

use crate::db::schema::{bson_type_name, CollectionSchema, FieldSchema, ObjectSchema};
use crate::error::{BiscaError, Result, ValidationError};

impl ObjectSchema {
    /// Every violation in `doc`; empty when the document is accepted.
    pub fn validate(&self, doc: &Document) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        validate_object(self, doc, "", &mut errors);
        errors
    }
}

impl CollectionSchema {
    /// Reject `doc` with a `Validation` error if it breaks the validator.
    pub fn check(&self, doc: &Document) -> Result<()> {
        let errors = self.validator.validate(doc);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(BiscaError::Validation {
                collection: self.name.clone(),
                errors,
            })
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn validate_object(
    schema: &ObjectSchema,
    doc: &Document,
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) {
    // A present `null` satisfies `required`; the type check decides.
    for name in &schema.required {
        if !doc.contains_key(name) {
            errors.push(ValidationError::missing(join(prefix, name)));
        }
    }

    for (name, field) in &schema.properties {
        if let Some(value) = doc.get(name) {
            validate_value(field, value, &join(prefix, name), errors);
        }
    }
}

fn validate_value(field: &FieldSchema, value: &Bson, path: &str, errors: &mut Vec<ValidationError>) {
    if !field.types.iter().any(|t| t.matches(value)) {
        errors.push(ValidationError::wrong_type(
            path,
            &field.types,
            bson_type_name(value),
        ));
        return;
    }

    if let Some(ref allowed) = field.enum_values {
        let accepted = match value {
            Bson::String(s) => allowed.iter().any(|a| a == s),
            Bson::Null => field.allows_null(),
            _ => false,
        };
        if !accepted {
            let shown = match value {
                Bson::String(s) => s.clone(),
                other => other.to_string(),
            };
            errors.push(ValidationError::not_in_enum(path, &shown, allowed));
        }
    }

    match value {
        Bson::Document(nested) => {
            if let Some(ref schema) = field.object {
                validate_object(schema, nested, path, errors);
            }
        }
        Bson::Array(elements) => {
            if let Some(ref items) = field.items {
                for (i, element) in elements.iter().enumerate() {
                    validate_value(items, element, &join(path, &i.to_string()), errors);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;
    use bson::doc;

    fn player_schema() -> ObjectSchema {
        ObjectSchema::new()
            .required("player_id", FieldSchema::string())
            .required("is_guest", FieldSchema::bool())
            .optional("prediction", FieldSchema::int().nullable())
    }

    fn game_schema() -> ObjectSchema {
        ObjectSchema::new()
            .required("game_id", FieldSchema::string())
            .required(
                "status",
                FieldSchema::string_enum(&["Waiting", "Playing"]),
            )
            .required(
                "players",
                FieldSchema::array().with_items(FieldSchema::document(player_schema())),
            )
            .optional("rules", FieldSchema::document(
                ObjectSchema::new().required("victory_conditions", FieldSchema::object()),
            ))
    }

    #[test]
    fn test_valid_document_has_no_errors() {
        let doc = doc! {
            "game_id": "g1",
            "status": "Waiting",
            "players": [{ "player_id": "p1", "is_guest": false, "prediction": null }],
            "extra": "ignored",
        };
        assert!(game_schema().validate(&doc).is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let doc = doc! { "status": "Waiting", "players": [] };
        let errors = game_schema().validate(&doc);
        assert_eq!(errors, vec![ValidationError::missing("game_id")]);
    }

    #[test]
    fn test_null_satisfies_required_but_fails_type() {
        let doc = doc! { "game_id": Bson::Null, "status": "Waiting", "players": [] };
        let errors = game_schema().validate(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "game_id");
        assert!(errors[0].is_wrong_type());
    }

    #[test]
    fn test_wrong_type_reports_found_alias() {
        let doc = doc! { "game_id": 5_i64, "status": "Waiting", "players": [] };
        let errors = game_schema().validate(&doc);
        match &errors[0].kind {
            ValidationErrorKind::WrongType { found, .. } => assert_eq!(found, "long"),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_value_outside_enum() {
        let doc = doc! { "game_id": "g1", "status": "Sleeping", "players": [] };
        let errors = game_schema().validate(&doc);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_not_in_enum());
    }

    #[test]
    fn test_array_items_checked_with_index_path() {
        let doc = doc! {
            "game_id": "g1",
            "status": "Playing",
            "players": [
                { "player_id": "p1", "is_guest": true },
                { "player_id": "p2" },
            ],
        };
        let errors = game_schema().validate(&doc);
        assert_eq!(errors, vec![ValidationError::missing("players.1.is_guest")]);
    }

    #[test]
    fn test_nested_object_contents_unconstrained() {
        let doc = doc! {
            "game_id": "g1",
            "status": "Waiting",
            "players": [],
            "rules": { "victory_conditions": { "anything": [1, 2, { "deep": true }] } },
        };
        assert!(game_schema().validate(&doc).is_empty());
    }

    #[test]
    fn test_nested_required_reported_with_prefix() {
        let doc = doc! { "game_id": "g1", "status": "Waiting", "players": [], "rules": {} };
        let errors = game_schema().validate(&doc);
        assert_eq!(errors, vec![ValidationError::missing("rules.victory_conditions")]);
    }

    #[test]
    fn test_all_violations_collected() {
        let doc = doc! { "status": 3, "players": "nope" };
        let errors = game_schema().validate(&doc);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_collection_check_wraps_errors() {
        let coll = CollectionSchema::new("games", game_schema());
        let err = coll.check(&doc! {}).unwrap_err();
        match err {
            BiscaError::Validation { collection, errors } => {
                assert_eq!(collection, "games");
                assert_eq!(errors.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
