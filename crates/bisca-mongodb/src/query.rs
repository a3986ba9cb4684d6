// Translation between core adapter types and MongoDB driver types.

use bisca_core::db::adapter::{FindManyQuery, SortDirection};
use bisca_core::db::schema::IndexSpec;
use bisca_core::error::{BiscaError, ValidationError};
use mongodb::bson::{doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::IndexModel;

/// Server codes the adapter gives a meaning to.
pub mod codes {
    pub const NAMESPACE_NOT_FOUND: i32 = 26;
    pub const NAMESPACE_EXISTS: i32 = 48;
    pub const DOCUMENT_VALIDATION_FAILURE: i32 = 121;
    pub const DUPLICATE_KEY: i32 = 11000;
    pub const DUPLICATE_KEY_LEGACY: i32 = 11001;
}

/// Build the driver index model for one declared index.
///
/// The explicit name keeps server-side names identical to `IndexSpec::name`.
pub fn index_model(spec: &IndexSpec) -> IndexModel {
    let options = IndexOptions::builder()
        .name(spec.name())
        .unique(spec.unique.then_some(true))
        .build();

    IndexModel::builder()
        .keys(spec.keys_document())
        .options(options)
        .build()
}

/// Build a sort document from a `FindManyQuery`.
pub fn build_sort(query: &FindManyQuery) -> Option<Document> {
    query.sort_by.as_ref().map(|sort| {
        let direction = match sort.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        };
        doc! { sort.field.as_str(): direction }
    })
}

/// Driver find options for a `FindManyQuery`. A zero limit means no limit.
pub fn find_options(query: &FindManyQuery) -> FindOptions {
    let mut options = FindOptions::default();
    options.sort = build_sort(query);
    options.limit = query.limit.filter(|limit| *limit > 0);
    options
}

/// Wrap a field map into a `$set` update.
pub fn build_update_doc(set: Document) -> Document {
    doc! { "$set": set }
}

/// The server code and message of a failed write or command, if any.
pub fn server_error(err: &MongoError) -> Option<(i32, &str)> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => Some((we.code, we.message.as_str())),
        ErrorKind::Command(ce) => Some((ce.code, ce.message.as_str())),
        _ => None,
    }
}

/// Map a server code to the error the rest of the workspace understands.
///
/// Returns `None` for codes without a dedicated variant.
pub fn classify(collection: &str, code: i32, message: &str) -> Option<BiscaError> {
    match code {
        codes::DOCUMENT_VALIDATION_FAILURE => Some(BiscaError::Validation {
            collection: collection.to_string(),
            errors: vec![ValidationError::rejected(message)],
        }),
        codes::DUPLICATE_KEY | codes::DUPLICATE_KEY_LEGACY => Some(BiscaError::DuplicateKey {
            collection: collection.to_string(),
            index: duplicate_index_name(message).unwrap_or("unknown").to_string(),
        }),
        codes::NAMESPACE_EXISTS => Some(BiscaError::CollectionExists(collection.to_string())),
        _ => None,
    }
}

/// Convert a driver error raised while working on `collection`.
pub fn map_error(collection: &str, err: MongoError) -> BiscaError {
    server_error(&err)
        .and_then(|(code, message)| classify(collection, code, message))
        .unwrap_or_else(|| BiscaError::Database(format!("`{collection}`: {err}")))
}

/// Pull the index name out of an E11000 message.
///
/// `E11000 duplicate key error collection: biscaDB.users index: email_1 dup key: { ... }`
pub fn duplicate_index_name(message: &str) -> Option<&str> {
    let (_, rest) = message.split_once("index: ")?;
    rest.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bisca_core::db::adapter::SortBy;
    use bisca_core::db::schema::IndexDirection;

    #[test]
    fn test_index_model_unique_compound() {
        let spec = IndexSpec::asc("user_id")
            .then("friend_id", IndexDirection::Ascending)
            .unique();
        let model = index_model(&spec);
        assert_eq!(model.keys, doc! { "user_id": 1, "friend_id": 1 });
        let options = model.options.unwrap();
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.name.as_deref(), Some("user_id_1_friend_id_1"));
    }

    #[test]
    fn test_index_model_plain_desc() {
        let model = index_model(&IndexSpec::desc("created_at"));
        assert_eq!(model.keys, doc! { "created_at": -1 });
        let options = model.options.unwrap();
        assert_eq!(options.unique, None);
        assert_eq!(options.name.as_deref(), Some("created_at_-1"));
    }

    #[test]
    fn test_build_sort() {
        let query = FindManyQuery::default().sort(SortBy::desc("win_rate"));
        assert_eq!(build_sort(&query), Some(doc! { "win_rate": -1 }));
        assert_eq!(build_sort(&FindManyQuery::default()), None);
    }

    #[test]
    fn test_find_options_zero_limit() {
        let opts = find_options(&FindManyQuery::default().limit(0));
        assert_eq!(opts.limit, None);
        let opts = find_options(&FindManyQuery::default().limit(10));
        assert_eq!(opts.limit, Some(10));
    }

    #[test]
    fn test_build_update_doc() {
        let update = build_update_doc(doc! { "bio": "hi" });
        assert_eq!(update, doc! { "$set": { "bio": "hi" } });
    }

    #[test]
    fn test_duplicate_index_name() {
        let msg = "E11000 duplicate key error collection: biscaDB.users index: email_1 dup key: { email: \"a@b.it\" }";
        assert_eq!(duplicate_index_name(msg), Some("email_1"));
        assert_eq!(duplicate_index_name("something else"), None);
    }

    #[test]
    fn test_classify_codes() {
        let err = classify("users", 121, "Document failed validation").unwrap();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors[0].path, "$");
        assert!(errors[0].is_rejected());

        let err = classify(
            "user_friends",
            11000,
            "E11000 duplicate key error collection: biscaDB.user_friends index: user_id_1_friend_id_1 dup key: { }",
        )
        .unwrap();
        match err {
            BiscaError::DuplicateKey { index, .. } => assert_eq!(index, "user_id_1_friend_id_1"),
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            classify("users", 48, "Collection already exists"),
            Some(BiscaError::CollectionExists(name)) if name == "users"
        ));
        assert!(classify("users", 2, "BadValue").is_none());
    }
}
