// Schema definition types: the DSL used to declare collection validators
// and their index sets as static data.
//
// A `DatabaseSchema` is consumed by every adapter: the memory adapter
// enforces it in-process, the MongoDB adapter renders it to `$jsonSchema`
// validators and `createIndex` calls, and the CLI prints or exports it.

use bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

/// BSON types a validator can require. Names match MongoDB's `bsonType` aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BsonType {
    String,
    /// 32-bit integer only; 64-bit `long` values do not satisfy it.
    Int,
    Double,
    Bool,
    Date,
    Object,
    Array,
    Null,
}

impl BsonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
        }
    }

    /// Whether a concrete BSON value has this type.
    pub fn matches(&self, value: &Bson) -> bool {
        matches!(
            (self, value),
            (Self::String, Bson::String(_))
                | (Self::Int, Bson::Int32(_))
                | (Self::Double, Bson::Double(_))
                | (Self::Bool, Bson::Boolean(_))
                | (Self::Date, Bson::DateTime(_))
                | (Self::Object, Bson::Document(_))
                | (Self::Array, Bson::Array(_))
                | (Self::Null, Bson::Null)
        )
    }
}

/// MongoDB's alias for the type of a concrete value, used in error reports.
pub fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => "javascript",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binData",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal",
        Bson::Undefined => "undefined",
        Bson::MaxKey => "maxKey",
        Bson::MinKey => "minKey",
        Bson::DbPointer(_) => "dbPointer",
    }
}

/// Constraints on a single property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Accepted BSON types; the value must match at least one.
    pub types: Vec<BsonType>,
    /// Closed set of permitted string values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Nested validator applied when the value is an embedded document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectSchema>,
    /// Validator applied to every element when the value is an array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,
}

impl FieldSchema {
    pub fn of(bson_type: BsonType) -> Self {
        Self {
            types: vec![bson_type],
            enum_values: None,
            object: None,
            items: None,
        }
    }

    pub fn string() -> Self {
        Self::of(BsonType::String)
    }

    pub fn int() -> Self {
        Self::of(BsonType::Int)
    }

    pub fn double() -> Self {
        Self::of(BsonType::Double)
    }

    pub fn bool() -> Self {
        Self::of(BsonType::Bool)
    }

    pub fn date() -> Self {
        Self::of(BsonType::Date)
    }

    /// An embedded document whose contents are not constrained.
    pub fn object() -> Self {
        Self::of(BsonType::Object)
    }

    pub fn array() -> Self {
        Self::of(BsonType::Array)
    }

    /// A string restricted to the given values.
    pub fn string_enum<S: AsRef<str>>(values: &[S]) -> Self {
        Self {
            enum_values: Some(values.iter().map(|v| v.as_ref().to_string()).collect()),
            ..Self::string()
        }
    }

    /// An embedded document checked against `schema`.
    pub fn document(schema: ObjectSchema) -> Self {
        Self {
            object: Some(schema),
            ..Self::object()
        }
    }

    /// Also accept `null`.
    pub fn nullable(mut self) -> Self {
        if !self.types.contains(&BsonType::Null) {
            self.types.push(BsonType::Null);
        }
        self
    }

    pub fn with_items(mut self, items: FieldSchema) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn allows_null(&self) -> bool {
        self.types.contains(&BsonType::Null)
    }

    /// Render as a `$jsonSchema` property document.
    pub fn to_json_schema(&self) -> Document {
        let mut out = match self.object {
            Some(ref nested) => nested.to_json_schema(),
            None => Document::new(),
        };

        let bson_type = match self.types.as_slice() {
            [single] => Bson::String(single.as_str().to_string()),
            many => Bson::Array(
                many.iter()
                    .map(|t| Bson::String(t.as_str().to_string()))
                    .collect(),
            ),
        };
        out.insert("bsonType", bson_type);

        if let Some(ref values) = self.enum_values {
            out.insert("enum", values.clone());
        }
        if let Some(ref items) = self.items {
            out.insert("items", items.to_json_schema());
        }

        // Keep `bsonType` first the way hand-written validators read.
        let mut ordered = doc! { "bsonType": out.remove("bsonType").unwrap_or(Bson::Null) };
        for (key, value) in out {
            ordered.insert(key, value);
        }
        ordered
    }
}

/// Validator for a document: required keys plus per-property constraints.
///
/// Properties keep declaration order so rendered validators are stable.
/// Keys that are not declared are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    pub required: Vec<String>,
    pub properties: Vec<(String, FieldSchema)>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property that must be present.
    pub fn required(mut self, name: &str, field: FieldSchema) -> Self {
        self.required.push(name.to_string());
        self.properties.push((name.to_string(), field));
        self
    }

    /// Declare a property that is checked only when present.
    pub fn optional(mut self, name: &str, field: FieldSchema) -> Self {
        self.properties.push((name.to_string(), field));
        self
    }

    pub fn property(&self, name: &str) -> Option<&FieldSchema> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Render as a `$jsonSchema` object document.
    pub fn to_json_schema(&self) -> Document {
        let mut properties = Document::new();
        for (name, field) in &self.properties {
            properties.insert(name.clone(), field.to_json_schema());
        }

        let mut out = doc! { "bsonType": "object" };
        if !self.required.is_empty() {
            out.insert("required", self.required.clone());
        }
        out.insert("properties", properties);
        out
    }
}

/// Sort direction of one index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexDirection {
    Ascending,
    Descending,
}

impl IndexDirection {
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

/// A secondary index: either a uniqueness constraint or a query accelerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub keys: Vec<(String, IndexDirection)>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexSpec {
    pub fn asc(field: &str) -> Self {
        Self {
            keys: vec![(field.to_string(), IndexDirection::Ascending)],
            unique: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            keys: vec![(field.to_string(), IndexDirection::Descending)],
            unique: false,
        }
    }

    /// Add another key to a compound index.
    pub fn then(mut self, field: &str, direction: IndexDirection) -> Self {
        self.keys.push((field.to_string(), direction));
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// MongoDB's default index name, e.g. `user_id_1_friend_id_1`.
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, dir)| format!("{}_{}", field, dir.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// The key document passed to `createIndex`.
    pub fn keys_document(&self) -> Document {
        let mut keys = Document::new();
        for (field, dir) in &self.keys {
            keys.insert(field.clone(), dir.as_i32());
        }
        keys
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(f, _)| f.as_str())
    }
}

/// One collection: its validator and its index set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    /// Expected access pattern, shown by tooling.
    #[serde(default)]
    pub description: String,
    pub validator: ObjectSchema,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

impl CollectionSchema {
    pub fn new(name: &str, validator: ObjectSchema) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            validator,
            indexes: Vec::new(),
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn unique_indexes(&self) -> impl Iterator<Item = &IndexSpec> {
        self.indexes.iter().filter(|i| i.unique)
    }

    /// The validator option for `createCollection`: `{ $jsonSchema: ... }`.
    pub fn validator_document(&self) -> Document {
        doc! { "$jsonSchema": self.validator.to_json_schema() }
    }
}

/// A complete database: its name and every collection in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub name: String,
    pub collections: Vec<CollectionSchema>,
}

impl DatabaseSchema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            collections: Vec::new(),
        }
    }

    pub fn collection(mut self, collection: CollectionSchema) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|c| c.name.as_str())
    }

    pub fn index_count(&self) -> usize {
        self.collections.iter().map(|c| c.indexes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bson_type_matches() {
        assert!(BsonType::Int.matches(&Bson::Int32(3)));
        assert!(!BsonType::Int.matches(&Bson::Int64(3)));
        assert!(!BsonType::Int.matches(&Bson::Double(3.0)));
        assert!(BsonType::Double.matches(&Bson::Double(0.5)));
        assert!(BsonType::Null.matches(&Bson::Null));
        assert!(BsonType::Object.matches(&Bson::Document(Document::new())));
    }

    #[test]
    fn test_bson_type_serde_names() {
        assert_eq!(serde_json::to_value(BsonType::Int).unwrap(), "int");
        assert_eq!(serde_json::to_value(BsonType::Bool).unwrap(), "bool");
    }

    #[test]
    fn test_field_json_schema_single_type() {
        assert_eq!(FieldSchema::string().to_json_schema(), doc! { "bsonType": "string" });
    }

    #[test]
    fn test_field_json_schema_nullable() {
        assert_eq!(
            FieldSchema::date().nullable().to_json_schema(),
            doc! { "bsonType": ["date", "null"] }
        );
        // Adding null twice is a no-op.
        assert_eq!(FieldSchema::int().nullable().nullable().types.len(), 2);
    }

    #[test]
    fn test_field_json_schema_enum() {
        let field = FieldSchema::string_enum(&["Pending", "Accepted", "Blocked"]);
        assert_eq!(
            field.to_json_schema(),
            doc! { "bsonType": "string", "enum": ["Pending", "Accepted", "Blocked"] }
        );
    }

    #[test]
    fn test_object_json_schema_nested() {
        let schema = ObjectSchema::new()
            .required("players", FieldSchema::array().with_items(FieldSchema::document(
                ObjectSchema::new().required("player_id", FieldSchema::string()),
            )))
            .optional("note", FieldSchema::string());

        let expected = doc! {
            "bsonType": "object",
            "required": ["players"],
            "properties": {
                "players": {
                    "bsonType": "array",
                    "items": {
                        "bsonType": "object",
                        "required": ["player_id"],
                        "properties": { "player_id": { "bsonType": "string" } }
                    }
                },
                "note": { "bsonType": "string" }
            }
        };
        assert_eq!(schema.to_json_schema(), expected);
    }

    #[test]
    fn test_index_name_and_keys() {
        let idx = IndexSpec::asc("user_id")
            .then("friend_id", IndexDirection::Ascending)
            .unique();
        assert_eq!(idx.name(), "user_id_1_friend_id_1");
        assert_eq!(idx.keys_document(), doc! { "user_id": 1, "friend_id": 1 });
        assert!(idx.unique);

        let idx = IndexSpec::desc("created_at");
        assert_eq!(idx.name(), "created_at_-1");
        assert_eq!(idx.keys_document(), doc! { "created_at": -1 });
    }

    #[test]
    fn test_collection_validator_document() {
        let coll = CollectionSchema::new(
            "things",
            ObjectSchema::new().required("id", FieldSchema::string()),
        );
        let validator = coll.validator_document();
        assert!(validator.contains_key("$jsonSchema"));
    }

    #[test]
    fn test_database_lookup() {
        let db = DatabaseSchema::new("test")
            .collection(CollectionSchema::new("a", ObjectSchema::new()).index(IndexSpec::asc("x")))
            .collection(CollectionSchema::new("b", ObjectSchema::new()));
        assert!(db.get("a").is_some());
        assert!(db.get("c").is_none());
        assert_eq!(db.collection_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(db.index_count(), 1);
    }
}
