//! Core data models for catalog input and synthesized model descriptors.
//!
//! Catalog types ([`ColumnMetadata`], [`CatalogTable`]) are produced once per
//! generation run by a catalog adapter. Descriptor types ([`ModelDescriptor`]
//! and friends) are built from them by [`crate::descriptor`] and are never
//! mutated after construction.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key classification reported by the catalog (`COLUMN_KEY`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    #[default]
    None,
    Primary,
    Unique,
    Multiple,
}

impl ColumnKey {
    /// Parses the MySQL `COLUMN_KEY` value (`PRI`, `UNI`, `MUL` or empty)
    pub fn from_catalog(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Multiple,
            _ => Self::None,
        }
    }
}

/// One physical column as described by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Physical column name
    pub name: String,
    /// Declared SQL type, e.g. `int(11) unsigned` or `enum('a','b')`
    pub column_type: String,
    /// Bare physical storage type, e.g. `int` or `bigint`
    pub data_type: String,
    pub is_nullable: bool,
    /// Raw default literal as reported by the catalog
    pub default_value: Option<String>,
    pub key: ColumnKey,
    /// Extra flags such as `auto_increment`
    pub extra: String,
    pub comment: Option<String>,
}

impl ColumnMetadata {
    /// Creates a non-null column without default, key or comment.
    ///
    /// The physical data type is derived from the declared type by taking
    /// everything before the first `(` or space.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        let column_type = column_type.into();
        let data_type = column_type
            .split(['(', ' '])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        Self {
            name: name.into(),
            column_type,
            data_type,
            is_nullable: false,
            default_value: None,
            key: ColumnKey::None,
            extra: String::new(),
            comment: None,
        }
    }

    /// Builder method to override the physical data type.
    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }

    /// Builder method to set nullability.
    pub fn nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    /// Builder method to set the raw default literal.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Builder method to set the key classification.
    pub fn with_key(mut self, key: ColumnKey) -> Self {
        self.key = key;
        self
    }

    /// Builder method to set the extra flags.
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Builder method to set the column comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.key == ColumnKey::Primary
    }

    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_lowercase().contains("auto_increment")
    }
}

/// Result of the catalog query for one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTable {
    pub table_name: String,
    pub table_comment: Option<String>,
    /// Columns in catalog (ordinal) order
    pub columns: Vec<ColumnMetadata>,
}

impl CatalogTable {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnMetadata>) -> Self {
        Self {
            table_name: table_name.into(),
            table_comment: None,
            columns,
        }
    }

    /// Builder method to set the table comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.table_comment = Some(comment.into());
        self
    }
}

/// Descriptor schema version the output targets.
///
/// Version 0 produces the legacy attribute vocabulary; any later version
/// produces the modern one (`number`, `ref`, `allowNull`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVersion {
    #[default]
    Legacy,
    Modern,
}

impl SchemaVersion {
    /// Selects the schema for an integer target version.
    pub fn from_target(target_version: i64) -> Self {
        if target_version > 0 {
            Self::Modern
        } else {
            Self::Legacy
        }
    }

    pub fn is_modern(self) -> bool {
        matches!(self, Self::Modern)
    }
}

/// Inferred descriptor type for a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Boolean,
    Integer,
    /// Integer or float under the modern schema
    Number,
    Float,
    String,
    LongText,
    MediumText,
    Text,
    Date,
    DateTime,
    /// Association-typed value; modern schema models `datetime` this way
    Ref,
    Json,
    /// String restricted to the listed choices, in declaration order
    Enum(Vec<String>),
    /// Recognised but deliberately unmapped (`time`, `timestamp`)
    Unsupported,
    /// No rule matched
    Unknown,
}

impl TargetType {
    /// Descriptor `type` value for this target type
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Float => "float",
            Self::String | Self::Enum(_) => "string",
            Self::LongText => "longtext",
            Self::MediumText => "mediumtext",
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Ref => "ref",
            Self::Json => "json",
            Self::Unsupported => "<unsupported type>",
            Self::Unknown => "<unknown type>",
        }
    }

    /// Whether defaults of this type are coerced to numbers
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Number | Self::Float)
    }

    /// Whether this is the integer kind of the given schema version
    pub fn is_integer_kind(&self, version: SchemaVersion) -> bool {
        match version {
            SchemaVersion::Legacy => matches!(self, Self::Integer),
            SchemaVersion::Modern => matches!(self, Self::Number),
        }
    }

    /// Enum choices, if any
    pub fn choices(&self) -> Option<&[String]> {
        match self {
            Self::Enum(choices) => Some(choices),
            _ => None,
        }
    }

    /// Whether the mapping produced a diagnostic sentinel
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Unsupported | Self::Unknown)
    }
}

/// Coerced attribute default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Automatic timestamp policy requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    #[default]
    Unspecified,
    Enabled,
    Disabled,
}

impl TimestampPolicy {
    /// Maps an optional boolean flag (`--x` / `--no-x` / absent)
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Self::Enabled,
            Some(false) => Self::Disabled,
            None => Self::Unspecified,
        }
    }

    pub fn is_disabled(self) -> bool {
        matches!(self, Self::Disabled)
    }
}

/// Role an attribute plays in automatic timestamping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimestampRole {
    #[default]
    None,
    CreatedAt,
    UpdatedAt,
}

impl TimestampRole {
    pub fn from_key(key: &str) -> Self {
        match key {
            CREATED_AT => Self::CreatedAt,
            UPDATED_AT => Self::UpdatedAt,
            _ => Self::None,
        }
    }

    pub fn is_timestamp(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Attribute key of the creation timestamp
pub const CREATED_AT: &str = "createdAt";
/// Attribute key of the update timestamp
pub const UPDATED_AT: &str = "updatedAt";

fn is_false(value: &bool) -> bool {
    !*value
}

/// Descriptor of one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Physical column name, present only when it differs from the key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_choices: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
    #[serde(rename = "defaultsTo", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    #[serde(skip_serializing_if = "is_false")]
    pub auto_created_at: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub auto_updated_at: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub auto_increment: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub unique: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub primary_key: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub allow_null: bool,
    #[serde(skip)]
    pub timestamp_role: TimestampRole,
}

impl AttributeDescriptor {
    /// Creates a descriptor carrying only a type name
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            comment: None,
            column_name: None,
            type_name: type_name.into(),
            enum_choices: None,
            column_type: None,
            default_value: None,
            auto_created_at: false,
            auto_updated_at: false,
            auto_increment: false,
            required: false,
            unique: false,
            primary_key: false,
            allow_null: false,
            timestamp_role: TimestampRole::None,
        }
    }
}

/// Value stored under an attribute key
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeEntry {
    Column(AttributeDescriptor),
    /// `false` marker switching off an automatic timestamp attribute
    Disabled,
}

impl AttributeEntry {
    pub fn as_column(&self) -> Option<&AttributeDescriptor> {
        match self {
            Self::Column(descriptor) => Some(descriptor),
            Self::Disabled => None,
        }
    }
}

impl Serialize for AttributeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Column(descriptor) => descriptor.serialize(serializer),
            Self::Disabled => serializer.serialize_bool(false),
        }
    }
}

/// Lifecycle callback that stamps legacy integer timestamp columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleHook {
    /// Sets `createdAt` and `updatedAt` when `createdAt` is unset
    StampCreated,
    /// Sets `updatedAt` when unset
    StampUpdated,
}

const BEFORE_CREATE_SOURCE: &str = "function beforeCreate (recordToCreate, proceed) {
  if (!recordToCreate.createdAt) {
    recordToCreate.createdAt = recordToCreate.updatedAt = parseInt(Date.now() / 1000);
  }
  proceed();
}";

const BEFORE_UPDATE_SOURCE: &str = "function beforeUpdate (recordToCreate, proceed) {
  if (!recordToCreate.updatedAt) {
    recordToCreate.updatedAt = parseInt(Date.now() / 1000);
  }
  proceed();
}";

impl LifecycleHook {
    /// Descriptor key the hook is exported under
    pub fn name(self) -> &'static str {
        match self {
            Self::StampCreated => "beforeCreate",
            Self::StampUpdated => "beforeUpdate",
        }
    }

    /// JavaScript source of the hook as written into the artifact
    pub fn source(self) -> &'static str {
        match self {
            Self::StampCreated => BEFORE_CREATE_SOURCE,
            Self::StampUpdated => BEFORE_UPDATE_SOURCE,
        }
    }

    /// Applies the hook to a record using `now` as the Unix time in seconds.
    ///
    /// Unset follows JavaScript truthiness: missing, `null`, `false`, `0`
    /// and `""` are all unset.
    pub fn apply(self, record: &mut Map<String, Value>, now: i64) {
        match self {
            Self::StampCreated => {
                if is_unset(record.get(CREATED_AT)) {
                    record.insert(CREATED_AT.to_string(), Value::from(now));
                    record.insert(UPDATED_AT.to_string(), Value::from(now));
                }
            }
            Self::StampUpdated => {
                if is_unset(record.get(UPDATED_AT)) {
                    record.insert(UPDATED_AT.to_string(), Value::from(now));
                }
            }
        }
    }

    /// Applies the hook with the current wall-clock time
    pub fn apply_now(self, record: &mut Map<String, Value>) {
        self.apply(record, chrono::Utc::now().timestamp());
    }
}

fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f == 0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => false,
    }
}

/// Lifecycle hooks attached to a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LifecycleHooks {
    pub before_create: Option<LifecycleHook>,
    pub before_update: Option<LifecycleHook>,
}

impl LifecycleHooks {
    pub fn is_empty(&self) -> bool {
        self.before_create.is_none() && self.before_update.is_none()
    }

    /// Attached hooks in export order
    pub fn iter(&self) -> impl Iterator<Item = LifecycleHook> + '_ {
        self.before_create.into_iter().chain(self.before_update)
    }
}

/// Declarative model synthesized from one table's catalog
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub table_name: String,
    /// Leading comment of the generated artifact
    pub table_comment: Option<String>,
    pub schema_version: SchemaVersion,
    /// Attributes in catalog column order
    pub attributes: Vec<(String, AttributeEntry)>,
    /// Single-attribute primary key (modern schema only)
    pub primary_key: Option<String>,
    pub lifecycle: LifecycleHooks,
}

impl ModelDescriptor {
    /// Looks up an attribute entry by key
    pub fn entry(&self, key: &str) -> Option<&AttributeEntry> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, entry)| entry)
    }

    /// Looks up a column attribute by key
    pub fn attribute(&self, key: &str) -> Option<&AttributeDescriptor> {
        self.entry(key).and_then(AttributeEntry::as_column)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// Number of column-backed attributes
    pub fn column_count(&self) -> usize {
        self.attributes
            .iter()
            .filter(|(_, entry)| entry.as_column().is_some())
            .count()
    }
}

struct OrderedAttributes<'a>(&'a [(String, AttributeEntry)]);

impl Serialize for OrderedAttributes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, entry) in self.0 {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

impl Serialize for ModelDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("tableName", &self.table_name)?;
        map.serialize_entry("attributes", &OrderedAttributes(&self.attributes))?;
        if let Some(primary_key) = &self.primary_key {
            map.serialize_entry("primaryKey", primary_key)?;
        }
        for hook in self.lifecycle.iter() {
            map.serialize_entry(hook.name(), hook.source())?;
        }
        map.end()
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
