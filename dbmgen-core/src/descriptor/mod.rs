//! Model descriptor synthesis from catalog columns.
//!
//! [`build`] is pure: it performs no I/O and cannot fail. Callers must reject
//! an empty catalog before calling it, since a descriptor without attributes
//! is meaningless.
//!
//! All schema-version differences are decided here, once per table, from the
//! [`SchemaVersion`] carried in [`BuildOptions`].

mod defaults;

use crate::models::{
    AttributeDescriptor, AttributeEntry, CREATED_AT, CatalogTable, ColumnMetadata, LifecycleHook,
    LifecycleHooks, ModelDescriptor, SchemaVersion, TargetType, TimestampPolicy, TimestampRole,
    UPDATED_AT,
};
use crate::type_mapping::map_type;
use convert_case::{Case, Casing};

/// Options controlling descriptor synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    /// Descriptor schema the output targets
    pub version: SchemaVersion,
    /// `--autoCreatedAt` / `--no-autoCreatedAt`
    pub auto_created_at: TimestampPolicy,
    /// `--autoUpdatedAt` / `--no-autoUpdatedAt`
    pub auto_updated_at: TimestampPolicy,
}

impl BuildOptions {
    /// Creates options for a schema version with unspecified timestamp policies
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Builder method to set both timestamp policies.
    pub fn with_timestamps(
        mut self,
        auto_created_at: TimestampPolicy,
        auto_updated_at: TimestampPolicy,
    ) -> Self {
        self.auto_created_at = auto_created_at;
        self.auto_updated_at = auto_updated_at;
        self
    }
}

/// Normalizes a physical column name to an attribute key.
///
/// # Example
/// ```rust
/// use dbmgen_core::descriptor::attribute_key;
///
/// assert_eq!(attribute_key("created_at"), "createdAt");
/// assert_eq!(attribute_key("updatedAt"), "updatedAt");
/// ```
pub fn attribute_key(column_name: &str) -> String {
    column_name.to_case(Case::Camel)
}

/// Builds the model descriptor for one table.
///
/// Attributes keep catalog column order; when two columns normalize to the
/// same key the later one replaces the earlier entry. Under the modern schema a single
/// primary key is declared at model level, composite keys are dropped, and
/// disabled `createdAt` / `updatedAt` markers are appended when the table
/// lacks those columns.
pub fn build(table: &CatalogTable, options: &BuildOptions) -> ModelDescriptor {
    let version = options.version;
    let mut attributes = Vec::with_capacity(table.columns.len() + 2);
    let mut lifecycle = LifecycleHooks::default();
    let mut primary_keys: Vec<String> = Vec::new();

    for column in &table.columns {
        let key = attribute_key(&column.name);
        let descriptor = build_attribute(column, &key, options, &mut lifecycle);

        primary_keys.retain(|existing| existing != &key);
        if column.is_primary_key() && version.is_modern() {
            primary_keys.push(key.clone());
        }
        let entry = AttributeEntry::Column(descriptor);
        // Columns normalizing to one key: the later column wins, in place
        match attributes.iter_mut().find(|(existing, _)| existing == &key) {
            Some(slot) => {
                tracing::warn!(
                    "Column '{}' of table '{}' replaces an earlier attribute '{}'",
                    column.name,
                    table.table_name,
                    key
                );
                slot.1 = entry;
            }
            None => attributes.push((key, entry)),
        }
    }

    if version.is_modern() {
        for marker in [CREATED_AT, UPDATED_AT] {
            if !attributes.iter().any(|(key, _)| key == marker) {
                attributes.push((marker.to_string(), AttributeEntry::Disabled));
            }
        }
    }

    let primary_key = match primary_keys.as_slice() {
        [single] => Some(single.clone()),
        [] => None,
        composite => {
            tracing::debug!(
                "Dropping composite primary key ({}) of table '{}'",
                composite.join(","),
                table.table_name
            );
            None
        }
    };

    let table_comment = table
        .table_comment
        .as_deref()
        .filter(|comment| !comment.is_empty())
        .map(str::to_string);

    tracing::debug!(
        "Built descriptor for '{}' with {} attributes ({:?} schema)",
        table.table_name,
        attributes.len(),
        version
    );

    ModelDescriptor {
        table_name: table.table_name.clone(),
        table_comment,
        schema_version: version,
        attributes,
        primary_key,
        lifecycle,
    }
}

fn build_attribute(
    column: &ColumnMetadata,
    key: &str,
    options: &BuildOptions,
    lifecycle: &mut LifecycleHooks,
) -> AttributeDescriptor {
    let version = options.version;
    let target = map_type(&column.column_type, version);
    if target.is_sentinel() {
        tracing::warn!(
            "Column '{}' has type '{}' which maps to {}",
            column.name,
            column.column_type,
            target.type_name()
        );
    }

    let mut attribute = AttributeDescriptor::new(target.type_name());
    attribute.comment = column.comment.clone().filter(|comment| !comment.is_empty());
    if key != column.name {
        attribute.column_name = Some(column.name.clone());
    }
    attribute.enum_choices = target.choices().map(<[String]>::to_vec);
    if version.is_modern() {
        attribute.column_type = Some(column.column_type.clone());
    }
    attribute.timestamp_role = TimestampRole::from_key(key);
    attribute.default_value =
        defaults::coerce_default(column.default_value.as_deref(), &target, &column.name);

    apply_timestamp_rules(&mut attribute, column, &target, options, lifecycle);

    if column.is_auto_increment() {
        attribute.auto_increment = true;
    }

    if column.is_primary_key() {
        match version {
            SchemaVersion::Legacy => attribute.primary_key = true,
            SchemaVersion::Modern => {
                if !attribute.auto_increment {
                    attribute.required = true;
                }
                attribute.unique = true;
            }
        }
    }

    if version.is_modern() && column.is_nullable && target != TargetType::Ref {
        attribute.allow_null = true;
    }

    attribute
}

fn apply_timestamp_rules(
    attribute: &mut AttributeDescriptor,
    column: &ColumnMetadata,
    target: &TargetType,
    options: &BuildOptions,
    lifecycle: &mut LifecycleHooks,
) {
    let role = attribute.timestamp_role;
    if !role.is_timestamp() {
        return;
    }

    if *target == TargetType::DateTime
        && defaults::is_current_timestamp(attribute.default_value.as_ref())
    {
        attribute.default_value = None;
        return;
    }

    if !target.is_integer_kind(options.version) || !defaults::is_zero(attribute.default_value.as_ref())
    {
        return;
    }

    let plain_int = column.data_type.eq_ignore_ascii_case("int");
    match options.version {
        SchemaVersion::Legacy if plain_int => {
            if !options.auto_created_at.is_disabled() {
                lifecycle.before_create = Some(LifecycleHook::StampCreated);
            }
            if !options.auto_updated_at.is_disabled() {
                lifecycle.before_update = Some(LifecycleHook::StampUpdated);
            }
        }
        SchemaVersion::Legacy => attribute.default_value = None,
        SchemaVersion::Modern => {
            match role {
                TimestampRole::CreatedAt if !options.auto_created_at.is_disabled() => {
                    attribute.auto_created_at = true;
                }
                TimestampRole::UpdatedAt if !options.auto_updated_at.is_disabled() => {
                    attribute.auto_updated_at = true;
                }
                _ => {}
            }
            attribute.default_value = None;
        }
    }
}

#[cfg(test)]
mod tests;
