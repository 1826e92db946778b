//! Unit tests for descriptor synthesis.

use super::*;
use crate::models::{ColumnKey, DefaultValue};

fn legacy() -> BuildOptions {
    BuildOptions::new(SchemaVersion::Legacy)
}

fn modern() -> BuildOptions {
    BuildOptions::new(SchemaVersion::Modern)
}

fn table(columns: Vec<ColumnMetadata>) -> CatalogTable {
    CatalogTable::new("widget", columns)
}

fn int_timestamp(name: &str, column_type: &str) -> ColumnMetadata {
    ColumnMetadata::new(name, column_type).with_default("0")
}

#[test]
fn test_attribute_keys_are_camel_cased() {
    let descriptor = build(
        &table(vec![
            ColumnMetadata::new("user_id", "int(11)"),
            ColumnMetadata::new("name", "varchar(50)"),
        ]),
        &legacy(),
    );

    let user_id = descriptor.attribute("userId").unwrap();
    assert_eq!(user_id.column_name.as_deref(), Some("user_id"));
    let name = descriptor.attribute("name").unwrap();
    assert_eq!(name.column_name, None);
}

#[test]
fn test_attributes_keep_catalog_order() {
    let descriptor = build(
        &table(vec![
            ColumnMetadata::new("zeta", "int(11)"),
            ColumnMetadata::new("alpha", "int(11)"),
            ColumnMetadata::new("mid", "int(11)"),
        ]),
        &legacy(),
    );
    let keys: Vec<&str> = descriptor.attributes.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_colliding_keys_replace_earlier_attribute() {
    let descriptor = build(
        &table(vec![
            ColumnMetadata::new("user_id", "int(11)").with_key(ColumnKey::Primary),
            ColumnMetadata::new("name", "varchar(50)"),
            ColumnMetadata::new("userId", "varchar(36)"),
        ]),
        &modern(),
    );

    let keys: Vec<&str> = descriptor.attributes.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["userId", "name", "createdAt", "updatedAt"]);
    let user_id = descriptor.attribute("userId").unwrap();
    assert_eq!(user_id.type_name, "string");
    assert_eq!(user_id.column_name, None);
    assert_eq!(descriptor.primary_key, None);
}

#[test]
fn test_comment_carried_only_when_non_empty() {
    let descriptor = build(
        &table(vec![
            ColumnMetadata::new("a", "int(11)").with_comment("Counter"),
            ColumnMetadata::new("b", "int(11)").with_comment(""),
        ]),
        &legacy(),
    );
    assert_eq!(descriptor.attribute("a").unwrap().comment.as_deref(), Some("Counter"));
    assert_eq!(descriptor.attribute("b").unwrap().comment, None);
}

#[test]
fn test_current_timestamp_default_dropped_for_timestamp_keys() {
    let descriptor = build(
        &table(vec![
            ColumnMetadata::new("createdAt", "datetime").with_default("CURRENT_TIMESTAMP"),
            ColumnMetadata::new("published", "datetime").with_default("CURRENT_TIMESTAMP"),
        ]),
        &legacy(),
    );

    assert_eq!(descriptor.attribute("createdAt").unwrap().default_value, None);
    assert_eq!(
        descriptor.attribute("published").unwrap().default_value,
        Some(DefaultValue::Text("CURRENT_TIMESTAMP".to_string()))
    );
}

#[test]
fn test_legacy_int_timestamps_attach_hooks() {
    let descriptor = build(
        &table(vec![
            int_timestamp("created_at", "int(11)"),
            int_timestamp("updated_at", "int(11)"),
        ]),
        &legacy(),
    );

    assert_eq!(descriptor.lifecycle.before_create, Some(LifecycleHook::StampCreated));
    assert_eq!(descriptor.lifecycle.before_update, Some(LifecycleHook::StampUpdated));
    let created = descriptor.attribute("createdAt").unwrap();
    assert_eq!(created.default_value, Some(DefaultValue::Number(0.0)));
    assert!(!created.auto_created_at);
}

#[test]
fn test_legacy_hooks_respect_disabled_policies() {
    let options = legacy().with_timestamps(TimestampPolicy::Disabled, TimestampPolicy::Enabled);
    let descriptor = build(&table(vec![int_timestamp("createdAt", "int(11)")]), &options);

    assert_eq!(descriptor.lifecycle.before_create, None);
    assert_eq!(descriptor.lifecycle.before_update, Some(LifecycleHook::StampUpdated));
}

#[test]
fn test_legacy_wide_int_timestamp_drops_default_without_hooks() {
    let descriptor = build(&table(vec![int_timestamp("createdAt", "bigint(20)")]), &legacy());

    assert!(descriptor.lifecycle.is_empty());
    let created = descriptor.attribute("createdAt").unwrap();
    assert_eq!(created.default_value, None);
    assert!(!created.auto_created_at);
}

#[test]
fn test_modern_int_timestamps_set_flags() {
    let descriptor = build(
        &table(vec![
            int_timestamp("createdAt", "int(11)"),
            int_timestamp("updatedAt", "bigint(20)"),
        ]),
        &modern(),
    );

    assert!(descriptor.lifecycle.is_empty());
    let created = descriptor.attribute("createdAt").unwrap();
    assert!(created.auto_created_at);
    assert!(!created.auto_updated_at);
    assert_eq!(created.default_value, None);
    let updated = descriptor.attribute("updatedAt").unwrap();
    assert!(updated.auto_updated_at);
    assert_eq!(updated.default_value, None);
}

#[test]
fn test_modern_timestamp_flags_respect_disabled_policy() {
    let options = modern().with_timestamps(TimestampPolicy::Unspecified, TimestampPolicy::Disabled);
    let descriptor = build(&table(vec![int_timestamp("updatedAt", "int(11)")]), &options);

    let updated = descriptor.attribute("updatedAt").unwrap();
    assert!(!updated.auto_updated_at);
    assert_eq!(updated.default_value, None);
}

#[test]
fn test_non_zero_int_timestamp_untouched() {
    let column = ColumnMetadata::new("createdAt", "int(11)").with_default("5");
    let descriptor = build(&table(vec![column]), &legacy());

    assert!(descriptor.lifecycle.is_empty());
    assert_eq!(
        descriptor.attribute("createdAt").unwrap().default_value,
        Some(DefaultValue::Number(5.0))
    );
}

#[test]
fn test_single_primary_key() {
    let id = ColumnMetadata::new("id", "int(11)")
        .with_key(ColumnKey::Primary)
        .with_extra("auto_increment");

    let legacy_descriptor = build(&table(vec![id.clone()]), &legacy());
    let attribute = legacy_descriptor.attribute("id").unwrap();
    assert!(attribute.primary_key);
    assert!(attribute.auto_increment);
    assert!(!attribute.unique);
    assert_eq!(legacy_descriptor.primary_key, None);

    let modern_descriptor = build(&table(vec![id]), &modern());
    let attribute = modern_descriptor.attribute("id").unwrap();
    assert!(!attribute.primary_key);
    assert!(attribute.unique);
    assert!(!attribute.required);
    assert_eq!(modern_descriptor.primary_key.as_deref(), Some("id"));
}

#[test]
fn test_primary_key_without_auto_increment_is_required() {
    let code = ColumnMetadata::new("code", "varchar(8)").with_key(ColumnKey::Primary);
    let descriptor = build(&table(vec![code]), &modern());
    let attribute = descriptor.attribute("code").unwrap();
    assert!(attribute.required);
    assert!(attribute.unique);
}

#[test]
fn test_composite_primary_key_dropped() {
    let descriptor = build(
        &table(vec![
            ColumnMetadata::new("order_id", "int(11)").with_key(ColumnKey::Primary),
            ColumnMetadata::new("line_no", "int(11)").with_key(ColumnKey::Primary),
        ]),
        &modern(),
    );

    assert_eq!(descriptor.primary_key, None);
    assert!(descriptor.attribute("orderId").unwrap().unique);
    assert!(descriptor.attribute("lineNo").unwrap().unique);
}

#[test]
fn test_modern_allow_null_skips_ref() {
    let descriptor = build(
        &table(vec![
            ColumnMetadata::new("note", "varchar(20)").nullable(true),
            ColumnMetadata::new("seen", "datetime").nullable(true),
            ColumnMetadata::new("kind", "varchar(20)"),
        ]),
        &modern(),
    );

    assert!(descriptor.attribute("note").unwrap().allow_null);
    let seen = descriptor.attribute("seen").unwrap();
    assert_eq!(seen.type_name, "ref");
    assert!(!seen.allow_null);
    assert!(!descriptor.attribute("kind").unwrap().allow_null);
}

#[test]
fn test_legacy_never_sets_allow_null_or_column_type() {
    let descriptor = build(
        &table(vec![ColumnMetadata::new("note", "varchar(20)").nullable(true)]),
        &legacy(),
    );
    let note = descriptor.attribute("note").unwrap();
    assert!(!note.allow_null);
    assert_eq!(note.column_type, None);
}

#[test]
fn test_modern_records_column_type() {
    let descriptor = build(
        &table(vec![ColumnMetadata::new("price", "decimal(10,2)")]),
        &modern(),
    );
    let price = descriptor.attribute("price").unwrap();
    assert_eq!(price.type_name, "number");
    assert_eq!(price.column_type.as_deref(), Some("decimal(10,2)"));
}

#[test]
fn test_modern_adds_disabled_timestamp_markers() {
    let descriptor = build(&table(vec![ColumnMetadata::new("id", "int(11)")]), &modern());

    assert_eq!(descriptor.entry("createdAt"), Some(&AttributeEntry::Disabled));
    assert_eq!(descriptor.entry("updatedAt"), Some(&AttributeEntry::Disabled));
    let keys: Vec<&str> = descriptor.attributes.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["id", "createdAt", "updatedAt"]);
}

#[test]
fn test_modern_marker_only_for_missing_timestamp() {
    let descriptor = build(
        &table(vec![ColumnMetadata::new("created_at", "datetime")]),
        &modern(),
    );
    assert!(descriptor.attribute("createdAt").is_some());
    assert_eq!(descriptor.entry("updatedAt"), Some(&AttributeEntry::Disabled));
}

#[test]
fn test_legacy_has_no_markers() {
    let descriptor = build(&table(vec![ColumnMetadata::new("id", "int(11)")]), &legacy());
    assert!(!descriptor.has_attribute("createdAt"));
    assert!(!descriptor.has_attribute("updatedAt"));
}

#[test]
fn test_table_comment_empty_is_none() {
    let descriptor = build(
        &table(vec![ColumnMetadata::new("id", "int(11)")]).with_comment(""),
        &legacy(),
    );
    assert_eq!(descriptor.table_comment, None);

    let descriptor = build(
        &table(vec![ColumnMetadata::new("id", "int(11)")]).with_comment("Widgets"),
        &legacy(),
    );
    assert_eq!(descriptor.table_comment.as_deref(), Some("Widgets"));
}

#[test]
fn test_unknown_type_is_diagnostic_not_failure() {
    let descriptor = build(
        &table(vec![ColumnMetadata::new("shape", "geometry")]),
        &legacy(),
    );
    assert_eq!(descriptor.attribute("shape").unwrap().type_name, "<unknown type>");
}
