//! Tests for the catalog and descriptor models.

use super::*;
use serde_json::json;

#[test]
fn test_column_metadata_derives_data_type() {
    let column = ColumnMetadata::new("id", "int(11) unsigned");
    assert_eq!(column.data_type, "int");

    let column = ColumnMetadata::new("status", "enum('a','b')");
    assert_eq!(column.data_type, "enum");

    let column = ColumnMetadata::new("created", "DATETIME");
    assert_eq!(column.data_type, "datetime");
}

#[test]
fn test_column_key_from_catalog() {
    assert_eq!(ColumnKey::from_catalog("PRI"), ColumnKey::Primary);
    assert_eq!(ColumnKey::from_catalog("uni"), ColumnKey::Unique);
    assert_eq!(ColumnKey::from_catalog("MUL"), ColumnKey::Multiple);
    assert_eq!(ColumnKey::from_catalog(""), ColumnKey::None);
}

#[test]
fn test_auto_increment_detection() {
    let column = ColumnMetadata::new("id", "int(11)").with_extra("auto_increment");
    assert!(column.is_auto_increment());

    let column = ColumnMetadata::new("id", "int(11)").with_extra("DEFAULT_GENERATED");
    assert!(!column.is_auto_increment());
}

#[test]
fn test_schema_version_from_target() {
    assert_eq!(SchemaVersion::from_target(0), SchemaVersion::Legacy);
    assert_eq!(SchemaVersion::from_target(-3), SchemaVersion::Legacy);
    assert_eq!(SchemaVersion::from_target(1), SchemaVersion::Modern);
    assert_eq!(SchemaVersion::from_target(2), SchemaVersion::Modern);
}

#[test]
fn test_timestamp_policy_from_flag() {
    assert_eq!(TimestampPolicy::from_flag(None), TimestampPolicy::Unspecified);
    assert_eq!(TimestampPolicy::from_flag(Some(true)), TimestampPolicy::Enabled);
    assert!(TimestampPolicy::from_flag(Some(false)).is_disabled());
}

#[test]
fn test_before_create_stamps_both_columns_with_same_value() {
    let mut record = json!({ "name": "widget" }).as_object().cloned().unwrap();
    LifecycleHook::StampCreated.apply(&mut record, 1_700_000_000);

    assert_eq!(record["createdAt"], json!(1_700_000_000));
    assert_eq!(record["updatedAt"], record["createdAt"]);
}

#[test]
fn test_before_create_keeps_existing_created_at() {
    let mut record = json!({ "createdAt": 42 }).as_object().cloned().unwrap();
    LifecycleHook::StampCreated.apply(&mut record, 1_700_000_000);

    assert_eq!(record["createdAt"], json!(42));
    assert!(!record.contains_key("updatedAt"));
}

#[test]
fn test_before_create_treats_zero_as_unset() {
    let mut record = json!({ "createdAt": 0 }).as_object().cloned().unwrap();
    LifecycleHook::StampCreated.apply(&mut record, 7);
    assert_eq!(record["createdAt"], json!(7));
}

#[test]
fn test_before_update_only_sets_updated_at() {
    let mut record = json!({ "createdAt": 1 }).as_object().cloned().unwrap();
    LifecycleHook::StampUpdated.apply(&mut record, 99);

    assert_eq!(record["createdAt"], json!(1));
    assert_eq!(record["updatedAt"], json!(99));
}

#[test]
fn test_apply_now_uses_unix_seconds() {
    let before = chrono::Utc::now().timestamp();
    let mut record = Map::new();
    LifecycleHook::StampCreated.apply_now(&mut record);
    let after = chrono::Utc::now().timestamp();

    let stamped = record["createdAt"].as_i64().unwrap();
    assert!(stamped >= before && stamped <= after);
}

#[test]
fn test_descriptor_serializes_in_attribute_order() {
    let mut id = AttributeDescriptor::new("integer");
    id.primary_key = true;
    let descriptor = ModelDescriptor {
        table_name: "user".to_string(),
        table_comment: None,
        schema_version: SchemaVersion::Modern,
        attributes: vec![
            ("zeta".to_string(), AttributeEntry::Column(AttributeDescriptor::new("string"))),
            ("id".to_string(), AttributeEntry::Column(id)),
            ("createdAt".to_string(), AttributeEntry::Disabled),
        ],
        primary_key: Some("id".to_string()),
        lifecycle: LifecycleHooks::default(),
    };

    let json = serde_json::to_string(&descriptor).unwrap();
    let zeta = json.find("\"zeta\"").unwrap();
    let id = json.find("\"id\"").unwrap();
    assert!(zeta < id);
    assert!(json.contains("\"createdAt\":false"));
    assert!(json.contains("\"primaryKey\":\"id\""));
    assert!(json.contains("\"primaryKey\":true"));
}
