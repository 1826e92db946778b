//! Unit tests for the MySQL catalog adapter that need no server.

use super::catalog::{CATALOG_QUERY, CatalogRow, assemble};
use super::connection::MySqlConnector;
use crate::models::{ColumnKey, ColumnMetadata};
use crate::security::{CredentialIdentity, Credentials};

fn row(name: &str, column_type: &str, data_type: &str) -> CatalogRow {
    CatalogRow {
        column_name: name.to_string(),
        column_type: column_type.to_string(),
        is_nullable: "NO".to_string(),
        data_type: data_type.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_catalog_query_binds_schema_and_table() {
    assert_eq!(CATALOG_QUERY.matches('?').count(), 2);
    assert!(CATALOG_QUERY.contains("ORDER BY c.ORDINAL_POSITION"));
    assert!(CATALOG_QUERY.contains("TABLE_COMMENT"));
}

#[test]
fn test_catalog_row_conversion() {
    let column: ColumnMetadata = CatalogRow {
        column_key: "PRI".to_string(),
        extra: "auto_increment".to_string(),
        column_comment: Some(String::new()),
        ..row("id", "int(10) unsigned", "INT")
    }
    .into();

    assert_eq!(column.name, "id");
    assert_eq!(column.column_type, "int(10) unsigned");
    assert_eq!(column.data_type, "int");
    assert_eq!(column.key, ColumnKey::Primary);
    assert!(column.is_auto_increment());
    assert!(!column.is_nullable);
    assert_eq!(column.comment, None);
}

#[test]
fn test_catalog_row_nullable_with_default() {
    let column: ColumnMetadata = CatalogRow {
        is_nullable: "YES".to_string(),
        column_default: Some("a".to_string()),
        column_comment: Some("Status".to_string()),
        ..row("status", "enum('a','b')", "enum")
    }
    .into();

    assert!(column.is_nullable);
    assert_eq!(column.default_value.as_deref(), Some("a"));
    assert_eq!(column.comment.as_deref(), Some("Status"));
}

#[test]
fn test_assemble_takes_table_comment_from_last_row() {
    let rows = vec![
        CatalogRow {
            table_comment: Some("Orders".to_string()),
            ..row("id", "int(11)", "int")
        },
        CatalogRow {
            table_comment: Some("Orders".to_string()),
            ..row("total", "decimal(10,2)", "decimal")
        },
    ];
    let table = assemble("orders", rows);

    assert_eq!(table.table_name, "orders");
    assert_eq!(table.table_comment.as_deref(), Some("Orders"));
    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "total"]);
}

#[test]
fn test_assemble_empty_catalog() {
    let table = assemble("missing", Vec::new());
    assert!(table.columns.is_empty());
    assert_eq!(table.table_comment, None);
}

#[test]
fn test_connect_options_do_not_panic_without_password() {
    let creds = Credentials::new("root".to_string(), None);
    let identity = CredentialIdentity::new(&creds, "localhost", 3306, "test");
    let _options = MySqlConnector::connect_options(&identity);
}
