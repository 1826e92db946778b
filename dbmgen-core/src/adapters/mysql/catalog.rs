//! Catalog query against `information_schema` and row decoding.

use crate::Result;
use crate::error::DbmError;
use crate::models::{CatalogTable, ColumnKey, ColumnMetadata};
use sqlx::{MySqlPool, Row, mysql::MySqlRow};

/// Column catalog of one table joined with its table comment, in ordinal order
pub const CATALOG_QUERY: &str = r#"
    SELECT
        CAST(c.COLUMN_NAME AS CHAR) AS COLUMN_NAME,
        CAST(c.COLUMN_TYPE AS CHAR) AS COLUMN_TYPE,
        CAST(c.IS_NULLABLE AS CHAR) AS IS_NULLABLE,
        CAST(c.COLUMN_DEFAULT AS CHAR) AS COLUMN_DEFAULT,
        CAST(c.COLUMN_KEY AS CHAR) AS COLUMN_KEY,
        CAST(c.EXTRA AS CHAR) AS EXTRA,
        CAST(c.DATA_TYPE AS CHAR) AS DATA_TYPE,
        CAST(c.COLUMN_COMMENT AS CHAR) AS COLUMN_COMMENT,
        CAST(t.TABLE_COMMENT AS CHAR) AS TABLE_COMMENT
    FROM information_schema.COLUMNS AS c
    JOIN information_schema.TABLES AS t
        ON c.TABLE_SCHEMA = t.TABLE_SCHEMA
        AND c.TABLE_NAME = t.TABLE_NAME
    WHERE c.TABLE_SCHEMA = ?
        AND c.TABLE_NAME = ?
    ORDER BY c.ORDINAL_POSITION
"#;

/// One row of [`CATALOG_QUERY`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    pub column_name: String,
    pub column_type: String,
    pub is_nullable: String,
    pub column_default: Option<String>,
    pub column_key: String,
    pub extra: String,
    pub data_type: String,
    pub column_comment: Option<String>,
    pub table_comment: Option<String>,
}

impl From<CatalogRow> for ColumnMetadata {
    fn from(row: CatalogRow) -> Self {
        let mut column = Self::new(row.column_name, row.column_type)
            .with_data_type(row.data_type.to_lowercase())
            .nullable(row.is_nullable.eq_ignore_ascii_case("YES"))
            .with_key(ColumnKey::from_catalog(&row.column_key))
            .with_extra(row.extra);
        column.default_value = row.column_default;
        column.comment = row.column_comment.filter(|comment| !comment.is_empty());
        column
    }
}

/// Assembles catalog rows into a table description.
///
/// The table comment is taken from the last row; every row carries the same
/// value.
pub fn assemble(table: &str, rows: Vec<CatalogRow>) -> CatalogTable {
    let table_comment = rows
        .last()
        .and_then(|row| row.table_comment.clone())
        .filter(|comment| !comment.is_empty());

    CatalogTable {
        table_name: table.to_string(),
        table_comment,
        columns: rows.into_iter().map(ColumnMetadata::from).collect(),
    }
}

fn decode_row(row: &MySqlRow) -> std::result::Result<CatalogRow, sqlx::Error> {
    Ok(CatalogRow {
        column_name: row.try_get("COLUMN_NAME")?,
        column_type: row.try_get("COLUMN_TYPE")?,
        is_nullable: row.try_get("IS_NULLABLE")?,
        column_default: row.try_get("COLUMN_DEFAULT")?,
        column_key: row
            .try_get::<Option<String>, _>("COLUMN_KEY")?
            .unwrap_or_default(),
        extra: row.try_get::<Option<String>, _>("EXTRA")?.unwrap_or_default(),
        data_type: row.try_get("DATA_TYPE")?,
        column_comment: row.try_get("COLUMN_COMMENT")?,
        table_comment: row.try_get("TABLE_COMMENT")?,
    })
}

/// Runs the catalog query for one table.
///
/// # Errors
/// Returns [`DbmError::Query`] with the query text if the query or row
/// decoding fails.
pub(crate) async fn describe_table(
    pool: &MySqlPool,
    database: &str,
    table: &str,
) -> Result<CatalogTable> {
    tracing::debug!("Querying catalog for {}.{}", database, table);
    tracing::trace!("sql => {}", CATALOG_QUERY);

    let rows = sqlx::query(CATALOG_QUERY)
        .bind(database)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| DbmError::query_failed(CATALOG_QUERY.trim(), e))?;

    let rows = rows
        .iter()
        .map(decode_row)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| DbmError::query_failed(CATALOG_QUERY.trim(), e))?;

    tracing::debug!("Catalog returned {} columns for {}", rows.len(), table);
    Ok(assemble(table, rows))
}
