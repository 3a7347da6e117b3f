use std::path::Path;

use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use crate::error::{FactsError, FactsResult};

/// One row as an ordered column → value map.
pub type Record = Map<String, Value>;

/// Read every row of `table` from the SQLite file at `path`.
///
/// The file is opened read-only and never created. A table that is missing
/// or has no rows is reported as [`FactsError::Query`].
pub fn fetch_all_rows(path: &Path, table: &str) -> FactsResult<Vec<Record>> {
    if !path.is_file() {
        return Err(FactsError::NotFound(path.to_path_buf()));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(fetch_rows(path, table))
}

async fn fetch_rows(path: &Path, table: &str) -> FactsResult<Vec<Record>> {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .create_if_missing(false)
        .connect()
        .await?;
    debug!(path = %path.display(), "opened SQLite database");

    let result = read_table(&mut conn, path, table).await;

    if let Err(e) = conn.close().await {
        warn!(path = %path.display(), error = %e, "failed to close SQLite database");
    }
    result
}

async fn read_table(
    conn: &mut SqliteConnection,
    path: &Path,
    table: &str,
) -> FactsResult<Vec<Record>> {
    let sql = format!("SELECT * FROM {}", quote_identifier(table));
    let missing = || FactsError::Query {
        table: table.to_string(),
        path: path.to_path_buf(),
    };

    match sqlx::query(&sql).fetch_optional(&mut *conn).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(missing()),
        Err(e) => {
            debug!(table, error = %e, "table check failed");
            return Err(missing());
        }
    }

    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    let records = rows.iter().map(row_to_record).collect::<FactsResult<Vec<_>>>()?;
    info!(path = %path.display(), table, rows = records.len(), "fetched table rows");
    Ok(records)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn row_to_record(row: &SqliteRow) -> FactsResult<Record> {
    let mut record = Map::with_capacity(row.columns().len());
    for column in row.columns() {
        let value = column_value(row, column.ordinal())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

// Values keep the storage class of the stored value, not the declared type
fn column_value(row: &SqliteRow, index: usize) -> FactsResult<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_string();

    let value = match storage.as_str() {
        "INTEGER" => Value::from(row.try_get::<i64, _>(index)?),
        "REAL" => Value::from(row.try_get::<f64, _>(index)?),
        "BLOB" => Value::from(row.try_get::<Vec<u8>, _>(index)?),
        _ => Value::from(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}
