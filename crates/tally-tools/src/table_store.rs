//! Generic SQLite table store
//!
//! A thin facade over an externally owned SQLite database: table discovery,
//! schema introspection, filtered reads, inserts and conditional deletes.
//!
//! # Contract
//!
//! - Every operation returns a structured outcome (`success`, `message`,
//!   payload, and a `failure` kind) instead of an error.
//! - Each call opens one fresh connection and closes it on every exit path.
//!   There is no pool and no connection is shared between calls.
//! - Writes run inside a transaction: committed on success, rolled back on
//!   failure, so no partial row is ever left behind.
//! - Table and column names are checked against the table's live schema and
//!   quoted before they reach SQL text. Values are always bound parameters.
//! - The `condition` of reads and deletes is a raw `WHERE` clause supplied by
//!   the agent and is appended verbatim. A `;` outside quoted literals that
//!   starts a second statement is refused; a single trailing `;` is dropped.
//! - SQLite has no boolean storage class: JSON `true`/`false` are stored as
//!   `1`/`0` and read back as integers.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row, Sqlite, TypeInfo, ValueRef};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// A row materialized as column name -> value
pub type RowMap = serde_json::Map<String, serde_json::Value>;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

const EMPTY_INSERT_MESSAGE: &str = "No data provided for insertion.";
const EMPTY_CONDITION_MESSAGE: &str = "Deletion condition cannot be empty. \
     This is a safety measure to prevent accidental deletion of all rows.";

/// Why an operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Input violated a precondition; the backend was never touched
    Rejected,
    /// The table does not exist or has no columns
    NotFound,
    /// SQLite reported an error
    Backend,
    /// Anything else (e.g. a value that could not be decoded)
    Unexpected,
}

/// Internal error type, converted to outcomes at the public boundary
#[derive(Debug, Error)]
pub enum StoreError {
    /// Guard rejection
    #[error("{0}")]
    Rejected(String),

    /// Unknown table
    #[error("Table '{0}' not found or no schema information.")]
    TableNotFound(String),

    /// SQLite error
    #[error("{0}")]
    Backend(#[from] sqlx::Error),

    /// Other failure
    #[error("{0}")]
    Unexpected(String),
}

impl StoreError {
    /// Failure kind reported to callers
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Rejected(_) => FailureKind::Rejected,
            Self::TableNotFound(_) => FailureKind::NotFound,
            Self::Backend(_) => FailureKind::Backend,
            Self::Unexpected(_) => FailureKind::Unexpected,
        }
    }

    /// Message for callers; backend and unexpected errors get `context` prefixed
    fn describe(&self, context: &str) -> String {
        match self {
            Self::Backend(_) | Self::Unexpected(_) => format!("{}: {}", context, self),
            _ => self.to_string(),
        }
    }
}

/// Result alias for internal store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Column descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared type (may be empty, SQLite allows untyped columns)
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Outcome of `list_tables`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableList {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Table names
    pub tables: Vec<String>,
    /// Failure kind, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

/// Outcome of `get_table_schema`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Table name as requested
    pub table_name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnInfo>,
    /// Failure kind, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl TableSchema {
    /// Whether the lookup failed because the table does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.failure == Some(FailureKind::NotFound)
    }
}

/// Outcome of `query_table`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRows {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Matching rows, in backend order
    pub rows: Vec<RowMap>,
    /// Failure kind, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

/// Outcome of `insert_row`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertOutcome {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Row id assigned by SQLite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<i64>,
    /// Failure kind, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

/// Outcome of `delete_rows`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Number of rows removed
    pub rows_deleted: u64,
    /// Failure kind, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

/// SQLite table store
#[derive(Debug, Clone)]
pub struct TableStore {
    options: SqliteConnectOptions,
    path: PathBuf,
}

impl TableStore {
    /// Create a store for the database file at `path`
    ///
    /// The file is created on first connection if missing. Nothing is
    /// opened until an operation runs.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        Self { options, path }
    }

    /// Create a store from a `sqlite:` URL
    pub fn from_url(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let path = options.get_filename().to_path_buf();
        Ok(Self { options, path })
    }

    /// Database file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List all user tables in the database
    pub async fn list_tables(&self) -> TableList {
        debug!(db = %self.path.display(), "Listing tables");

        match self.try_list_tables().await {
            Ok(tables) => {
                info!(count = tables.len(), "Tables listed");
                TableList {
                    success: true,
                    message: "Tables listed successfully.".to_string(),
                    tables,
                    failure: None,
                }
            }
            Err(e) => {
                error!(error = %e, "Error listing tables");
                let context = match e {
                    StoreError::Backend(_) => "Error listing tables",
                    _ => "An unexpected error occurred while listing tables",
                };
                TableList {
                    success: false,
                    message: e.describe(context),
                    tables: Vec::new(),
                    failure: Some(e.kind()),
                }
            }
        }
    }

    /// Get the ordered column descriptors of a table
    ///
    /// An absent table is reported with `FailureKind::NotFound`.
    pub async fn get_table_schema(&self, table_name: &str) -> TableSchema {
        debug!(table = %table_name, "Fetching table schema");

        match self.try_schema(table_name).await {
            Ok(columns) => {
                info!(table = %table_name, columns = columns.len(), "Table schema found");
                TableSchema {
                    success: true,
                    message: format!(
                        "Table '{}' has {} column(s).",
                        table_name,
                        columns.len()
                    ),
                    table_name: table_name.to_string(),
                    columns,
                    failure: None,
                }
            }
            Err(e) => {
                error!(table = %table_name, error = %e, "Error fetching table schema");
                TableSchema {
                    success: false,
                    message: e.describe(&format!(
                        "Error reading schema of table '{}'",
                        table_name
                    )),
                    table_name: table_name.to_string(),
                    columns: Vec::new(),
                    failure: Some(e.kind()),
                }
            }
        }
    }

    /// Query a table
    ///
    /// `columns` is a comma-separated projection; `None`, empty or `*`
    /// selects every column. `condition` is appended after `WHERE` when it
    /// is non-blank.
    pub async fn query_table(
        &self,
        table_name: &str,
        columns: Option<&str>,
        condition: Option<&str>,
    ) -> QueryRows {
        debug!(table = %table_name, ?columns, ?condition, "Querying table");

        match self.try_query(table_name, columns, condition).await {
            Ok(rows) => {
                info!(table = %table_name, count = rows.len(), "Query executed");
                QueryRows {
                    success: true,
                    message: format!("Query returned {} row(s).", rows.len()),
                    rows,
                    failure: None,
                }
            }
            Err(e) => {
                error!(table = %table_name, error = %e, "Error querying table");
                QueryRows {
                    success: false,
                    message: e.describe(&format!("Error querying table '{}'", table_name)),
                    rows: Vec::new(),
                    failure: Some(e.kind()),
                }
            }
        }
    }

    /// Insert one row
    ///
    /// Empty `data` is rejected without opening a connection.
    pub async fn insert_row(&self, table_name: &str, data: &RowMap) -> InsertOutcome {
        debug!(table = %table_name, fields = data.len(), "Inserting row");

        if data.is_empty() {
            warn!(table = %table_name, "No data provided for insertion");
            return InsertOutcome {
                success: false,
                message: EMPTY_INSERT_MESSAGE.to_string(),
                row_id: None,
                failure: Some(FailureKind::Rejected),
            };
        }

        match self.try_insert(table_name, data).await {
            Ok(row_id) => {
                info!(table = %table_name, row_id, "Row inserted");
                InsertOutcome {
                    success: true,
                    message: format!("Data inserted successfully. Row ID: {}", row_id),
                    row_id: Some(row_id),
                    failure: None,
                }
            }
            Err(e) => {
                error!(table = %table_name, error = %e, "Error inserting data");
                InsertOutcome {
                    success: false,
                    message: e.describe(&format!(
                        "Error inserting data into table '{}'",
                        table_name
                    )),
                    row_id: None,
                    failure: Some(e.kind()),
                }
            }
        }
    }

    /// Delete the rows matching `condition`
    ///
    /// A blank condition is rejected without opening a connection.
    pub async fn delete_rows(&self, table_name: &str, condition: &str) -> DeleteOutcome {
        debug!(table = %table_name, condition = %condition, "Deleting rows");

        if condition.trim().is_empty() {
            warn!(table = %table_name, "Deletion condition cannot be empty");
            return DeleteOutcome {
                success: false,
                message: EMPTY_CONDITION_MESSAGE.to_string(),
                rows_deleted: 0,
                failure: Some(FailureKind::Rejected),
            };
        }

        match self.try_delete(table_name, condition).await {
            Ok(rows_deleted) => {
                info!(table = %table_name, rows_deleted, "Rows deleted");
                DeleteOutcome {
                    success: true,
                    message: format!(
                        "{} row(s) deleted successfully from table '{}'.",
                        rows_deleted, table_name
                    ),
                    rows_deleted,
                    failure: None,
                }
            }
            Err(e) => {
                error!(table = %table_name, error = %e, "Error deleting data");
                DeleteOutcome {
                    success: false,
                    message: e.describe(&format!(
                        "Error deleting data from table '{}'",
                        table_name
                    )),
                    rows_deleted: 0,
                    failure: Some(e.kind()),
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Connection handling
    // ------------------------------------------------------------------

    async fn connect(&self) -> StoreResult<SqliteConnection> {
        Ok(self.options.connect().await?)
    }

    async fn release(conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close SQLite connection");
        }
    }

    async fn try_list_tables(&self) -> StoreResult<Vec<String>> {
        let mut conn = self.connect().await?;
        let result = fetch_table_names(&mut conn).await;
        Self::release(conn).await;
        result
    }

    async fn try_schema(&self, table_name: &str) -> StoreResult<Vec<ColumnInfo>> {
        let mut conn = self.connect().await?;
        let result = fetch_schema(&mut conn, table_name).await;
        Self::release(conn).await;
        result
    }

    async fn try_query(
        &self,
        table_name: &str,
        columns: Option<&str>,
        condition: Option<&str>,
    ) -> StoreResult<Vec<RowMap>> {
        let condition = match condition.map(str::trim).filter(|c| !c.is_empty()) {
            Some(clause) => Some(check_condition(clause)?).filter(|c| !c.is_empty()),
            None => None,
        };

        let mut conn = self.connect().await?;
        let result = run_select(&mut conn, table_name, columns, condition).await;
        Self::release(conn).await;
        result
    }

    async fn try_insert(&self, table_name: &str, data: &RowMap) -> StoreResult<i64> {
        let mut conn = self.connect().await?;
        let result = run_insert(&mut conn, table_name, data).await;
        Self::release(conn).await;
        result
    }

    async fn try_delete(&self, table_name: &str, condition: &str) -> StoreResult<u64> {
        let condition = check_condition(condition.trim())?;
        if condition.is_empty() {
            return Err(StoreError::Rejected(EMPTY_CONDITION_MESSAGE.to_string()));
        }

        let mut conn = self.connect().await?;
        let result = run_delete(&mut conn, table_name, condition).await;
        Self::release(conn).await;
        result
    }
}

// ----------------------------------------------------------------------
// Statements
// ----------------------------------------------------------------------

async fn fetch_table_names(conn: &mut SqliteConnection) -> StoreResult<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

async fn fetch_schema(conn: &mut SqliteConnection, table_name: &str) -> StoreResult<Vec<ColumnInfo>> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT name, type FROM pragma_table_info(?) ORDER BY cid")
            .bind(table_name)
            .fetch_all(&mut *conn)
            .await?;

    if rows.is_empty() {
        return Err(StoreError::TableNotFound(table_name.to_string()));
    }

    Ok(rows
        .into_iter()
        .map(|(name, column_type)| ColumnInfo { name, column_type })
        .collect())
}

async fn run_select(
    conn: &mut SqliteConnection,
    table_name: &str,
    columns: Option<&str>,
    condition: Option<&str>,
) -> StoreResult<Vec<RowMap>> {
    let schema = fetch_schema(conn, table_name).await?;
    let projection = build_projection(table_name, &schema, columns)?;

    let mut sql = format!("SELECT {} FROM {}", projection, quote_ident(table_name));
    if let Some(clause) = condition {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }

    debug!(sql = %sql, "Executing query");
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter().map(row_to_map).collect()
}

async fn run_insert(conn: &mut SqliteConnection, table_name: &str, data: &RowMap) -> StoreResult<i64> {
    let schema = fetch_schema(conn, table_name).await?;

    let mut names = Vec::with_capacity(data.len());
    for key in data.keys() {
        names.push(quote_ident(resolve_column(table_name, &schema, key)?));
    }
    let placeholders = vec!["?"; data.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table_name),
        names.join(", "),
        placeholders
    );

    debug!(sql = %sql, "Executing insert");
    let mut query = sqlx::query(&sql);
    for value in data.values() {
        query = bind_value(query, value);
    }

    let mut tx = conn.begin().await?;
    match query.execute(&mut *tx).await {
        Ok(done) => {
            tx.commit().await?;
            Ok(done.last_insert_rowid())
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(e.into())
        }
    }
}

async fn run_delete(conn: &mut SqliteConnection, table_name: &str, condition: &str) -> StoreResult<u64> {
    fetch_schema(conn, table_name).await?;

    let sql = format!("DELETE FROM {} WHERE {}", quote_ident(table_name), condition);
    debug!(sql = %sql, "Executing delete");

    let mut tx = conn.begin().await?;
    match sqlx::query(&sql).execute(&mut *tx).await {
        Ok(done) => {
            tx.commit().await?;
            Ok(done.rows_affected())
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(e.into())
        }
    }
}

// ----------------------------------------------------------------------
// Identifiers and values
// ----------------------------------------------------------------------

/// Quote an identifier for SQLite
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Map a caller-supplied column name onto the schema (case-insensitive)
fn resolve_column<'a>(table_name: &str, schema: &'a [ColumnInfo], name: &str) -> StoreResult<&'a str> {
    let wanted = name.trim();
    schema
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(wanted))
        .map(|c| c.name.as_str())
        .ok_or_else(|| {
            StoreError::Rejected(format!(
                "Unknown column '{}' in table '{}'.",
                wanted, table_name
            ))
        })
}

fn build_projection(table_name: &str, schema: &[ColumnInfo], columns: Option<&str>) -> StoreResult<String> {
    let requested = columns.map(str::trim).unwrap_or("");
    if requested.is_empty() || requested == "*" {
        return Ok("*".to_string());
    }

    let mut quoted = Vec::new();
    for name in requested.split(',') {
        if name.trim().is_empty() {
            return Err(StoreError::Rejected(format!(
                "Empty column name in projection '{}'.",
                requested
            )));
        }
        quoted.push(quote_ident(resolve_column(table_name, schema, name)?));
    }
    Ok(quoted.join(", "))
}

/// Refuse clauses that would stack a second statement
///
/// `;` inside quoted literals is data. A single trailing `;` is dropped.
fn check_condition(condition: &str) -> StoreResult<&str> {
    let mut quote: Option<char> = None;
    let mut terminator = None;

    for (pos, ch) in condition.char_indices() {
        match (quote, ch) {
            // Doubled quotes toggle twice and stay inside the literal
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'') | (None, '"') => quote = Some(ch),
            (None, ';') => {
                terminator = Some(pos);
                break;
            }
            (None, _) => {}
        }
    }

    match terminator {
        None => Ok(condition),
        Some(pos) if condition[pos + 1..].trim().is_empty() => Ok(condition[..pos].trim_end()),
        Some(_) => Err(StoreError::Rejected(
            "Condition must be a single WHERE clause; a second statement is not allowed."
                .to_string(),
        )),
    }
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &'q serde_json::Value) -> SqliteQuery<'q> {
    use serde_json::Value;

    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        // Nested structures are stored as JSON text
        Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
    }
}

fn row_to_map(row: &SqliteRow) -> StoreResult<RowMap> {
    let mut map = RowMap::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;

        let value = if raw.is_null() {
            serde_json::Value::Null
        } else {
            // The storage class of the value, not the declared column type
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" => serde_json::json!(row.try_get_unchecked::<i64, _>(idx)?),
                "REAL" | "NUMERIC" => serde_json::json!(row.try_get_unchecked::<f64, _>(idx)?),
                "TEXT" | "DATE" | "TIME" | "DATETIME" => {
                    serde_json::json!(row.try_get_unchecked::<String, _>(idx)?)
                }
                "BLOB" => {
                    let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
                    serde_json::json!(base64::engine::general_purpose::STANDARD.encode(bytes))
                }
                other => {
                    return Err(StoreError::Unexpected(format!(
                        "Unsupported value type '{}' in column '{}'",
                        other,
                        column.name()
                    )))
                }
            }
        };
        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}
