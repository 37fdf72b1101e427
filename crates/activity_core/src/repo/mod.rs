//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Own every statement issued against the store, one repository per
//!   entity family.
//! - Translate between entities and their stored rows.
//!
//! # Invariants
//! - "No such row" on a single-row read surfaces as `RepoError::NotFound`
//!   for that family, never as a store failure.
//! - Store failures are wrapped once with entity and operation context and
//!   are never retried.
//! - Update/delete of an absent identifier succeeds silently; the
//!   affected-row count is only logged.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::attributes::AttributeError;
use log::{error, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod activity_repo;
pub mod user_activity_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity family a repository error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Activity,
    UserActivity,
}

impl EntityKind {
    /// Lowercase label used in messages and log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Activity => "activity",
            Self::UserActivity => "user_activity",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Activity => f.write_str("activity"),
            Self::UserActivity => f.write_str("user activity"),
        }
    }
}

/// Repository operation named in errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Readiness checks run by `try_new`.
    Prepare,
    Create,
    Get,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Create => "create",
            Self::Get => "get",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error vocabulary shared by all repositories.
#[derive(Debug)]
pub enum RepoError {
    /// No row matches the identifier.
    NotFound { entity: EntityKind, id: i64 },
    /// The attribute bag could not be encoded; the store was not touched.
    Encoding {
        entity: EntityKind,
        operation: Operation,
        source: AttributeError,
    },
    /// The row was read but its attribute document does not decode.
    MalformedAttributes { id: i64, source: AttributeError },
    /// Any other failure reported by the store.
    Store {
        entity: EntityKind,
        operation: Operation,
        source: DbError,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Entity family the failing operation targeted, when known.
    pub fn entity(&self) -> Option<EntityKind> {
        match self {
            Self::NotFound { entity, .. }
            | Self::Encoding { entity, .. }
            | Self::Store { entity, .. } => Some(*entity),
            Self::MalformedAttributes { .. } => Some(EntityKind::UserActivity),
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Encoding {
                entity,
                operation,
                source,
            } => write!(f, "could not {operation} {entity}: {source}"),
            Self::MalformedAttributes { id, source } => {
                write!(f, "user activity {id} has unreadable attributes: {source}")
            }
            Self::Store {
                entity,
                operation,
                source,
            } => write!(f, "could not {operation} {entity}: {source}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encoding { source, .. } => Some(source),
            Self::MalformedAttributes { source, .. } => Some(source),
            Self::Store { source, .. } => Some(source),
            Self::NotFound { .. }
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

/// Returns a mapper that wraps a SQLite error with operation context and
/// logs it.
pub(crate) fn store_error(
    entity: EntityKind,
    operation: Operation,
) -> impl FnOnce(rusqlite::Error) -> RepoError {
    move |err| {
        error!(
            "event=repo_{operation} module=repo entity={} status=error error={err}",
            entity.as_str()
        );
        RepoError::Store {
            entity,
            operation,
            source: DbError::Sqlite(err),
        }
    }
}

/// Logs a write that matched no row. The write itself is not an error.
pub(crate) fn note_unmatched_write(entity: EntityKind, operation: Operation, id: i64) {
    warn!(
        "event=repo_{operation} module=repo entity={} status=ok id={id} rows_affected=0",
        entity.as_str()
    );
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// Verifies schema version and the table/columns a repository touches.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    entity: EntityKind,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(store_error(entity, Operation::Prepare))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table).map_err(store_error(entity, Operation::Prepare))? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    let present = table_columns(conn, table).map_err(store_error(entity, Operation::Prepare))?;
    if let Some(&column) = columns
        .iter()
        .find(|column| !present.iter().any(|name| name == *column))
    {
        return Err(RepoError::MissingRequiredColumn { table, column });
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
