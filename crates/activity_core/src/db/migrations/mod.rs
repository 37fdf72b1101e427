//! Embedded schema scripts for the activity tracker store.
//!
//! # Invariants
//! - Script versions are strictly increasing; the newest one is the schema
//!   every repository's readiness check expects.
//! - `PRAGMA user_version` records the last applied script.
//! - Pending scripts run under one write-locked transaction, and the version
//!   is re-read after the lock is held. Connections racing to open a fresh
//!   file therefore apply each script exactly once.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// `(version, script)` pairs, oldest first.
const SCRIPTS: &[(u32, &str)] = &[(1, include_str!("0001_init.sql"))];

/// Schema version produced by the newest embedded script.
pub fn latest_version() -> u32 {
    SCRIPTS.last().map_or(0, |&(version, _)| version)
}

/// Brings the schema on `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
/// - `Sqlite` when the lock cannot be taken within the busy timeout or a
///   script fails; the schema is then left at its previous version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    if ensure_supported(current_user_version(conn)?, latest)? == latest {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let found = ensure_supported(current_user_version(&tx)?, latest)?;
    if found == latest {
        // Another connection migrated while this one waited for the lock.
        return Ok(());
    }

    for &(version, script) in SCRIPTS.iter().skip_while(|&&(v, _)| v <= found) {
        tx.execute_batch(script)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={latest}");
    Ok(())
}

/// Reads the schema version recorded on the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

fn ensure_supported(found: u32, latest: u32) -> DbResult<u32> {
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }
    Ok(found)
}
