//! User activity repository contract and SQLite implementation.
//!
//! # Invariants
//! - Writes encode the attribute bag before issuing any statement, so an
//!   unencodable bag never produces a partial write.
//! - Reads decode the stored document after the row is fetched; a row that
//!   exists but does not decode is `MalformedAttributes`, not `NotFound`.
//! - `user_id`, `activity_id` and `recorded_at` are fixed at creation.

use super::{
    ensure_connection_ready, note_unmatched_write, now_epoch_ms, store_error, EntityKind,
    Operation, RepoError, RepoResult,
};
use crate::model::user_activity::{UserActivity, UserActivityId};
use log::{debug, error};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: EntityKind = EntityKind::UserActivity;

const USER_ACTIVITY_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "activity_id",
    "start_time",
    "end_time",
    "duration_ms",
    "mood",
    "attributes",
    "recorded_at",
];

/// Repository interface for user activity CRUD operations.
pub trait UserActivityRepository {
    /// Inserts the record with `recorded_at` set to the current time.
    fn create_user_activity(&self, user_activity: &UserActivity) -> RepoResult<UserActivityId>;
    fn get_user_activity(&self, id: UserActivityId) -> RepoResult<UserActivity>;
    /// Overwrites interval, duration, mood and attributes. Succeeds even
    /// when no row matches.
    fn update_user_activity(&self, user_activity: &UserActivity) -> RepoResult<()>;
    fn delete_user_activity(&self, id: UserActivityId) -> RepoResult<()>;
}

/// SQLite-backed user activity repository.
pub struct SqliteUserActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserActivityRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, ENTITY, "user_activities", USER_ACTIVITY_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl UserActivityRepository for SqliteUserActivityRepository<'_> {
    fn create_user_activity(&self, user_activity: &UserActivity) -> RepoResult<UserActivityId> {
        let attributes = encode_attributes(user_activity, Operation::Create)?;

        let id = self
            .conn
            .query_row(
                "INSERT INTO user_activities (
                    user_id,
                    activity_id,
                    start_time,
                    end_time,
                    duration_ms,
                    mood,
                    attributes,
                    recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                RETURNING id;",
                params![
                    user_activity.user_id,
                    user_activity.activity_id,
                    user_activity.start_time,
                    user_activity.end_time,
                    user_activity.duration_ms,
                    user_activity.mood,
                    attributes,
                    now_epoch_ms(),
                ],
                |row| row.get::<_, UserActivityId>(0),
            )
            .map_err(store_error(ENTITY, Operation::Create))?;

        debug!("event=repo_create module=repo entity=user_activity status=ok id={id}");
        Ok(id)
    }

    fn get_user_activity(&self, id: UserActivityId) -> RepoResult<UserActivity> {
        let (mut user_activity, document) = self
            .conn
            .query_row(
                "SELECT
                    id,
                    user_id,
                    activity_id,
                    start_time,
                    end_time,
                    duration_ms,
                    mood,
                    attributes,
                    recorded_at
                FROM user_activities
                WHERE id = ?1;",
                [id],
                parse_user_activity_row,
            )
            .optional()
            .map_err(store_error(ENTITY, Operation::Get))?
            .ok_or(RepoError::NotFound { entity: ENTITY, id })?;

        user_activity.decode_attributes(&document).map_err(|source| {
            error!(
                "event=repo_get module=repo entity=user_activity status=error id={id} error_code=malformed_attributes error={source}"
            );
            RepoError::MalformedAttributes { id, source }
        })?;

        Ok(user_activity)
    }

    fn update_user_activity(&self, user_activity: &UserActivity) -> RepoResult<()> {
        let attributes = encode_attributes(user_activity, Operation::Update)?;

        let changed = self
            .conn
            .execute(
                "UPDATE user_activities
                 SET
                    start_time = ?1,
                    end_time = ?2,
                    duration_ms = ?3,
                    mood = ?4,
                    attributes = ?5
                 WHERE id = ?6;",
                params![
                    user_activity.start_time,
                    user_activity.end_time,
                    user_activity.duration_ms,
                    user_activity.mood,
                    attributes,
                    user_activity.id,
                ],
            )
            .map_err(store_error(ENTITY, Operation::Update))?;

        if changed == 0 {
            note_unmatched_write(ENTITY, Operation::Update, user_activity.id);
        }
        Ok(())
    }

    fn delete_user_activity(&self, id: UserActivityId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM user_activities WHERE id = ?1;", [id])
            .map_err(store_error(ENTITY, Operation::Delete))?;

        if changed == 0 {
            note_unmatched_write(ENTITY, Operation::Delete, id);
        }
        Ok(())
    }
}

fn encode_attributes(user_activity: &UserActivity, operation: Operation) -> RepoResult<String> {
    user_activity.encode_attributes().map_err(|source| {
        error!(
            "event=repo_{operation} module=repo entity=user_activity status=error error_code=attribute_encoding error={source}"
        );
        RepoError::Encoding {
            entity: ENTITY,
            operation,
            source,
        }
    })
}

/// Reads scalar columns plus the raw attribute document, left undecoded.
fn parse_user_activity_row(row: &Row<'_>) -> rusqlite::Result<(UserActivity, Vec<u8>)> {
    // TEXT is what this repository writes; BLOB is accepted for rows written
    // by other tools. Anything else is left empty and fails to decode.
    let document = match row.get_ref("attributes")? {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes.to_vec(),
        _ => Vec::new(),
    };

    let user_activity = UserActivity {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        activity_id: row.get("activity_id")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        duration_ms: row.get("duration_ms")?,
        mood: row.get("mood")?,
        attributes: Default::default(),
        recorded_at: row.get("recorded_at")?,
    };

    Ok((user_activity, document))
}
