//! Activity repository contract and SQLite implementation.

use super::{
    ensure_connection_ready, note_unmatched_write, store_error, EntityKind, Operation, RepoError,
    RepoResult,
};
use crate::model::activity::{Activity, ActivityId};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

const ENTITY: EntityKind = EntityKind::Activity;

/// Repository interface for activity CRUD operations.
pub trait ActivityRepository {
    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId>;
    fn get_activity(&self, id: ActivityId) -> RepoResult<Activity>;
    /// Overwrites the name in place. Succeeds even when no row matches.
    fn update_activity(&self, activity: &Activity) -> RepoResult<()>;
    fn delete_activity(&self, id: ActivityId) -> RepoResult<()>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, ENTITY, "activities", &["id", "name"])?;
        Ok(Self { conn })
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId> {
        let id = self
            .conn
            .query_row(
                "INSERT INTO activities (name) VALUES (?1) RETURNING id;",
                [activity.name.as_str()],
                |row| row.get::<_, ActivityId>(0),
            )
            .map_err(store_error(ENTITY, Operation::Create))?;

        debug!("event=repo_create module=repo entity=activity status=ok id={id}");
        Ok(id)
    }

    fn get_activity(&self, id: ActivityId) -> RepoResult<Activity> {
        self.conn
            .query_row(
                "SELECT id, name FROM activities WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Activity {
                        id: row.get("id")?,
                        name: row.get("name")?,
                    })
                },
            )
            .optional()
            .map_err(store_error(ENTITY, Operation::Get))?
            .ok_or(RepoError::NotFound { entity: ENTITY, id })
    }

    fn update_activity(&self, activity: &Activity) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE activities SET name = ?1 WHERE id = ?2;",
                params![activity.name, activity.id],
            )
            .map_err(store_error(ENTITY, Operation::Update))?;

        if changed == 0 {
            note_unmatched_write(ENTITY, Operation::Update, activity.id);
        }
        Ok(())
    }

    fn delete_activity(&self, id: ActivityId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM activities WHERE id = ?1;", [id])
            .map_err(store_error(ENTITY, Operation::Delete))?;

        if changed == 0 {
            note_unmatched_write(ENTITY, Operation::Delete, id);
        }
        Ok(())
    }
}
