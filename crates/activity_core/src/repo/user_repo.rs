//! User repository contract and SQLite implementation.

use super::{
    ensure_connection_ready, note_unmatched_write, store_error, EntityKind, Operation, RepoError,
    RepoResult,
};
use crate::model::user::{User, UserId};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: EntityKind = EntityKind::User;

/// Repository interface for user CRUD operations.
pub trait UserRepository {
    /// Inserts username and password; the store assigns id and `created_at`.
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<User>;
    /// Overwrites username and password. Succeeds even when no row matches.
    fn update_user(&self, user: &User) -> RepoResult<()>;
    /// Succeeds even when no row matches.
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            ENTITY,
            "users",
            &["id", "username", "password", "created_at"],
        )?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        let id = self
            .conn
            .query_row(
                "INSERT INTO users (username, password)
                 VALUES (?1, ?2)
                 RETURNING id;",
                params![user.username, user.password],
                |row| row.get::<_, UserId>(0),
            )
            .map_err(store_error(ENTITY, Operation::Create))?;

        debug!("event=repo_create module=repo entity=user status=ok id={id}");
        Ok(id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<User> {
        self.conn
            .query_row(
                "SELECT id, username, password, created_at
                 FROM users
                 WHERE id = ?1;",
                [id],
                parse_user_row,
            )
            .optional()
            .map_err(store_error(ENTITY, Operation::Get))?
            .ok_or(RepoError::NotFound { entity: ENTITY, id })
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE users
                 SET username = ?1, password = ?2
                 WHERE id = ?3;",
                params![user.username, user.password, user.id],
            )
            .map_err(store_error(ENTITY, Operation::Update))?;

        if changed == 0 {
            note_unmatched_write(ENTITY, Operation::Update, user.id);
        }
        Ok(())
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id])
            .map_err(store_error(ENTITY, Operation::Delete))?;

        if changed == 0 {
            note_unmatched_write(ENTITY, Operation::Delete, id);
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password: row.get("password")?,
        created_at: row.get("created_at")?,
    })
}
