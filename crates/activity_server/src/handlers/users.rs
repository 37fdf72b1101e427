use super::{json_body, path_id};
use crate::error::ApiError;
use crate::state::AppState;
use activity_core::{
    EntityKind, Operation, SqliteUserRepository, User, UserId, UserRepository,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

const ENTITY: EntityKind = EntityKind::User;

#[derive(Debug, Serialize)]
pub struct UserCreated {
    pub user_id: UserId,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<User>, JsonRejection>,
) -> Result<Json<UserCreated>, ApiError> {
    let user = json_body(ENTITY, body)?;
    let user_id = state
        .run(ENTITY, Operation::Create, move |conn| {
            SqliteUserRepository::try_new(conn)?.create_user(&user)
        })
        .await?;
    Ok(Json(UserCreated { user_id }))
}

async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let id = path_id(ENTITY, path)?;
    let user = state
        .run(ENTITY, Operation::Get, move |conn| {
            SqliteUserRepository::try_new(conn)?.get_user(id)
        })
        .await?;
    Ok(Json(user))
}

async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<User>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(ENTITY, path)?;
    let mut user = json_body(ENTITY, body)?;
    user.id = id;
    state
        .run(ENTITY, Operation::Update, move |conn| {
            SqliteUserRepository::try_new(conn)?.update_user(&user)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(ENTITY, path)?;
    state
        .run(ENTITY, Operation::Delete, move |conn| {
            SqliteUserRepository::try_new(conn)?.delete_user(id)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
