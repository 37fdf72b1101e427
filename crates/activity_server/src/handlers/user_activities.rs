use super::{json_body, path_id};
use crate::error::ApiError;
use crate::state::AppState;
use activity_core::{
    EntityKind, Operation, SqliteUserActivityRepository, UserActivity, UserActivityId,
    UserActivityRepository,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

const ENTITY: EntityKind = EntityKind::UserActivity;

#[derive(Debug, Serialize)]
pub struct UserActivityCreated {
    pub user_activity_id: UserActivityId,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user-activities", post(create_user_activity))
        .route(
            "/user-activities/:id",
            get(get_user_activity)
                .put(update_user_activity)
                .delete(delete_user_activity),
        )
}

async fn create_user_activity(
    State(state): State<AppState>,
    body: Result<Json<UserActivity>, JsonRejection>,
) -> Result<Json<UserActivityCreated>, ApiError> {
    let user_activity = json_body(ENTITY, body)?;
    let user_activity_id = state
        .run(ENTITY, Operation::Create, move |conn| {
            SqliteUserActivityRepository::try_new(conn)?.create_user_activity(&user_activity)
        })
        .await?;
    Ok(Json(UserActivityCreated { user_activity_id }))
}

async fn get_user_activity(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserActivity>, ApiError> {
    let id = path_id(ENTITY, path)?;
    let user_activity = state
        .run(ENTITY, Operation::Get, move |conn| {
            SqliteUserActivityRepository::try_new(conn)?.get_user_activity(id)
        })
        .await?;
    Ok(Json(user_activity))
}

async fn update_user_activity(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UserActivity>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(ENTITY, path)?;
    let mut user_activity = json_body(ENTITY, body)?;
    user_activity.id = id;
    state
        .run(ENTITY, Operation::Update, move |conn| {
            SqliteUserActivityRepository::try_new(conn)?.update_user_activity(&user_activity)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user_activity(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(ENTITY, path)?;
    state
        .run(ENTITY, Operation::Delete, move |conn| {
            SqliteUserActivityRepository::try_new(conn)?.delete_user_activity(id)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
