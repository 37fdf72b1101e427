use super::{json_body, path_id};
use crate::error::ApiError;
use crate::state::AppState;
use activity_core::{
    Activity, ActivityId, ActivityRepository, EntityKind, Operation, SqliteActivityRepository,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

const ENTITY: EntityKind = EntityKind::Activity;

#[derive(Debug, Serialize)]
pub struct ActivityCreated {
    pub activity_id: ActivityId,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/activities", post(create_activity))
        .route(
            "/activities/:id",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
}

async fn create_activity(
    State(state): State<AppState>,
    body: Result<Json<Activity>, JsonRejection>,
) -> Result<Json<ActivityCreated>, ApiError> {
    let activity = json_body(ENTITY, body)?;
    let activity_id = state
        .run(ENTITY, Operation::Create, move |conn| {
            SqliteActivityRepository::try_new(conn)?.create_activity(&activity)
        })
        .await?;
    Ok(Json(ActivityCreated { activity_id }))
}

async fn get_activity(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Activity>, ApiError> {
    let id = path_id(ENTITY, path)?;
    let activity = state
        .run(ENTITY, Operation::Get, move |conn| {
            SqliteActivityRepository::try_new(conn)?.get_activity(id)
        })
        .await?;
    Ok(Json(activity))
}

async fn update_activity(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Activity>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(ENTITY, path)?;
    let mut activity = json_body(ENTITY, body)?;
    activity.id = id;
    state
        .run(ENTITY, Operation::Update, move |conn| {
            SqliteActivityRepository::try_new(conn)?.update_activity(&activity)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_activity(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(ENTITY, path)?;
    state
        .run(ENTITY, Operation::Delete, move |conn| {
            SqliteActivityRepository::try_new(conn)?.delete_activity(id)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
