//! Route handlers, one module per entity family.
//!
//! Extractors are taken as `Result` so malformed identifiers and bodies are
//! answered with the entity's own 400 message instead of axum's defaults.

use crate::error::ApiError;
use activity_core::EntityKind;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;

pub mod activities;
pub mod user_activities;
pub mod users;

pub(crate) fn path_id(
    entity: EntityKind,
    path: Result<Path<i64>, PathRejection>,
) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::InvalidId(entity))
}

pub(crate) fn json_body<T>(
    entity: EntityKind,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::InvalidBody {
            entity,
            reason: rejection.body_text(),
        })
}
