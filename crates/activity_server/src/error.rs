//! Mapping from repository failures to HTTP responses.
//!
//! Bodies are short plain-text messages. Details of server-side failures go
//! to the log only.

use activity_core::{EntityKind, Operation, RepoError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{debug, error};
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ApiError {
    /// Path identifier is not an integer.
    InvalidId(EntityKind),
    /// Body is not valid JSON for the entity.
    InvalidBody { entity: EntityKind, reason: String },
    NotFound(EntityKind),
    /// Anything else: store, encoding, decoding or task failure.
    Failed {
        entity: EntityKind,
        operation: Operation,
        cause: anyhow::Error,
    },
}

impl ApiError {
    /// Classifies a repository error; only `NotFound` is surfaced to the
    /// client as such.
    pub fn from_repo(entity: EntityKind, operation: Operation, err: RepoError) -> Self {
        match err {
            RepoError::NotFound { entity, .. } => Self::NotFound(entity),
            other => Self::failed(entity, operation, other),
        }
    }

    pub fn failed(
        entity: EntityKind,
        operation: Operation,
        cause: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Failed {
            entity,
            operation,
            cause: cause.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidId(_) | Self::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidId(entity) => format!("Invalid {entity} ID"),
            Self::InvalidBody { .. } => "Invalid request body".to_string(),
            Self::NotFound(entity) => format!("{} not found", capitalized(&entity.to_string())),
            Self::Failed {
                entity, operation, ..
            } => format!("Failed to {} {entity}", verb(*operation)),
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { cause, .. } => write!(f, "{}: {cause:#}", self.message()),
            Self::InvalidBody { reason, .. } => write!(f, "{}: {reason}", self.message()),
            _ => f.write_str(&self.message()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Failed {
                entity, operation, ..
            } => error!(
                "event=request_failed module=server entity={} operation={} status=error error={}",
                entity.as_str(),
                operation.as_str(),
                self
            ),
            Self::InvalidBody { entity, reason } => debug!(
                "event=request_rejected module=server entity={} status=error error_code=invalid_body error={reason}",
                entity.as_str()
            ),
            _ => {}
        }
        (status, self.message()).into_response()
    }
}

/// Client-facing verb; reads are phrased as "retrieve".
fn verb(operation: Operation) -> &'static str {
    match operation {
        Operation::Get => "retrieve",
        other => other.as_str(),
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use activity_core::{EntityKind, Operation, RepoError};
    use axum::http::StatusCode;

    #[test]
    fn not_found_maps_to_404_with_entity_name() {
        let err = ApiError::from_repo(
            EntityKind::UserActivity,
            Operation::Get,
            RepoError::NotFound {
                entity: EntityKind::UserActivity,
                id: 3,
            },
        );
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "User activity not found");
    }

    #[test]
    fn other_repository_errors_map_to_500_without_details() {
        let err = ApiError::from_repo(
            EntityKind::User,
            Operation::Get,
            RepoError::MissingRequiredTable("users"),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to retrieve user");
        assert!(err.to_string().contains("users"));
    }

    #[test]
    fn request_errors_map_to_400() {
        let invalid_id = ApiError::InvalidId(EntityKind::Activity);
        assert_eq!(invalid_id.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid_id.message(), "Invalid activity ID");

        let invalid_body = ApiError::InvalidBody {
            entity: EntityKind::User,
            reason: "EOF while parsing".to_string(),
        };
        assert_eq!(invalid_body.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid_body.message(), "Invalid request body");
    }
}
