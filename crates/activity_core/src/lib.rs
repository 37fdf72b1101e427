//! Entity persistence for the activity tracker.
//!
//! Users, activity definitions and timestamped user activities are mapped
//! to a relational store through one repository per entity family.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::activity::{Activity, ActivityId};
pub use model::attributes::{AttributeBag, AttributeError, AttributeValue, KNEE_FEELING};
pub use model::user::{User, UserId};
pub use model::user_activity::{UserActivity, UserActivityId};
pub use repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
pub use repo::user_activity_repo::{SqliteUserActivityRepository, UserActivityRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{EntityKind, Operation, RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
