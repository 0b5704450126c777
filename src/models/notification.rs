// src/models/notification.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A user as known to the grading side (teacher or student).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserInfo {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    /// Display name; the username is shown when absent.
    #[validate(length(max = 300))]
    pub full_name: Option<String>,
}

impl UserInfo {
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }
}

/// The graded submission and the task it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmissionInfo {
    pub id: i64,
    pub assignment_id: i64,

    #[validate(length(min = 1, max = 500))]
    pub task_name: String,

    #[validate(range(min = 0.0))]
    pub max_points: Option<f64>,
}

/// DTO for reporting that a teacher scored a submission.
#[derive(Debug, Deserialize, Validate)]
pub struct PointsAssignedRequest {
    #[validate(nested)]
    pub teacher: UserInfo,
    #[validate(nested)]
    pub student: UserInfo,
    #[validate(nested)]
    pub submission: SubmissionInfo,
    #[validate(range(min = 0.0))]
    pub points: f64,
}
