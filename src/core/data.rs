//! Core data structures for courses, exercises and server results
//!
//! These types are produced by the protocol layer and passed through commands
//! unchanged. None of them are mutated after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A course on the server together with its exercises
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Course {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub details_url: Option<String>,
    #[serde(default)]
    pub reviews_url: Option<String>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Course {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }
}

impl PartialEq for Course {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl Eq for Course {}

/// A single exercise of a course
///
/// `course_name` only refers back to the owning course, it does not own it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Exercise {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub zip_url: Option<String>,
    #[serde(default)]
    pub return_url: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
}

impl Exercise {
    pub fn new(id: u64, name: impl Into<String>, checksum: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            checksum: checksum.into(),
            ..Default::default()
        }
    }
}

impl PartialEq for Exercise {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Exercise {}

/// A code review left by course staff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub submission_id: u64,
    pub exercise_name: String,
    pub url: String,
    #[serde(default)]
    pub update_url: Option<String>,
    #[serde(default)]
    pub marked_as_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Outcome of a submission once the server has processed it
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubmissionResult {
    #[serde(default)]
    pub submission_url: String,
    #[serde(default)]
    pub paste_url: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub points: Vec<String>,
    #[serde(default)]
    pub all_tests_passed: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl SubmissionResult {
    pub fn is_processing(&self) -> bool {
        self.status == "processing"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    TestsFailed,
    Error,
}

/// Result of running an exercise's tests locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub status: RunStatus,
    pub exit_code: i32,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackAnswer {
    pub question_id: u64,
    pub answer: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_equality_uses_id() {
        let a = Exercise::new(7, "viikko1-Tehtava1", "abc");
        let b = Exercise::new(7, "renamed", "def");
        let c = Exercise::new(8, "viikko1-Tehtava1", "abc");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("student", "hunter2");
        let printed = format!("{:?}", creds);

        assert!(printed.contains("student"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_course_deserializes_without_optional_fields() {
        let course: Course = serde_json::from_str(r#"{"id": 21, "name": "k2015-ohpe"}"#).unwrap();

        assert_eq!(course, Course::new(21, "k2015-ohpe"));
        assert!(course.exercises.is_empty());
        assert!(course.reviews_url.is_none());
    }
}
