//! Core trait definitions for the collaborators of the facade
//!
//! The facade itself never talks to the network, the archive tools or the
//! filesystem layout directly. Each of those concerns sits behind one of the
//! traits below so that it can be swapped or faked in tests.

use async_trait::async_trait;
use std::path::Path;

use crate::core::command::Command;
use crate::core::data::{
    Course, Credentials, Exercise, FeedbackAnswer, Review, RunResult, SubmissionResult,
};
use crate::core::dispatcher::CommandHandle;
use crate::utils::error::AppResult;

/// Requests against the remote course service
///
/// Implementations own the session state (server address, credentials).
/// Retries, if any, belong here and not to the dispatcher.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Check the credentials against the server, remembering them on success
    async fn authenticate(&self, credentials: &Credentials) -> AppResult<bool>;

    /// Forget the stored credentials
    async fn logout(&self) -> AppResult<()>;

    /// Point subsequent requests at another server
    async fn choose_server(&self, url: &str) -> AppResult<()>;

    async fn fetch_courses(&self) -> AppResult<Vec<Course>>;

    /// Fetch a single course, including its exercise listing
    async fn fetch_course(&self, course_id: &str) -> AppResult<Course>;

    async fn fetch_exercises(&self, course: &Course) -> AppResult<Vec<Exercise>>;

    /// Download the packaged exercise template
    async fn download_exercise(&self, exercise: &Exercise) -> AppResult<Vec<u8>>;

    async fn fetch_unread_reviews(&self, course: &Course) -> AppResult<Vec<Review>>;

    async fn submit(&self, exercise: &Exercise, archive: Vec<u8>) -> AppResult<SubmissionResult>;

    async fn send_feedback(&self, answers: &[FeedbackAnswer], feedback_url: &str)
    -> AppResult<bool>;

    /// Upload a solution as a paste, returning the paste URL
    async fn paste(&self, exercise: &Exercise, archive: Vec<u8>) -> AppResult<String>;
}

/// Decides which directory is the root of a downloaded course
pub trait RootDetector: Send + Sync {
    fn has_marker(&self, dir: &Path) -> bool;

    /// Course described by the marker in `dir`
    ///
    /// Detectors whose marker carries no course id cannot name a course and
    /// keep this default.
    fn course_at(&self, _dir: &Path) -> Option<Course> {
        None
    }
}

/// Turns exercise directories into archives and back
#[async_trait]
pub trait Packager: Send + Sync {
    async fn pack(&self, dir: &Path) -> AppResult<Vec<u8>>;

    async fn unpack(&self, archive: &[u8], dest: &Path) -> AppResult<()>;
}

/// Runs an exercise's tests on this machine
#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run_tests(&self, dir: &Path) -> AppResult<RunResult>;
}

/// Accepts commands for out-of-line execution
///
/// `submit` must not block on the command's execution. It either hands the
/// command off and returns a handle, or fails with `AppError::Dispatch`.
pub trait CommandExecutor: Send + Sync {
    fn submit(&self, command: Command) -> AppResult<CommandHandle>;
}
