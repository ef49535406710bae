//! The client facade
//!
//! Each public operation validates its arguments on the caller's thread, turns
//! them into a [`Command`] and submits it exactly once. Nothing here waits for
//! a command to execute; callers await the returned [`CommandHandle`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::core::cache::CacheStore;
use crate::core::command::{Command, FromOutput};
use crate::core::data::{
    Course, Credentials, Exercise, FeedbackAnswer, Review, RunResult, SubmissionResult,
};
use crate::core::dispatcher::CommandHandle;
use crate::core::traits::CommandExecutor;
use crate::utils::error::{AppError, AppResult};

pub struct TmcCore {
    executor: Arc<dyn CommandExecutor>,
    cache: Arc<CacheStore>,
}

impl TmcCore {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            cache: Arc::new(CacheStore::new()),
        }
    }

    /// Create a facade with `cache_file` already active
    pub fn with_cache_file(
        cache_file: Option<&Path>,
        executor: Arc<dyn CommandExecutor>,
    ) -> AppResult<Self> {
        let core = Self::new(executor);
        core.cache.set(cache_file)?;
        Ok(core)
    }

    pub fn login(&self, username: &str, password: &str) -> AppResult<CommandHandle<bool>> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::InvalidArguments(
                "username and password must not be empty".to_string(),
            ));
        }
        self.dispatch(Command::Authenticate {
            credentials: Credentials::new(username, password),
        })
    }

    pub fn logout(&self) -> AppResult<CommandHandle<()>> {
        self.dispatch(Command::Logout)
    }

    pub fn select_server(&self, url: &str) -> AppResult<CommandHandle<()>> {
        if url.is_empty() {
            return Err(AppError::InvalidArguments(
                "server address must not be empty".to_string(),
            ));
        }
        self.dispatch(Command::ChooseServer {
            url: url.to_string(),
        })
    }

    pub fn list_courses(&self) -> AppResult<CommandHandle<Vec<Course>>> {
        self.dispatch(Command::ListCourses)
    }

    pub fn list_exercises(&self, path: impl AsRef<Path>) -> AppResult<CommandHandle<Vec<Exercise>>> {
        self.dispatch(Command::ListExercises {
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Download a course into `path`
    ///
    /// Whether a cache file is active is decided now. If one is, checksums are
    /// recorded into whichever file is active when the download completes.
    /// Without one every exercise counts as new.
    pub fn download_exercises(
        &self,
        path: impl AsRef<Path>,
        course_id: &str,
    ) -> AppResult<CommandHandle<Vec<Exercise>>> {
        let path = non_empty_path(path.as_ref(), "download")?;
        self.dispatch(Command::DownloadExercises {
            path,
            course_id: course_id.to_string(),
            cache: self
                .cache
                .current()
                .map(|_| Arc::clone(&self.cache)),
        })
    }

    /// Exercises of `course` that are new or changed since they were last recorded
    ///
    /// Requires an active cache file that still exists; otherwise fails with
    /// `AppError::MissingFile` before anything is submitted.
    pub fn get_new_and_updated_exercises(
        &self,
        course: &Course,
    ) -> AppResult<CommandHandle<Vec<Exercise>>> {
        self.cache.validate_for_read()?;
        self.dispatch(Command::GetExerciseUpdates {
            course: course.clone(),
            cache: Arc::clone(&self.cache),
        })
    }

    pub fn get_new_reviews(&self, course: &Course) -> AppResult<CommandHandle<Vec<Review>>> {
        self.dispatch(Command::GetUnreadReviews {
            course: course.clone(),
        })
    }

    pub fn test(&self, path: impl AsRef<Path>) -> AppResult<CommandHandle<RunResult>> {
        self.dispatch(Command::RunTests {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn send_feedback(
        &self,
        answers: Vec<FeedbackAnswer>,
        feedback_url: &str,
    ) -> AppResult<CommandHandle<bool>> {
        self.dispatch(Command::SendFeedback {
            answers,
            feedback_url: feedback_url.to_string(),
        })
    }

    pub fn submit(&self, path: impl AsRef<Path>) -> AppResult<CommandHandle<SubmissionResult>> {
        let path = non_empty_path(path.as_ref(), "submission")?;
        self.dispatch(Command::Submit { path })
    }

    pub fn paste(&self, path: impl AsRef<Path>) -> AppResult<CommandHandle<String>> {
        self.dispatch(Command::Paste {
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Activate `file` as the cache, migrating the previous cache's content into it
    pub fn set_cache_file(&self, file: Option<&Path>) -> AppResult<()> {
        self.cache.set(file)
    }

    pub fn cache_file(&self) -> Option<PathBuf> {
        self.cache.current()
    }

    fn dispatch<T: FromOutput>(&self, command: Command) -> AppResult<CommandHandle<T>> {
        debug!(command = %command.kind(), "dispatching");
        Ok(self.executor.submit(command)?.retype())
    }
}

fn non_empty_path(path: &Path, what: &str) -> AppResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(AppError::InvalidArguments(format!(
            "{} path must not be empty",
            what
        )));
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::CommandKind;
    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    /// Records submissions instead of running them
    #[derive(Default)]
    struct RecordingExecutor {
        submitted: Mutex<Vec<Command>>,
    }

    impl RecordingExecutor {
        fn count(&self, kind: CommandKind) -> usize {
            self.submitted
                .lock()
                .iter()
                .filter(|command| command.kind() == kind)
                .count()
        }

        fn total(&self) -> usize {
            self.submitted.lock().len()
        }

        fn last(&self) -> Command {
            self.submitted.lock().last().cloned().unwrap()
        }
    }

    impl CommandExecutor for RecordingExecutor {
        fn submit(&self, command: Command) -> AppResult<CommandHandle> {
            self.submitted.lock().push(command);
            let (_tx, rx) = oneshot::channel();
            Ok(CommandHandle::new(rx, None))
        }
    }

    fn setup() -> (TmcCore, Arc<RecordingExecutor>, tempfile::TempDir) {
        let executor = Arc::new(RecordingExecutor::default());
        let core = TmcCore::new(executor.clone());
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cachefile"), "").unwrap();
        std::fs::write(dir.path().join("file2.cache"), "").unwrap();
        (core, executor, dir)
    }

    #[test]
    fn test_login_submits_authenticate() {
        let (core, executor, _dir) = setup();
        core.login("test", "1234").unwrap();

        assert_eq!(executor.count(CommandKind::Authenticate), 1);
        assert_eq!(executor.total(), 1);
    }

    #[test]
    fn test_login_with_empty_credentials_fails() {
        let (core, executor, _dir) = setup();

        assert!(matches!(core.login("", ""), Err(AppError::InvalidArguments(_))));
        assert!(matches!(core.login("test", ""), Err(AppError::InvalidArguments(_))));
        assert!(matches!(core.login("", "1234"), Err(AppError::InvalidArguments(_))));
        assert_eq!(executor.total(), 0);
    }

    #[test]
    fn test_simple_operations_submit_matching_command() {
        let (core, executor, _dir) = setup();
        let course = Course::new(21, "k2015-ohpe");

        core.logout().unwrap();
        core.select_server("uusiServu").unwrap();
        core.list_courses().unwrap();
        core.list_exercises("path/kurssiin").unwrap();
        core.get_new_reviews(&course).unwrap();
        core.test("testi/polku").unwrap();
        core.send_feedback(Vec::new(), "internet.computer/file").unwrap();
        core.submit("polku/tiedostoon").unwrap();
        core.paste("polku/jonnekin").unwrap();

        for kind in [
            CommandKind::Logout,
            CommandKind::ChooseServer,
            CommandKind::ListCourses,
            CommandKind::ListExercises,
            CommandKind::GetUnreadReviews,
            CommandKind::RunTests,
            CommandKind::SendFeedback,
            CommandKind::Submit,
            CommandKind::Paste,
        ] {
            assert_eq!(executor.count(kind), 1, "{} submitted once", kind);
        }
        assert_eq!(executor.total(), 9);
    }

    #[test]
    fn test_select_server_with_empty_url_fails() {
        let (core, executor, _dir) = setup();

        assert!(matches!(core.select_server(""), Err(AppError::InvalidArguments(_))));
        assert_eq!(executor.total(), 0);
    }

    #[test]
    fn test_submit_with_empty_path_fails() {
        let (core, executor, _dir) = setup();

        assert!(matches!(core.submit(""), Err(AppError::InvalidArguments(_))));
        assert_eq!(executor.total(), 0);
    }

    #[test]
    fn test_download_with_empty_path_fails() {
        let (core, executor, _dir) = setup();

        assert!(matches!(
            core.download_exercises("", "2"),
            Err(AppError::InvalidArguments(_))
        ));
        assert_eq!(executor.total(), 0);
    }

    #[test]
    fn test_download_does_not_use_cache_if_not_set() {
        let (core, executor, _dir) = setup();
        core.download_exercises("/polku/tiedostoille", "21").unwrap();

        assert_eq!(executor.count(CommandKind::DownloadExercises), 1);
        assert!(!executor.last().cache_file_set());
    }

    #[test]
    fn test_download_uses_cache_if_set() {
        let (core, executor, dir) = setup();
        core.set_cache_file(Some(&dir.path().join("cachefile"))).unwrap();
        core.download_exercises("asdf", "asdf").unwrap();

        assert!(executor.last().cache_file_set());
    }

    #[test]
    fn test_updates_without_cache_file_submit_nothing() {
        let (core, executor, _dir) = setup();
        let course = Course::new(21, "k2015-ohpe");

        assert!(matches!(
            core.get_new_and_updated_exercises(&course),
            Err(AppError::MissingFile(_))
        ));
        assert_eq!(executor.count(CommandKind::GetExerciseUpdates), 0);
    }

    #[test]
    fn test_updates_with_deleted_cache_file_submit_nothing() {
        let (core, executor, dir) = setup();
        let cache_file = dir.path().join("cachefile");
        core.set_cache_file(Some(&cache_file)).unwrap();
        std::fs::remove_file(&cache_file).unwrap();

        assert!(matches!(
            core.get_new_and_updated_exercises(&Course::default()),
            Err(AppError::MissingFile(_))
        ));
        assert_eq!(executor.total(), 0);
    }

    #[test]
    fn test_updates_with_cache_file_submit_once() {
        let (core, executor, dir) = setup();
        let cache_file = dir.path().join("cachefile");
        core.set_cache_file(Some(&cache_file)).unwrap();
        core.get_new_and_updated_exercises(&Course::default()).unwrap();

        assert_eq!(executor.count(CommandKind::GetExerciseUpdates), 1);
        assert_eq!(core.cache_file(), Some(cache_file));
    }

    #[test]
    fn test_missing_cache_file_is_rejected() {
        let (core, executor, dir) = setup();

        assert!(matches!(
            core.set_cache_file(Some(&dir.path().join("nothere.cache"))),
            Err(AppError::MissingFile(_))
        ));
        assert!(matches!(core.set_cache_file(None), Err(AppError::MissingFile(_))));
        assert!(core.cache_file().is_none());
        assert_eq!(executor.total(), 0);
    }

    #[test]
    fn test_cache_file_given_at_construction() {
        let (_core, executor, dir) = setup();
        let cache_file = dir.path().join("cachefile");

        let core = TmcCore::with_cache_file(Some(&cache_file), executor.clone()).unwrap();
        core.get_new_and_updated_exercises(&Course::default()).unwrap();

        assert_eq!(core.cache_file(), Some(cache_file));
        assert_eq!(executor.count(CommandKind::GetExerciseUpdates), 1);
    }

    #[test]
    fn test_construction_with_missing_cache_file_fails() {
        let (_core, executor, dir) = setup();

        let missing = dir.path().join("nothere.cache");
        assert!(matches!(
            TmcCore::with_cache_file(Some(&missing), executor.clone()),
            Err(AppError::MissingFile(_))
        ));
        assert!(matches!(
            TmcCore::with_cache_file(None, executor),
            Err(AppError::MissingFile(_))
        ));
    }

    #[test]
    fn test_migrating_cache_file_keeps_old_data() {
        let (core, _executor, dir) = setup();
        let first = dir.path().join("cachefile");
        let second = dir.path().join("file2.cache");

        core.set_cache_file(Some(&first)).unwrap();
        std::fs::write(&first, r#"{"k2015-ohpe":{"viikko1-Tehtava1":"abc"}}"#).unwrap();
        core.set_cache_file(Some(&second)).unwrap();

        assert!(!std::fs::read_to_string(&second).unwrap().is_empty());
        assert!(!first.exists());
        assert_eq!(core.cache_file(), Some(second));
    }

    #[tokio::test]
    async fn test_handle_without_result_reports_dispatch_failure() {
        let (core, _executor, _dir) = setup();
        let handle = core.logout().unwrap();

        assert!(matches!(handle.await, Err(AppError::Dispatch(_))));
    }
}
