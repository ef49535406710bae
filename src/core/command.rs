//! Commands dispatched by the facade
//!
//! Every facade operation becomes one `Command` value. A command carries a
//! snapshot of everything it needs, is moved into the worker pool and runs
//! once against the shared `CommandContext`.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::cache::CacheStore;
use crate::core::data::{
    Course, Credentials, Exercise, FeedbackAnswer, Review, RunResult, SubmissionResult,
};
use crate::core::lister::{ExerciseLister, write_course_marker};
use crate::core::traits::{Packager, ProtocolClient, TestRunner};
use crate::core::updates::ChecksumCache;
use crate::utils::error::{AppError, AppResult};

/// Collaborators shared by all executing commands
pub struct CommandContext {
    pub protocol: Arc<dyn ProtocolClient>,
    pub lister: ExerciseLister,
    pub packager: Arc<dyn Packager>,
    pub runner: Arc<dyn TestRunner>,
}

impl CommandContext {
    pub fn new(
        protocol: Arc<dyn ProtocolClient>,
        lister: ExerciseLister,
        packager: Arc<dyn Packager>,
        runner: Arc<dyn TestRunner>,
    ) -> Self {
        Self {
            protocol,
            lister,
            packager,
            runner,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    Authenticate {
        credentials: Credentials,
    },
    Logout,
    ChooseServer {
        url: String,
    },
    ListCourses,
    ListExercises {
        path: PathBuf,
    },
    /// `cache` is present when a cache file was active at dispatch time
    DownloadExercises {
        path: PathBuf,
        course_id: String,
        cache: Option<Arc<CacheStore>>,
    },
    GetExerciseUpdates {
        course: Course,
        cache: Arc<CacheStore>,
    },
    GetUnreadReviews {
        course: Course,
    },
    Submit {
        path: PathBuf,
    },
    RunTests {
        path: PathBuf,
    },
    SendFeedback {
        answers: Vec<FeedbackAnswer>,
        feedback_url: String,
    },
    Paste {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Authenticate,
    Logout,
    ChooseServer,
    ListCourses,
    ListExercises,
    DownloadExercises,
    GetExerciseUpdates,
    GetUnreadReviews,
    Submit,
    RunTests,
    SendFeedback,
    Paste,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Authenticate => "authenticate",
            CommandKind::Logout => "logout",
            CommandKind::ChooseServer => "choose-server",
            CommandKind::ListCourses => "list-courses",
            CommandKind::ListExercises => "list-exercises",
            CommandKind::DownloadExercises => "download-exercises",
            CommandKind::GetExerciseUpdates => "get-exercise-updates",
            CommandKind::GetUnreadReviews => "get-unread-reviews",
            CommandKind::Submit => "submit",
            CommandKind::RunTests => "run-tests",
            CommandKind::SendFeedback => "send-feedback",
            CommandKind::Paste => "paste",
        };
        f.write_str(name)
    }
}

/// Payload produced by an executed command
#[derive(Debug, Clone)]
pub enum CommandOutput {
    Flag(bool),
    Done,
    Courses(Vec<Course>),
    Exercises(Vec<Exercise>),
    Reviews(Vec<Review>),
    Submission(SubmissionResult),
    Run(RunResult),
    Url(String),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Authenticate { .. } => CommandKind::Authenticate,
            Command::Logout => CommandKind::Logout,
            Command::ChooseServer { .. } => CommandKind::ChooseServer,
            Command::ListCourses => CommandKind::ListCourses,
            Command::ListExercises { .. } => CommandKind::ListExercises,
            Command::DownloadExercises { .. } => CommandKind::DownloadExercises,
            Command::GetExerciseUpdates { .. } => CommandKind::GetExerciseUpdates,
            Command::GetUnreadReviews { .. } => CommandKind::GetUnreadReviews,
            Command::Submit { .. } => CommandKind::Submit,
            Command::RunTests { .. } => CommandKind::RunTests,
            Command::SendFeedback { .. } => CommandKind::SendFeedback,
            Command::Paste { .. } => CommandKind::Paste,
        }
    }

    /// Whether a cache file was captured when the command was built
    pub fn cache_file_set(&self) -> bool {
        match self {
            Command::DownloadExercises { cache, .. } => cache.is_some(),
            Command::GetExerciseUpdates { .. } => true,
            _ => false,
        }
    }

    pub async fn execute(self, ctx: &CommandContext) -> AppResult<CommandOutput> {
        match self {
            Command::Authenticate { credentials } => {
                let accepted = ctx.protocol.authenticate(&credentials).await?;
                info!(username = %credentials.username, accepted, "authentication finished");
                Ok(CommandOutput::Flag(accepted))
            }
            Command::Logout => {
                ctx.protocol.logout().await?;
                Ok(CommandOutput::Done)
            }
            Command::ChooseServer { url } => {
                ctx.protocol.choose_server(&url).await?;
                Ok(CommandOutput::Done)
            }
            Command::ListCourses => Ok(CommandOutput::Courses(ctx.protocol.fetch_courses().await?)),
            Command::ListExercises { path } => {
                let exercises = ctx.lister.list_exercises(&path, ctx.protocol.as_ref()).await?;
                Ok(CommandOutput::Exercises(exercises))
            }
            Command::DownloadExercises {
                path,
                course_id,
                cache,
            } => {
                let downloaded =
                    download_exercises(ctx, &path, &course_id, cache.as_deref()).await?;
                Ok(CommandOutput::Exercises(downloaded))
            }
            Command::GetExerciseUpdates { course, cache } => {
                let exercises = ctx.protocol.fetch_exercises(&course).await?;
                let checksums = cache.with_current(ChecksumCache::load)?;
                Ok(CommandOutput::Exercises(
                    checksums.new_and_updated(&course.name, &exercises),
                ))
            }
            Command::GetUnreadReviews { course } => {
                let reviews = ctx.protocol.fetch_unread_reviews(&course).await?;
                Ok(CommandOutput::Reviews(reviews))
            }
            Command::Submit { path } => {
                let (exercise, dir) = ctx
                    .lister
                    .current_exercise(&path, ctx.protocol.as_ref())
                    .await?;
                let archive = ctx.packager.pack(&dir).await?;
                debug!(exercise = %exercise.name, bytes = archive.len(), "submitting exercise");
                Ok(CommandOutput::Submission(
                    ctx.protocol.submit(&exercise, archive).await?,
                ))
            }
            Command::RunTests { path } => Ok(CommandOutput::Run(ctx.runner.run_tests(&path).await?)),
            Command::SendFeedback {
                answers,
                feedback_url,
            } => {
                let sent = ctx.protocol.send_feedback(&answers, &feedback_url).await?;
                Ok(CommandOutput::Flag(sent))
            }
            Command::Paste { path } => {
                let (exercise, dir) = ctx
                    .lister
                    .current_exercise(&path, ctx.protocol.as_ref())
                    .await?;
                let archive = ctx.packager.pack(&dir).await?;
                Ok(CommandOutput::Url(ctx.protocol.paste(&exercise, archive).await?))
            }
        }
    }
}

/// Download every exercise of a course that is not already on disk
///
/// Exercises land in `<path>/<course name>/<exercise name>`. When a cache is
/// given, the checksums of what is on disk afterwards are recorded into its
/// active file, also when a later exercise fails, so that update checks
/// treat them as seen.
async fn download_exercises(
    ctx: &CommandContext,
    path: &Path,
    course_id: &str,
    cache: Option<&CacheStore>,
) -> AppResult<Vec<Exercise>> {
    let course = ctx.protocol.fetch_course(course_id).await?;
    let exercises = if course.exercises.is_empty() {
        ctx.protocol.fetch_exercises(&course).await?
    } else {
        course.exercises.clone()
    };

    let course_dir = path.join(path_segment(&course.name)?);
    for exercise in &exercises {
        path_segment(&exercise.name)?;
    }
    tokio::fs::create_dir_all(&course_dir).await?;
    write_course_marker(&course_dir, &course)?;

    let mut downloaded = Vec::new();
    let mut on_disk = Vec::new();
    let mut failure = None;
    for exercise in exercises {
        match fetch_exercise(ctx, &exercise, &course_dir.join(&exercise.name)).await {
            Ok(true) => downloaded.push(exercise),
            Ok(false) => on_disk.push(exercise),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    if let Some(cache) = cache {
        let recorded = cache.with_current(|cache_file| {
            let mut checksums = ChecksumCache::load(cache_file)?;
            checksums.record(&course.name, &downloaded);
            checksums.record_missing(&course.name, &on_disk);
            checksums.save(cache_file)
        });
        match (recorded, &failure) {
            (Err(e), None) => return Err(e),
            (Err(e), Some(_)) => warn!(error = %e, "checksums of downloaded exercises not recorded"),
            (Ok(()), _) => {}
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }
    info!(course = %course.name, count = downloaded.len(), "exercises downloaded");
    Ok(downloaded)
}

/// Unpack `exercise` into `target`, returning false when it is already there
async fn fetch_exercise(ctx: &CommandContext, exercise: &Exercise, target: &Path) -> AppResult<bool> {
    if tokio::fs::try_exists(target).await? {
        debug!(exercise = %exercise.name, "already downloaded, skipping");
        return Ok(false);
    }

    let archive = ctx.protocol.download_exercise(exercise).await?;
    ctx.packager.unpack(&archive, target).await?;
    Ok(true)
}

/// Server-provided name usable as exactly one directory below the download path
fn path_segment(name: &str) -> AppResult<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(AppError::Protocol(format!("Invalid name from server: '{}'", name))),
    }
}

/// Conversion from a command payload into the type a facade operation promises
pub trait FromOutput: Sized {
    fn from_output(output: CommandOutput) -> AppResult<Self>;
}

fn unexpected(output: &CommandOutput, wanted: &str) -> AppError {
    AppError::Dispatch(format!("expected {} but command produced {:?}", wanted, output))
}

impl FromOutput for CommandOutput {
    fn from_output(output: CommandOutput) -> AppResult<Self> {
        Ok(output)
    }
}

impl FromOutput for bool {
    fn from_output(output: CommandOutput) -> AppResult<Self> {
        match output {
            CommandOutput::Flag(flag) => Ok(flag),
            other => Err(unexpected(&other, "a flag")),
        }
    }
}

impl FromOutput for () {
    fn from_output(output: CommandOutput) -> AppResult<Self> {
        match output {
            CommandOutput::Done => Ok(()),
            other => Err(unexpected(&other, "no payload")),
        }
    }
}

impl FromOutput for Vec<Course> {
    fn from_output(output: CommandOutput) -> AppResult<Self> {
        match output {
            CommandOutput::Courses(courses) => Ok(courses),
            other => Err(unexpected(&other, "courses")),
        }
    }
}

impl FromOutput for Vec<Exercise> {
    fn from_output(output: CommandOutput) -> AppResult<Self> {
        match output {
            CommandOutput::Exercises(exercises) => Ok(exercises),
            other => Err(unexpected(&other, "exercises")),
        }
    }
}

impl FromOutput for Vec<Review> {
    fn from_output(output: CommandOutput) -> AppResult<Self> {
        match output {
            CommandOutput::Reviews(reviews) => Ok(reviews),
            other => Err(unexpected(&other, "reviews")),
        }
    }
}

impl FromOutput for SubmissionResult {
    fn from_output(output: CommandOutput) -> AppResult<Self> {
        match output {
            CommandOutput::Submission(result) => Ok(result),
            other => Err(unexpected(&other, "a submission result")),
        }
    }
}

impl FromOutput for RunResult {
    fn from_output(output: CommandOutput) -> AppResult<Self> {
        match output {
            CommandOutput::Run(result) => Ok(result),
            other => Err(unexpected(&other, "a test run result")),
        }
    }
}

impl FromOutput for String {
    fn from_output(output: CommandOutput) -> AppResult<Self> {
        match output {
            CommandOutput::Url(url) => Ok(url),
            other => Err(unexpected(&other, "a url")),
        }
    }
}
