//! Course context resolution
//!
//! Maps a filesystem path to the course it was downloaded into by walking
//! upward to the nearest course marker, then to that course's exercises.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::core::data::{Course, Exercise};
use crate::core::traits::{ProtocolClient, RootDetector};
use crate::utils::error::{AppError, AppResult};

/// Marker file written into every downloaded course directory
pub const COURSE_MARKER: &str = ".tmc-course.json";

#[derive(Debug, Serialize, Deserialize)]
struct CourseMarker {
    id: u64,
    name: String,
}

/// Detects course roots by the presence of [`COURSE_MARKER`]
#[derive(Debug, Default, Clone)]
pub struct DefaultRootDetector;

impl RootDetector for DefaultRootDetector {
    fn has_marker(&self, dir: &Path) -> bool {
        dir.join(COURSE_MARKER).is_file()
    }

    fn course_at(&self, dir: &Path) -> Option<Course> {
        let content = std::fs::read_to_string(dir.join(COURSE_MARKER)).ok()?;
        let marker: CourseMarker = serde_json::from_str(&content).ok()?;
        Some(Course::new(marker.id, marker.name))
    }
}

pub fn write_course_marker(course_dir: &Path, course: &Course) -> AppResult<()> {
    let marker = CourseMarker {
        id: course.id,
        name: course.name.clone(),
    };
    let content = serde_json::to_string_pretty(&marker)
        .map_err(|e| AppError::System(format!("Failed to serialize course marker: {}", e)))?;
    std::fs::write(course_dir.join(COURSE_MARKER), content)?;
    Ok(())
}

pub struct ProjectRootFinder {
    detector: Arc<dyn RootDetector>,
}

impl ProjectRootFinder {
    pub fn new(detector: Arc<dyn RootDetector>) -> Self {
        Self { detector }
    }

    /// Nearest directory at or above `path` that carries a course marker
    pub fn find_root(&self, path: &Path) -> Option<PathBuf> {
        let start = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        start
            .ancestors()
            .find(|dir| self.detector.has_marker(dir))
            .map(Path::to_path_buf)
    }

    pub fn current_course(&self, path: &Path) -> Option<Course> {
        let root = self.find_root(path)?;
        self.detector.course_at(&root)
    }
}

impl Default for ProjectRootFinder {
    fn default() -> Self {
        Self::new(Arc::new(DefaultRootDetector))
    }
}

#[derive(Default)]
pub struct ExerciseLister {
    finder: ProjectRootFinder,
}

impl ExerciseLister {
    pub fn new(finder: ProjectRootFinder) -> Self {
        Self { finder }
    }

    pub fn finder(&self) -> &ProjectRootFinder {
        &self.finder
    }

    /// Exercises of the course `path` belongs to, never empty
    pub async fn list_exercises(
        &self,
        path: &Path,
        protocol: &dyn ProtocolClient,
    ) -> AppResult<Vec<Exercise>> {
        let course = self
            .finder
            .current_course(path)
            .ok_or_else(|| AppError::Protocol("No course found".to_string()))?;

        self.exercises_of(&course, protocol).await
    }

    /// The exercise whose directory contains `path`, and that directory
    pub async fn current_exercise(
        &self,
        path: &Path,
        protocol: &dyn ProtocolClient,
    ) -> AppResult<(Exercise, PathBuf)> {
        let root = self
            .finder
            .find_root(path)
            .ok_or_else(|| AppError::Protocol("No course found".to_string()))?;
        let course = self
            .finder
            .detector
            .course_at(&root)
            .ok_or_else(|| AppError::Protocol("No course found".to_string()))?;

        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let name = absolute
            .strip_prefix(&root)
            .ok()
            .and_then(|rest| match rest.components().next() {
                Some(Component::Normal(name)) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .ok_or_else(|| AppError::Protocol("No exercise found".to_string()))?;

        let exercises = self.exercises_of(&course, protocol).await?;
        let exercise = exercises
            .into_iter()
            .find(|exercise| exercise.name == name)
            .ok_or_else(|| AppError::Protocol("No exercise found".to_string()))?;

        Ok((exercise, root.join(name)))
    }

    async fn exercises_of(
        &self,
        course: &Course,
        protocol: &dyn ProtocolClient,
    ) -> AppResult<Vec<Exercise>> {
        debug!(course = %course.name, "fetching exercise listing");
        let exercises = protocol.fetch_exercises(course).await?;
        if exercises.is_empty() {
            return Err(AppError::Protocol("No exercises found".to_string()));
        }
        Ok(exercises)
    }
}
