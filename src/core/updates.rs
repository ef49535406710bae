//! Checksum bookkeeping behind "new and updated exercises"
//!
//! The cache file holds, per course, the checksum of every exercise the user
//! has already downloaded. An exercise is new or updated when the server
//! reports a checksum that differs from the recorded one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::data::Exercise;
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecksumCache {
    courses: BTreeMap<String, BTreeMap<String, String>>,
}

impl ChecksumCache {
    /// Read the cache, treating an empty file as an empty cache
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Io(format!("Failed to read cache file {}: {}", path.display(), e))
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            AppError::System(format!("Failed to parse cache file {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::System(format!("Failed to serialize cache: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            AppError::Io(format!("Failed to write cache file {}: {}", path.display(), e))
        })
    }

    pub fn checksum(&self, course_name: &str, exercise_name: &str) -> Option<&str> {
        self.courses
            .get(course_name)
            .and_then(|exercises| exercises.get(exercise_name))
            .map(String::as_str)
    }

    pub fn new_and_updated(&self, course_name: &str, exercises: &[Exercise]) -> Vec<Exercise> {
        exercises
            .iter()
            .filter(|exercise| {
                self.checksum(course_name, &exercise.name) != Some(exercise.checksum.as_str())
            })
            .cloned()
            .collect()
    }

    pub fn record(&mut self, course_name: &str, exercises: &[Exercise]) {
        let entry = self.courses.entry(course_name.to_string()).or_default();
        for exercise in exercises {
            entry.insert(exercise.name.clone(), exercise.checksum.clone());
        }
    }

    /// Record exercises that have no checksum yet, keeping existing entries
    pub fn record_missing(&mut self, course_name: &str, exercises: &[Exercise]) {
        let entry = self.courses.entry(course_name.to_string()).or_default();
        for exercise in exercises {
            entry
                .entry(exercise.name.clone())
                .or_insert_with(|| exercise.checksum.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_empty_cache() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cache = ChecksumCache::load(file.path()).unwrap();

        assert_eq!(cache, ChecksumCache::default());
    }

    #[test]
    fn test_new_and_updated_skips_seen_checksums() {
        let mut cache = ChecksumCache::default();
        cache.record(
            "k2015-ohpe",
            &[
                Exercise::new(1, "viikko1-Tehtava1", "aaa"),
                Exercise::new(2, "viikko1-Tehtava2", "bbb"),
            ],
        );

        let server = vec![
            Exercise::new(1, "viikko1-Tehtava1", "aaa"),
            Exercise::new(2, "viikko1-Tehtava2", "changed"),
            Exercise::new(3, "viikko1-Tehtava3", "ccc"),
        ];
        let fresh = cache.new_and_updated("k2015-ohpe", &server);

        let ids: Vec<_> = fresh.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(cache.new_and_updated("other-course", &server).len(), 3);
    }

    #[test]
    fn test_record_missing_keeps_existing_checksums() {
        let mut cache = ChecksumCache::default();
        cache.record("k2015-ohpe", &[Exercise::new(1, "viikko1-Tehtava1", "old")]);
        cache.record_missing(
            "k2015-ohpe",
            &[
                Exercise::new(1, "viikko1-Tehtava1", "new"),
                Exercise::new(2, "viikko1-Tehtava2", "bbb"),
            ],
        );

        assert_eq!(cache.checksum("k2015-ohpe", "viikko1-Tehtava1"), Some("old"));
        assert_eq!(cache.checksum("k2015-ohpe", "viikko1-Tehtava2"), Some("bbb"));
    }

    #[test]
    fn test_save_and_load_keep_recorded_checksums() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut cache = ChecksumCache::default();
        cache.record("k2015-ohpe", &[Exercise::new(1, "viikko1-Tehtava1", "aaa")]);
        cache.save(file.path()).unwrap();

        let loaded = ChecksumCache::load(file.path()).unwrap();
        assert_eq!(loaded.checksum("k2015-ohpe", "viikko1-Tehtava1"), Some("aaa"));
    }
}
