//! Ownership of the single active cache file
//!
//! The store only knows where the cache lives. Its content belongs to
//! [`crate::core::updates::ChecksumCache`].

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Default)]
pub struct CacheStore {
    current: Mutex<Option<PathBuf>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `candidate` the active cache file
    ///
    /// Content of a previously active file is copied into `candidate` and the
    /// old file removed. The pointer only moves once the copy has succeeded.
    pub fn set(&self, candidate: Option<&Path>) -> AppResult<()> {
        self.set_with(candidate, |from, to| std::fs::copy(from, to).map(|_| ()))
    }

    fn set_with(
        &self,
        candidate: Option<&Path>,
        copy: impl FnOnce(&Path, &Path) -> std::io::Result<()>,
    ) -> AppResult<()> {
        let candidate = candidate
            .ok_or_else(|| AppError::MissingFile("no cache file given".to_string()))?;
        if !candidate.is_file() {
            return Err(AppError::MissingFile(format!(
                "cache file {} does not exist",
                candidate.display()
            )));
        }

        let mut current = self.current.lock();
        if let Some(previous) = current.as_deref() {
            if !same_file(previous, candidate) && previous.is_file() {
                copy(previous, candidate).map_err(|e| {
                    AppError::Io(format!(
                        "Failed to migrate cache {} to {}: {}",
                        previous.display(),
                        candidate.display(),
                        e
                    ))
                })?;
                if let Err(e) = std::fs::remove_file(previous) {
                    warn!(path = %previous.display(), error = %e, "old cache file left behind");
                }
                info!(from = %previous.display(), to = %candidate.display(), "cache file migrated");
            }
        }

        *current = Some(candidate.to_path_buf());
        Ok(())
    }

    /// Run `f` against the active cache file while holding the pointer
    ///
    /// A migration cannot run concurrently, so whatever `f` writes ends up in
    /// the file that stays active.
    pub fn with_current<R>(&self, f: impl FnOnce(&Path) -> AppResult<R>) -> AppResult<R> {
        let current = self.current.lock();
        match current.as_deref() {
            Some(path) => f(path),
            None => Err(AppError::MissingFile("no cache file set".to_string())),
        }
    }

    pub fn current(&self) -> Option<PathBuf> {
        self.current.lock().clone()
    }

    /// The active cache file, provided it is set and still on disk
    pub fn validate_for_read(&self) -> AppResult<PathBuf> {
        let current = self.current.lock();
        match current.as_deref() {
            Some(path) if path.is_file() => Ok(path.to_path_buf()),
            Some(path) => Err(AppError::MissingFile(format!(
                "cache file {} no longer exists",
                path.display()
            ))),
            None => Err(AppError::MissingFile("no cache file set".to_string())),
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_rejects_missing_and_absent_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new();

        let err = store.set(None).unwrap_err();
        assert!(matches!(err, AppError::MissingFile(_)));

        let err = store.set(Some(&dir.path().join("nothere.cache"))).unwrap_err();
        assert!(matches!(err, AppError::MissingFile(_)));
        assert!(store.current().is_none());
    }

    #[test]
    fn test_failed_set_keeps_previous_file_active() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("cachefile");
        std::fs::write(&first, "{}").unwrap();

        let store = CacheStore::new();
        store.set(Some(&first)).unwrap();
        assert!(store.set(Some(&dir.path().join("fakeFile.cache"))).is_err());

        assert_eq!(store.current(), Some(first.clone()));
        assert!(first.exists());
    }

    #[test]
    fn test_failed_copy_keeps_previous_file_active() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("cachefile");
        let second = dir.path().join("file2.cache");
        std::fs::write(&first, r#"{"k2015-ohpe":{"viikko1":"abc"}}"#).unwrap();
        std::fs::write(&second, "").unwrap();

        let store = CacheStore::new();
        store.set(Some(&first)).unwrap();
        let err = store
            .set_with(Some(&second), |_, _| {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"))
            })
            .unwrap_err();

        assert!(matches!(err, AppError::Io(_)));
        assert_eq!(store.current(), Some(first.clone()));
        assert_eq!(
            std::fs::read_to_string(&first).unwrap(),
            r#"{"k2015-ohpe":{"viikko1":"abc"}}"#
        );
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "");
    }

    #[test]
    fn test_with_current_follows_migration() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("cachefile");
        let second = dir.path().join("file2.cache");
        std::fs::write(&first, "").unwrap();
        std::fs::write(&second, "").unwrap();

        let store = CacheStore::new();
        assert!(matches!(
            store.with_current(|path| Ok(path.to_path_buf())),
            Err(AppError::MissingFile(_))
        ));

        store.set(Some(&first)).unwrap();
        store.set(Some(&second)).unwrap();
        assert_eq!(store.with_current(|path| Ok(path.to_path_buf())).unwrap(), second);
    }

    #[test]
    fn test_migration_moves_content() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("cachefile");
        let second = dir.path().join("file2.cache");
        std::fs::write(&first, "").unwrap();
        std::fs::write(&second, "").unwrap();

        let store = CacheStore::new();
        store.set(Some(&first)).unwrap();
        std::fs::write(&first, r#"{"k2015-ohpe":{"viikko1":"abc"}}"#).unwrap();
        store.set(Some(&second)).unwrap();

        assert_eq!(
            std::fs::read_to_string(&second).unwrap(),
            r#"{"k2015-ohpe":{"viikko1":"abc"}}"#
        );
        assert!(!first.exists());
        assert_eq!(store.current(), Some(second));
    }

    #[test]
    fn test_setting_same_file_twice_keeps_it() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cachefile");
        std::fs::write(&file, "seen").unwrap();

        let store = CacheStore::new();
        store.set(Some(&file)).unwrap();
        store.set(Some(&file)).unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "seen");
        assert_eq!(store.current(), Some(file));
    }

    #[test]
    fn test_validate_for_read_notices_external_delete() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cachefile");
        std::fs::write(&file, "").unwrap();

        let store = CacheStore::new();
        assert!(matches!(store.validate_for_read(), Err(AppError::MissingFile(_))));

        store.set(Some(&file)).unwrap();
        assert_eq!(store.validate_for_read().unwrap(), file);

        std::fs::remove_file(&file).unwrap();
        assert!(matches!(store.validate_for_read(), Err(AppError::MissingFile(_))));
    }
}
