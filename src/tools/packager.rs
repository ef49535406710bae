//! Exercise archives via the system `zip` and `unzip` tools

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::core::traits::Packager;
use crate::utils::error::{AppError, AppResult};

pub struct ZipPackager {
    zip_program: String,
    unzip_program: String,
}

impl Default for ZipPackager {
    fn default() -> Self {
        Self {
            zip_program: "zip".to_string(),
            unzip_program: "unzip".to_string(),
        }
    }
}

impl ZipPackager {
    pub fn new(zip_program: impl Into<String>, unzip_program: impl Into<String>) -> Self {
        Self {
            zip_program: zip_program.into(),
            unzip_program: unzip_program.into(),
        }
    }

    async fn extract(&self, archive_path: &Path, dest: &Path) -> AppResult<()> {
        tokio::fs::create_dir_all(dest).await?;

        let output = Command::new(&self.unzip_program)
            .args(["-o", "-q"])
            .arg(archive_path)
            .arg("-d")
            .arg(dest)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error(&self.unzip_program, e))?;

        if !output.status.success() {
            return Err(AppError::System(format!(
                "Unpacking into {} failed: {}",
                dest.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

fn spawn_error(program: &str, err: std::io::Error) -> AppError {
    AppError::System(format!("Failed to start '{}': {}", program, err))
}

#[async_trait]
impl Packager for ZipPackager {
    async fn pack(&self, dir: &Path) -> AppResult<Vec<u8>> {
        if !dir.is_dir() {
            return Err(AppError::MissingFile(format!(
                "exercise directory {} does not exist",
                dir.display()
            )));
        }

        let output = Command::new(&self.zip_program)
            .args(["-r", "-q", "-", "."])
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error(&self.zip_program, e))?;

        if !output.status.success() {
            return Err(AppError::System(format!(
                "Packing {} failed: {}",
                dir.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        debug!(dir = %dir.display(), bytes = output.stdout.len(), "packed exercise");
        Ok(output.stdout)
    }

    async fn unpack(&self, archive: &[u8], dest: &Path) -> AppResult<()> {
        let archive_path = dest.with_extension("download.zip");
        tokio::fs::write(&archive_path, archive).await?;

        let result = self.extract(&archive_path, dest).await;
        if let Err(e) = tokio::fs::remove_file(&archive_path).await {
            debug!(path = %archive_path.display(), error = %e, "could not remove archive");
        }

        // A partial directory would be skipped as already downloaded next time
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_dir_all(dest).await {
                debug!(dest = %dest.display(), error = %e, "could not remove partial exercise");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pack_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let packager = ZipPackager::default();

        let err = packager.pack(&dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(err, AppError::MissingFile(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_system_error() {
        let dir = tempfile::tempdir().unwrap();
        let packager = ZipPackager::new("tmc-no-such-zip", "tmc-no-such-unzip");

        let err = packager.pack(dir.path()).await.unwrap_err();
        assert!(matches!(err, AppError::System(_)));

        let dest = dir.path().join("viikko1-Tehtava1");
        let err = packager.unpack(b"not a zip", &dest).await.unwrap_err();
        assert!(matches!(err, AppError::System(_)));
        assert!(!dest.with_extension("download.zip").exists());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_failed_archive_write_leaves_no_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("viikko1-Tehtava1");
        std::fs::create_dir(dest.with_extension("download.zip")).unwrap();

        let err = ZipPackager::default().unpack(b"zip", &dest).await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert!(!dest.exists());
    }
}
