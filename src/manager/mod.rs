// Command handlers for the CLI
pub mod account;   // Login, logout and server selection
pub mod cache;     // Cache file management
pub mod course;    // Course listing, downloads, updates and reviews
pub mod exercise;  // Submissions, tests, pastes and feedback

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::command::CommandContext;
use crate::core::dispatcher::WorkerPool;
use crate::core::facade::TmcCore;
use crate::core::lister::ExerciseLister;
use crate::protocol::HttpProtocol;
use crate::tools::{ProcessTestRunner, ZipPackager};

/// Configuration plus the facade built from it, shared by all handlers
pub struct Session {
    pub config: Config,
    pub config_path: PathBuf,
    pub core: TmcCore,
}

impl Session {
    /// Build the collaborators and facade described by `config`
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(config: Config, config_path: PathBuf) -> Result<Self> {
        let protocol = HttpProtocol::new(&config.server).context("Failed to create server client")?;
        let context = CommandContext::new(
            Arc::new(protocol),
            ExerciseLister::default(),
            Arc::new(ZipPackager::default()),
            Arc::new(ProcessTestRunner::with_command(config.general.test_command.clone())),
        );
        let pool = WorkerPool::new(context, config.general.workers)?;
        let core = TmcCore::new(Arc::new(pool));

        match &config.general.cache_file {
            Some(path) if path.is_file() => core.set_cache_file(Some(path))?,
            Some(path) => warn!(path = %path.display(), "configured cache file is missing, update checks disabled"),
            None => {
                let path = Config::default_cache_path();
                ensure_file(&path)?;
                core.set_cache_file(Some(&path))?;
            }
        }
        info!(server = %config.server.url, workers = config.general.workers, "session ready");

        Ok(Self {
            config,
            config_path,
            core,
        })
    }

    pub fn save_config(&self) -> Result<()> {
        self.config
            .save_to(&self.config_path)
            .with_context(|| format!("Failed to save config to {}", self.config_path.display()))
    }
}

/// Create an empty file at `path` unless one exists
pub(crate) fn ensure_file(path: &Path) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, "").with_context(|| format!("Failed to create {}", path.display()))
}
