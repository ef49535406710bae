//! tmc-core - client library for TestMyCode course servers
//!
//! The [`TmcCore`] facade turns each operation into a [`Command`] that runs on a
//! bounded worker pool and hands back a [`CommandHandle`] to await. The crate
//! also keeps the exercise checksum cache and resolves which course a local
//! directory belongs to.

pub mod cli;
pub mod config;
pub mod core;
pub mod manager;
pub mod protocol;
pub mod tools;
pub mod utils;

// Re-export core types and traits for easier use
pub use core::{
    command::{Command, CommandContext, CommandOutput},
    data::{Course, Exercise, FeedbackAnswer, Review, RunResult, SubmissionResult},
    dispatcher::{CommandHandle, WorkerPool},
    facade::TmcCore,
    lister::{ExerciseLister, ProjectRootFinder},
    traits::{CommandExecutor, Packager, ProtocolClient, RootDetector, TestRunner},
};
pub use utils::error::{AppError, AppResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
