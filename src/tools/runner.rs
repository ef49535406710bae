//! Local test execution for downloaded exercises

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::core::data::{RunResult, RunStatus};
use crate::core::traits::TestRunner;
use crate::utils::error::{AppError, AppResult};

/// Build files and the command that runs their tests, checked in order
const PROJECT_KINDS: &[(&str, &str, &[&str])] = &[
    ("Cargo.toml", "cargo", &["test"]),
    ("pom.xml", "mvn", &["-q", "test"]),
    ("build.gradle", "gradle", &["test"]),
    ("Makefile", "make", &["test"]),
    ("package.json", "npm", &["test"]),
];

#[derive(Debug, Default, Clone)]
pub struct ProcessTestRunner {
    command: Option<String>,
}

impl ProcessTestRunner {
    /// Run `command` through the shell instead of detecting the project kind
    pub fn with_command(command: Option<String>) -> Self {
        Self { command }
    }

    fn command_for(&self, dir: &Path) -> AppResult<Command> {
        if let Some(custom) = &self.command {
            let mut command = Command::new("sh");
            command.arg("-c").arg(custom);
            return Ok(command);
        }

        let (_, program, args) = PROJECT_KINDS
            .iter()
            .find(|(marker, _, _)| dir.join(marker).is_file())
            .ok_or_else(|| {
                AppError::System(format!("No test runner found for {}", dir.display()))
            })?;

        let mut command = Command::new(program);
        command.args(*args);
        Ok(command)
    }
}

#[async_trait]
impl TestRunner for ProcessTestRunner {
    async fn run_tests(&self, dir: &Path) -> AppResult<RunResult> {
        if !dir.is_dir() {
            return Err(AppError::MissingFile(format!(
                "exercise directory {} does not exist",
                dir.display()
            )));
        }

        let mut command = self.command_for(dir)?;
        debug!(dir = %dir.display(), "running tests");
        let output = command
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| AppError::System(format!("Failed to start test run: {}", e)))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        let exit_code = output.status.code().unwrap_or(-1);
        let status = match (output.status.success(), output.status.code()) {
            (true, _) => RunStatus::Passed,
            (false, Some(_)) => RunStatus::TestsFailed,
            (false, None) => RunStatus::Error,
        };
        info!(dir = %dir.display(), ?status, exit_code, "test run finished");

        Ok(RunResult {
            status,
            exit_code,
            output: text,
        })
    }
}
