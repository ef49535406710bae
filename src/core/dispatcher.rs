//! Bounded worker pool executing commands out of line
//!
//! Submission spawns a task on the tokio runtime and returns at once. The task
//! waits for a semaphore permit, so at most `workers` commands execute at the
//! same time, then fulfils a oneshot that the caller awaits through
//! [`CommandHandle`].

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::{Semaphore, oneshot};
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::core::command::{Command, CommandContext, CommandOutput, FromOutput};
use crate::core::traits::CommandExecutor;
use crate::utils::error::{AppError, AppResult};

pub const DEFAULT_WORKERS: usize = 4;

/// Future resolving to the result of one dispatched command
pub struct CommandHandle<T = CommandOutput> {
    rx: oneshot::Receiver<AppResult<CommandOutput>>,
    abort: Option<AbortHandle>,
    _output: PhantomData<fn() -> T>,
}

impl<T> CommandHandle<T> {
    pub fn new(rx: oneshot::Receiver<AppResult<CommandOutput>>, abort: Option<AbortHandle>) -> Self {
        Self {
            rx,
            abort,
            _output: PhantomData,
        }
    }

    /// Abort the command if it has not finished yet
    ///
    /// Awaiting a cancelled handle yields `AppError::Dispatch`.
    pub fn cancel(&self) {
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub(crate) fn retype<U>(self) -> CommandHandle<U> {
        CommandHandle {
            rx: self.rx,
            abort: self.abort,
            _output: PhantomData,
        }
    }
}

impl<T: FromOutput> Future for CommandHandle<T> {
    type Output = AppResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result.and_then(T::from_output)),
            Poll::Ready(Err(_)) => Poll::Ready(Err(AppError::Dispatch(
                "command finished without reporting a result".to_string(),
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

pub struct WorkerPool {
    runtime: Handle,
    permits: Arc<Semaphore>,
    context: Arc<CommandContext>,
}

impl WorkerPool {
    /// Create a pool on the runtime the caller is running in
    pub fn new(context: CommandContext, workers: usize) -> AppResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| AppError::Dispatch(format!("No async runtime available: {}", e)))?;
        Ok(Self::with_runtime(runtime, context, workers))
    }

    pub fn with_runtime(runtime: Handle, context: CommandContext, workers: usize) -> Self {
        Self {
            runtime,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            context: Arc::new(context),
        }
    }

    /// Refuse new commands; queued ones resolve to a dispatch failure
    pub fn shutdown(&self) {
        self.permits.close();
    }

    pub fn is_shutdown(&self) -> bool {
        self.permits.is_closed()
    }
}

impl CommandExecutor for WorkerPool {
    fn submit(&self, command: Command) -> AppResult<CommandHandle> {
        if self.is_shutdown() {
            return Err(AppError::Dispatch("worker pool is shut down".to_string()));
        }

        let kind = command.kind();
        let permits = Arc::clone(&self.permits);
        let context = Arc::clone(&self.context);
        let (tx, rx) = oneshot::channel();

        let task = self.runtime.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => {
                    debug!(command = %kind, "command started");
                    let result = command.execute(&context).await;
                    if let Err(e) = &result {
                        warn!(command = %kind, error = %e, "command failed");
                    }
                    result
                }
                Err(_) => Err(AppError::Dispatch(format!(
                    "worker pool shut down before {} could run",
                    kind
                ))),
            };

            if tx.send(result).is_err() {
                debug!(command = %kind, "result dropped, handle no longer awaited");
            }
        });

        Ok(CommandHandle::new(rx, Some(task.abort_handle())))
    }
}
