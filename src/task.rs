use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use thiserror::Error;

/// How often the UI thread looks at a running task.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Shared progress cell + cancellation flag
// ---------------------------------------------------------------------------

/// Snapshot of a task's progress. `done == None` means "unknown, pulse".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub done: Option<u64>,
    pub total: u64,
    pub message: Option<String>,
}

impl Progress {
    /// Completed fraction in `0.0..=1.0`, `None` when indeterminate.
    pub fn fraction(&self) -> Option<f32> {
        let done = self.done?;
        if self.total == 0 {
            return Some(0.0);
        }
        Some((done.min(self.total) as f32) / (self.total as f32))
    }
}

#[derive(Debug, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Handle given to a running job: report progress, observe cancellation.
/// Cheap to clone; all clones share state.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    progress: Arc<Mutex<Progress>>,
    cancel: Arc<AtomicBool>,
}

impl TaskContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_progress(&self, done: u64, total: u64, message: Option<&str>) {
        let mut p = self.progress.lock().unwrap_or_else(PoisonError::into_inner);
        p.done = Some(done);
        p.total = total;
        if let Some(m) = message {
            p.message = Some(m.to_string());
        }
    }

    /// Switch to indeterminate progress.
    pub fn pulse(&self, message: &str) {
        let mut p = self.progress.lock().unwrap_or_else(PoisonError::into_inner);
        p.done = None;
        p.message = Some(message.to_string());
    }

    pub fn progress(&self) -> Progress {
        self.progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once cancellation was requested; call at safe points.
    pub fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// BackgroundTask – one job on its own thread
// ---------------------------------------------------------------------------

/// A single job running off the UI thread. The owner polls
/// [`try_finish`](Self::try_finish) every [`POLL_INTERVAL`].
pub struct BackgroundTask<T> {
    title: String,
    can_abort: bool,
    context: TaskContext,
    handle: Option<JoinHandle<Result<T>>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub fn spawn<F>(title: &str, can_abort: bool, job: F) -> Result<Self>
    where
        F: FnOnce(&TaskContext) -> Result<T> + Send + 'static,
    {
        let context = TaskContext::new();
        let worker_ctx = context.clone();
        let handle = thread::Builder::new()
            .name(format!("task: {title}"))
            .spawn(move || job(&worker_ctx))
            .with_context(|| format!("starting background task '{title}'"))?;
        log::debug!("Started background task '{title}'");
        Ok(Self {
            title: title.to_string(),
            can_abort,
            context,
            handle: Some(handle),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn can_abort(&self) -> bool {
        self.can_abort
    }

    pub fn progress(&self) -> Progress {
        self.context.progress()
    }

    /// Ask the job to stop. Ignored for tasks started with `can_abort = false`.
    pub fn cancel(&self) {
        if self.can_abort {
            log::info!("Cancelling '{}'", self.title);
            self.context.cancel();
        }
    }

    /// `Some(result)` exactly once, when the job has finished; `None` while
    /// it is still running and after the result was taken.
    pub fn try_finish(&mut self) -> Option<Result<T>> {
        if !self.handle.as_ref()?.is_finished() {
            return None;
        }
        let handle = self.handle.take()?;
        Some(self.join(handle))
    }

    /// Block until the job is done.
    #[cfg(test)]
    pub fn wait(mut self) -> Result<T> {
        match self.handle.take() {
            Some(handle) => self.join(handle),
            None => Err(anyhow!("result of '{}' was already taken", self.title)),
        }
    }

    fn join(&self, handle: JoinHandle<Result<T>>) -> Result<T> {
        handle
            .join()
            .unwrap_or_else(|_| Err(anyhow!("background task '{}' panicked", self.title)))
    }
}
