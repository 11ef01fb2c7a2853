//! Cancellable countdown bounding how often a code may be requested

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Cancellable countdown with a single expiry notification
///
/// The expiry callback runs on a task of the ambient tokio runtime, so on a
/// current-thread runtime it is delivered on the same scheduler as the rest
/// of the workflow. Starting again supersedes the running countdown; the
/// superseded callback never fires.
#[derive(Debug, Default)]
pub struct ThrottleTimer {
    deadline: Option<Instant>,
    task: Option<JoinHandle<()>>,
}

impl ThrottleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a countdown of `duration`
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `duration` - Length of the countdown
    /// * `on_expire` - Called once with the deadline when the countdown ends
    ///
    /// # Returns
    ///
    /// The deadline of the new countdown
    pub fn start<F>(&mut self, duration: Duration, on_expire: F) -> Instant
    where
        F: FnOnce(Instant) + Send + 'static,
    {
        self.cancel();

        let deadline = Instant::now() + duration;
        let task = tokio::spawn(async move {
            sleep_until(deadline).await;
            on_expire(deadline);
        });

        self.deadline = Some(deadline);
        self.task = Some(task);
        deadline
    }

    /// Stop the countdown without firing; a no-op once it has expired
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.deadline = None;
    }

    /// Time left before expiry, zero when not running
    pub fn remaining(&self) -> Duration {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    /// Time left rounded up to whole seconds
    pub fn remaining_seconds(&self) -> u64 {
        let remaining = self.remaining();
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    pub fn is_running(&self) -> bool {
        !self.remaining().is_zero()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl Drop for ThrottleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
