//! Shared handle to one verification session
//!
//! The request and submit controllers each hold a clone of the same handle.
//! State changes go through [`SessionHandle::update`], which publishes the new
//! state to every subscriber. No lock is held across an `.await`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing;
use uuid::Uuid;

use crate::domain::entities::email_type::EmailType;
use crate::domain::entities::session::VerificationSession;

use super::throttle::ThrottleTimer;
use super::types::VerificationCompleted;

type VerifiedCallback = Box<dyn FnOnce(VerificationCompleted) + Send>;
type SkipCallback = Box<dyn FnOnce() + Send>;

/// Callbacks the hosting surface registers when mounting a session
#[derive(Default)]
pub struct FlowCallbacks {
    on_verified: Option<VerifiedCallback>,
    on_skip: Option<SkipCallback>,
}

impl FlowCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once when a code is verified
    pub fn on_verified<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(VerificationCompleted) + Send + 'static,
    {
        self.on_verified = Some(Box::new(callback));
        self
    }

    /// Called once when the hosting surface abandons the flow without verifying
    pub fn on_skip<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_skip = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for FlowCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowCallbacks")
            .field("on_verified", &self.on_verified.is_some())
            .field("on_skip", &self.on_skip.is_some())
            .finish()
    }
}

struct SessionInner {
    state: watch::Sender<VerificationSession>,
    timer: Mutex<ThrottleTimer>,
    callbacks: Mutex<FlowCallbacks>,
}

/// Cloneable handle to the state of one verification session
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    /// Wrap a session with no callbacks
    pub fn new(session: VerificationSession) -> Self {
        Self::with_callbacks(session, FlowCallbacks::default())
    }

    /// Wrap a session with the hosting surface's callbacks
    pub fn with_callbacks(session: VerificationSession, callbacks: FlowCallbacks) -> Self {
        let (state, _) = watch::channel(session);
        Self {
            inner: Arc::new(SessionInner {
                state,
                timer: Mutex::new(ThrottleTimer::new()),
                callbacks: Mutex::new(callbacks),
            }),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> VerificationSession {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified after every state change
    pub fn subscribe(&self) -> watch::Receiver<VerificationSession> {
        self.inner.state.subscribe()
    }

    pub fn id(&self) -> Uuid {
        self.inner.state.borrow().id()
    }

    pub fn generation(&self) -> u64 {
        self.inner.state.borrow().generation()
    }

    pub fn email_type(&self) -> EmailType {
        self.inner.state.borrow().email_type()
    }

    /// Whether `generation` is still the live, non-terminal session
    pub fn is_current(&self, generation: u64) -> bool {
        let session = self.inner.state.borrow();
        session.generation() == generation && !session.is_terminal()
    }

    /// Apply a change to the session and publish it
    pub fn update<R>(&self, change: impl FnOnce(&mut VerificationSession) -> R) -> R {
        let mut output = None;
        self.inner.state.send_modify(|session| output = Some(change(session)));
        match output {
            Some(output) => output,
            None => unreachable!("send_modify always runs its closure"),
        }
    }

    /// Seconds left on the running cooldown, zero if none
    pub fn remaining_cooldown_seconds(&self) -> u64 {
        self.lock_timer().remaining_seconds()
    }

    /// Start (or restart) the request cooldown
    ///
    /// # Returns
    ///
    /// The cooldown deadline, or `None` when `duration` is zero
    pub fn start_cooldown(&self, duration: Duration) -> Option<Instant> {
        let mut timer = self.lock_timer();
        if duration.is_zero() {
            timer.cancel();
            return None;
        }

        let session = Arc::downgrade(&self.inner);
        let deadline = timer.start(duration, move |deadline| {
            if let Some(inner) = session.upgrade() {
                SessionHandle { inner }.cooldown_elapsed(deadline);
            }
        });
        Some(deadline)
    }

    pub fn cancel_cooldown(&self) {
        self.lock_timer().cancel();
    }

    /// Return to `Idle`; results of in-flight operations are discarded
    pub fn reset(&self) {
        self.cancel_cooldown();
        self.update(|session| session.reset());
        tracing::debug!(session_id = %self.id(), event = "session_reset", "Verification session reset");
    }

    /// Tear the session down without firing any callback
    pub fn teardown(&self) {
        self.cancel_cooldown();
        self.update(|session| session.close());
        *self.lock_callbacks() = FlowCallbacks::default();
        tracing::debug!(session_id = %self.id(), event = "session_closed", "Verification session closed");
    }

    /// Mark the session verified and fire the completion callback
    ///
    /// The callback is taken out of the handle, so it can fire only once.
    pub(crate) fn complete(&self, completed: VerificationCompleted) {
        self.cancel_cooldown();
        self.update(|session| session.complete());
        let callback = self.lock_callbacks().on_verified.take();
        if let Some(callback) = callback {
            callback(completed);
        }
    }

    /// Abandon the session and fire the skip callback
    pub(crate) fn skip(&self) {
        let callback = self.lock_callbacks().on_skip.take();
        self.teardown();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn cooldown_elapsed(&self, deadline: Instant) {
        if self.update(|session| session.cooldown_elapsed(deadline)) {
            tracing::debug!(
                session_id = %self.id(),
                event = "cooldown_elapsed",
                "Code requests are allowed again"
            );
        }
    }

    fn lock_timer(&self) -> MutexGuard<'_, ThrottleTimer> {
        self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_callbacks(&self) -> MutexGuard<'_, FlowCallbacks> {
        self.inner.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session", &*self.inner.state.borrow())
            .finish()
    }
}
