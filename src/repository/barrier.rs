//! One-shot initialization barrier.
//!
//! A barrier starts pending and is completed exactly once with a success
//! value or an error. Continuations registered with
//! [`InitBarrier::on_complete`] run exactly once with that outcome, whether
//! they were registered before or after completion. They are always
//! dispatched away from the caller: onto the current Tokio runtime when
//! there is one, otherwise onto a short-lived thread.

use crate::{Error, Result};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// Terminal outcome of a barrier.
pub type Outcome<T> = std::result::Result<T, Error>;

type Continuation<T> = Box<dyn FnOnce(Outcome<T>) + Send + 'static>;

enum State<T> {
    Pending(Vec<Continuation<T>>),
    Done(Outcome<T>),
}

/// Single-assignment completion gate with multi-waiter fan-out.
pub struct InitBarrier<T> {
    state: Mutex<State<T>>,
    ready: watch::Sender<Option<Outcome<T>>>,
}

impl<T> InitBarrier<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a pending barrier.
    #[must_use]
    pub fn new() -> Self {
        let (ready, _) = watch::channel(None);
        Self {
            state: Mutex::new(State::Pending(Vec::new())),
            ready,
        }
    }

    /// Returns true once the barrier has completed, successfully or not.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            State::Done(_)
        )
    }

    /// Returns the outcome if the barrier has completed.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome<T>> {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            State::Done(outcome) => Some(outcome.clone()),
            State::Pending(_) => None,
        }
    }

    /// Registers a continuation to run once with the terminal outcome.
    ///
    /// If the barrier is already complete the continuation is dispatched
    /// right away, but never runs on the calling stack.
    pub fn on_complete<F>(&self, continuation: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let outcome = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match &mut *state {
                State::Pending(queue) => {
                    queue.push(Box::new(continuation));
                    return;
                },
                State::Done(outcome) => outcome.clone(),
            }
        };
        dispatch(Box::new(continuation), outcome);
    }

    /// Waits until the barrier completes and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns the error the barrier was completed with.
    pub async fn wait(&self) -> Outcome<T> {
        let mut receiver = self.ready.subscribe();
        let outcome = receiver
            .wait_for(Option::is_some)
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "wait_for_barrier".to_string(),
                cause: e.to_string(),
            })?
            .clone();
        outcome.unwrap_or_else(|| {
            Err(Error::OperationFailed {
                operation: "wait_for_barrier".to_string(),
                cause: "barrier signalled without an outcome".to_string(),
            })
        })
    }

    /// Completes the barrier and dispatches every queued continuation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyCompleted`] if the barrier was already
    /// complete. The stored outcome is kept and no continuation runs again.
    pub fn complete(&self, outcome: Outcome<T>) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = match &mut *state {
            State::Done(_) => {
                drop(state);
                tracing::error!("Initialization barrier completed twice");
                return Err(Error::AlreadyCompleted);
            },
            State::Pending(queue) => std::mem::take(queue),
        };
        *state = State::Done(outcome.clone());
        drop(state);

        if let Err(e) = &outcome {
            tracing::error!(error = %e, "Initialization failed");
        }
        self.ready.send_replace(Some(outcome.clone()));

        for continuation in queue {
            dispatch(continuation, outcome.clone());
        }
        Ok(())
    }
}

impl<T> Default for InitBarrier<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch<T>(continuation: Continuation<T>, outcome: Outcome<T>)
where
    T: Send + 'static,
{
    metrics::counter!("init_barrier_continuations_total").increment(1);

    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(async move { continuation(outcome) });
        return;
    }

    let spawned = std::thread::Builder::new()
        .name("init-barrier".to_string())
        .spawn(move || continuation(outcome));
    if let Err(e) = spawned {
        tracing::error!(error = %e, "Failed to dispatch barrier continuation");
    }
}
