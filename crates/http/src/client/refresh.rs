//! Single-flight coordination of token refresh exchanges
//!
//! The first request to observe an expired session opens a refresh cycle and
//! receives the [`RefreshLead`], which the client hands to a detached task so
//! the exchange outlives the request that started it. Every request, the
//! opener included, waits on the cycle's outcome. A cycle
//! runs `IDLE -> REFRESHING -> IDLE`; settling clears the flag and drains the
//! waiters in one critical section, so a request failing afterwards starts a
//! new cycle.

use super::error::RefreshError;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// Outcome broadcast to every request waiting on a cycle: the new access
/// token or the reason the exchange failed
pub type RefreshOutcome = Result<String, RefreshError>;

#[derive(Debug, Default)]
struct CycleState {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Refresh coordinator owned by one client instance
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Arc<Mutex<CycleState>>,
}

/// Role a request takes in the current refresh cycle
#[derive(Debug)]
pub enum Ticket {
    /// No cycle was open; the lead must be driven to settlement and the
    /// waiter yields its outcome
    Leader(RefreshLead, RefreshWaiter),
    /// A cycle is open; wait for its outcome
    Follower(RefreshWaiter),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a refresh exchange is in flight
    pub fn is_refreshing(&self) -> bool {
        lock(&self.state).refreshing
    }

    /// Join the current cycle, or open one
    pub fn begin(&self) -> Ticket {
        let mut state = lock(&self.state);
        let (tx, rx) = oneshot::channel();
        state.waiters.push(tx);
        let waiter = RefreshWaiter { rx };
        if state.refreshing {
            Ticket::Follower(waiter)
        } else {
            state.refreshing = true;
            let lead = RefreshLead {
                state: Arc::clone(&self.state),
                settled: false,
            };
            Ticket::Leader(lead, waiter)
        }
    }
}

fn lock(state: &Mutex<CycleState>) -> std::sync::MutexGuard<'_, CycleState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Close the cycle and deliver `outcome`; returns how many requests were
/// waiting on it
fn settle(state: &Mutex<CycleState>, outcome: &RefreshOutcome) -> usize {
    let waiters = {
        let mut state = lock(state);
        state.refreshing = false;
        std::mem::take(&mut state.waiters)
    };
    let count = waiters.len();
    for waiter in waiters {
        // A receiver dropped by its caller is not an error
        let _ = waiter.send(outcome.clone());
    }
    count
}

/// Leadership of an open refresh cycle
///
/// Owns a handle on the coordinator state so it can move into a spawned
/// task. Must be settled with [`succeed`](Self::succeed) or
/// [`fail`](Self::fail); dropping it unsettled (the task panicked or its
/// runtime shut down) fails the cycle with [`RefreshError::Abandoned`].
#[derive(Debug)]
pub struct RefreshLead {
    state: Arc<Mutex<CycleState>>,
    settled: bool,
}

impl RefreshLead {
    /// Close the cycle, handing `token` to every waiting request
    pub fn succeed(mut self, token: &str) -> usize {
        self.settled = true;
        settle(&self.state, &Ok(token.to_string()))
    }

    /// Close the cycle, failing every waiting request with `error`
    pub fn fail(mut self, error: RefreshError) -> usize {
        self.settled = true;
        settle(&self.state, &Err(error))
    }
}

impl Drop for RefreshLead {
    fn drop(&mut self) {
        if !self.settled {
            settle(&self.state, &Err(RefreshError::Abandoned));
        }
    }
}

/// Pending outcome of a cycle led by another request
#[derive(Debug)]
pub struct RefreshWaiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshWaiter {
    pub async fn wait(self) -> RefreshOutcome {
        self.rx.await.unwrap_or(Err(RefreshError::Abandoned))
    }
}
