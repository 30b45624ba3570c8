//! Session state published to the application shell
//!
//! When the client gives up on a session (no refresh token, or the refresh
//! exchange failed) it publishes [`SessionState::LoginRequired`] and runs the
//! registered callbacks before the failing call returns. Shells either watch
//! the state or register a callback that navigates to the login entry point.

use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

/// Why a session ended without the user logging out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEndReason {
    /// An authorization failure arrived and no refresh token was stored
    MissingRefreshToken,
    /// The refresh exchange failed
    RefreshFailed(String),
}

impl std::fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRefreshToken => f.write_str("no refresh token available"),
            Self::RefreshFailed(message) => write!(f, "session refresh failed: {message}"),
        }
    }
}

/// Signal that the user must log in again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequired {
    pub reason: SessionEndReason,
    /// Route of the login entry point
    pub login_route: String,
}

/// Authentication state as seen by the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No credentials; the user never logged in or logged out
    Anonymous,
    /// An access token is stored
    Authenticated,
    /// Credentials were cleared by the client; authenticated views must go
    LoginRequired(LoginRequired),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

type LoginRequiredCallback = Arc<dyn Fn(&LoginRequired) + Send + Sync>;

/// Publishes session state changes
pub struct SessionSignal {
    state: watch::Sender<SessionState>,
    callbacks: RwLock<Vec<LoginRequiredCallback>>,
    login_route: String,
}

impl SessionSignal {
    pub fn new(initial: SessionState, login_route: impl Into<String>) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            callbacks: RwLock::new(Vec::new()),
            login_route: login_route.into(),
        }
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current state
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Run `callback` every time the client requires a new login
    pub fn on_login_required<F>(&self, callback: F)
    where
        F: Fn(&LoginRequired) + Send + Sync + 'static,
    {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(callback));
    }

    pub(crate) fn authenticated(&self) {
        self.state.send_replace(SessionState::Authenticated);
    }

    pub(crate) fn anonymous(&self) {
        self.state.send_replace(SessionState::Anonymous);
    }

    pub(crate) fn require_login(&self, reason: SessionEndReason) {
        let event = LoginRequired {
            reason,
            login_route: self.login_route.clone(),
        };
        self.state
            .send_replace(SessionState::LoginRequired(event.clone()));

        // Callbacks run outside the lock so they may register further callbacks
        let callbacks = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for callback in callbacks {
            callback(&event);
        }
    }
}

impl std::fmt::Debug for SessionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSignal")
            .field("state", &*self.state.borrow())
            .field("login_route", &self.login_route)
            .finish_non_exhaustive()
    }
}
