//! Route protection for pages that require a signed-in user.
//!
//! [`RouteGuard`] decides whether protected content may render. Without a
//! token or with a failed session it sends the user to the login page,
//! remembering where they were. Redirects inside the debounce window are
//! collapsed, and after `max_redirects` navigations the guard parks in
//! [`GuardView::Failed`] until the user asks to go to login.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::session::{AuthState, Session};

/// Message shown when redirects are exhausted without a server error.
const REDIRECT_LIMIT_MESSAGE: &str = "Unable to verify your session. Please log in again.";

/// Host navigation surface: current location, redirects, and toasts.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn redirect(&self, path: &str);
    fn notify(&self, message: &str);
}

#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub login_path: String,
    /// Minimum spacing between two redirects.
    pub debounce: Duration,
    /// Redirects allowed before the guard stops navigating on its own.
    pub max_redirects: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            debounce: Duration::from_secs(1),
            max_redirects: 3,
        }
    }
}

/// What the host should display for the guarded route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView {
    Loading,
    Redirecting,
    /// Offer a manual "Go to Login" action bound to [`RouteGuard::go_to_login`].
    Failed { message: String },
    Render,
}

pub struct RouteGuard {
    session: Session,
    navigator: Arc<dyn Navigator>,
    config: GuardConfig,
    view: GuardView,
    redirects: u32,
    last_redirect: Option<Instant>,
}

impl RouteGuard {
    pub fn new(session: Session, navigator: Arc<dyn Navigator>, config: GuardConfig) -> Self {
        Self {
            session,
            navigator,
            config,
            view: GuardView::Loading,
            redirects: 0,
            last_redirect: None,
        }
    }

    pub fn view(&self) -> &GuardView {
        &self.view
    }

    /// Evaluate on first display, checking the session with the server when
    /// its state is not yet known.
    pub async fn mount(&mut self) -> GuardView {
        if self.on_state_change() == GuardView::Loading {
            self.session.revalidate().await;
            return self.on_state_change();
        }
        self.view.clone()
    }

    /// Re-evaluate against the current token and session state.
    pub fn on_state_change(&mut self) -> GuardView {
        let has_token = self.session.token().is_some();
        let view = match self.session.state() {
            AuthState::Unauthenticated { error: Some(message) } => self.redirect(Some(message)),
            _ if !has_token => self.redirect(None),
            AuthState::Authenticated(_) => {
                self.redirects = 0;
                GuardView::Render
            }
            _ => GuardView::Loading,
        };
        self.view = view.clone();
        view
    }

    /// Manual navigation to the login page. Always navigates.
    pub fn go_to_login(&mut self) {
        self.remember_current_path();
        self.navigator.redirect(&self.config.login_path);
        self.last_redirect = Some(Instant::now());
        self.view = GuardView::Redirecting;
    }

    /// Mount, then follow session changes until `cancel` fires or the
    /// session is dropped.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut changes = self.session.subscribe();
        self.mount().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.on_state_change();
                }
            }
        }
    }

    fn redirect(&mut self, message: Option<String>) -> GuardView {
        let now = Instant::now();

        if self.redirects >= self.config.max_redirects {
            tracing::warn!(
                redirects = self.redirects,
                "Redirect limit reached; waiting for manual navigation"
            );
            return GuardView::Failed {
                message: message.unwrap_or_else(|| REDIRECT_LIMIT_MESSAGE.to_string()),
            };
        }

        if self
            .last_redirect
            .is_some_and(|last| now.duration_since(last) < self.config.debounce)
        {
            return GuardView::Redirecting;
        }

        if let Some(message) = &message {
            self.navigator.notify(message);
        }
        self.remember_current_path();
        self.redirects += 1;
        self.last_redirect = Some(now);
        tracing::debug!(attempt = self.redirects, "Redirecting to login");
        self.navigator.redirect(&self.config.login_path);
        GuardView::Redirecting
    }

    fn remember_current_path(&self) {
        let path = self.navigator.current_path();
        if path != self.config.login_path {
            self.session.remember_return_path(path);
        }
    }
}
