//! Client-side authentication state.
//!
//! A [`Session`] owns the current [`AuthState`], re-derives it from
//! `GET /api/auth/status` on demand, on a polling interval, and on focus,
//! and publishes every change through a `tokio::sync::watch` channel.
//!
//! Overlapping checks share one in-flight request. Login and logout bump an
//! epoch counter; a check that started before the bump never publishes its
//! result, and callers that joined it run a fresh check instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use pitchcraft_core::auth::{Credentials, SessionUser};
use pitchcraft_core::token::BearerToken;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::backend::AuthBackend;
use crate::error::ClientError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::single_flight::SingleFlight;
use crate::token_store::TokenStore;

/// Where the session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No check has completed yet.
    Unknown,
    Authenticated(SessionUser),
    /// No usable session. `error` is set when a check or login failed.
    Unauthenticated { error: Option<String> },
}

impl AuthState {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Unauthenticated { error } => error.as_deref(),
            _ => None,
        }
    }

    fn signed_out() -> Self {
        Self::Unauthenticated { error: None }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            error: Some(message.into()),
        }
    }
}

/// Value published on the watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: AuthState,
    pub loading: bool,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Period of the background status check.
    pub poll_interval: Duration,
    /// Whether [`Session::on_focus`] triggers a check.
    pub revalidate_on_focus: bool,
    /// Backoff for transient status and login failures.
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            revalidate_on_focus: true,
            retry: RetryPolicy::default(),
        }
    }
}

/// Result of a successful [`Session::login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub user: SessionUser,
    /// Path remembered by the route guard before it redirected to login.
    pub return_to: Option<String>,
}

/// Shared session handle. Clones observe and drive the same state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn AuthBackend>,
    tokens: TokenStore,
    config: SessionConfig,
    state: watch::Sender<SessionSnapshot>,
    checks: SingleFlight<(u64, AuthState)>,
    epoch: AtomicU64,
    return_path: Mutex<Option<String>>,
}

impl Session {
    pub fn new(backend: Arc<dyn AuthBackend>, tokens: TokenStore, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionSnapshot {
            state: AuthState::Unknown,
            loading: true,
        });
        Self {
            inner: Arc::new(Inner {
                backend,
                tokens,
                config,
                state,
                checks: SingleFlight::new(),
                epoch: AtomicU64::new(0),
                return_path: Mutex::new(None),
            }),
        }
    }

    // ---- Accessors ----

    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().state.clone()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.inner.state.borrow().state.user().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().state.error().map(str::to_string)
    }

    /// The stored token, validated.
    pub fn token(&self) -> Option<BearerToken> {
        self.inner.tokens.get_token()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Remember where to go after the next successful login.
    pub fn remember_return_path(&self, path: impl Into<String>) {
        *self.inner.return_slot() = Some(path.into());
    }

    pub fn take_return_path(&self) -> Option<String> {
        self.inner.return_slot().take()
    }

    // ---- Operations ----

    /// Re-derive the state from the server.
    ///
    /// Concurrent callers share one status request. Without a stored token
    /// the state becomes unauthenticated without any request.
    pub async fn revalidate(&self) -> AuthState {
        loop {
            let wanted = self.inner.epoch.load(Ordering::SeqCst);
            let inner = self.inner.clone();
            let (checked_at, state) = self.inner.checks.run(move || inner.check()).await;
            if checked_at >= wanted {
                return state;
            }
            tracing::debug!(checked_at, wanted, "Joined a stale session check; checking again");
        }
    }

    /// Exchange credentials for a token, then confirm the session.
    ///
    /// Transient failures are retried. Any other failure clears the stored
    /// token and is reflected in [`Session::error`].
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginSuccess, ClientError> {
        self.inner.bump_epoch();
        self.inner.set_loading();

        let result = retry_with_backoff(&self.inner.config.retry, ClientError::is_transient, || {
            self.inner.backend.login(credentials)
        })
        .await
        .and_then(|response| self.inner.tokens.set_token(&response.token));

        if let Err(e) = result {
            tracing::warn!(error = %e, "Login failed");
            self.inner.discard_token();
            self.inner.publish(AuthState::failed(e.user_message()));
            return Err(e);
        }

        match self.revalidate().await {
            AuthState::Authenticated(user) => {
                tracing::info!(user_id = user.id, "Logged in");
                Ok(LoginSuccess {
                    user,
                    return_to: self.take_return_path(),
                })
            }
            other => Err(ClientError::Unauthenticated(
                other
                    .error()
                    .unwrap_or("Login could not be confirmed")
                    .to_string(),
            )),
        }
    }

    /// Clear the token and sign out. Idempotent.
    ///
    /// The server is notified best-effort; its failure does not fail logout.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.inner.bump_epoch();
        let token = self.inner.tokens.get_token();
        self.inner.tokens.clear_token()?;

        if let Some(token) = token {
            if let Err(e) = self.inner.backend.logout(Some(&token)).await {
                tracing::warn!(error = %e, "Server logout failed; token cleared locally");
            }
        }

        self.inner.publish(AuthState::signed_out());
        tracing::info!("Logged out");
        Ok(())
    }

    /// Ask the server for a fresh token. Returns whether one was stored.
    ///
    /// Not retried.
    pub async fn refresh_token(&self) -> Result<bool, ClientError> {
        let Some(token) = self.inner.tokens.get_token() else {
            return Ok(false);
        };
        match self.inner.backend.refresh(&token).await? {
            Some(fresh) => {
                self.inner.tokens.set_token(&fresh)?;
                tracing::debug!("Token refreshed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Refresh only when the stored token's own expiry falls within
    /// `window` from now. Tokens without a readable expiry are left alone.
    pub async fn refresh_if_expiring(&self, window: chrono::Duration) -> Result<bool, ClientError> {
        let due = self
            .inner
            .tokens
            .get_token()
            .is_some_and(|token| token.is_expired_at(Utc::now() + window));
        if !due {
            return Ok(false);
        }
        self.refresh_token().await
    }

    /// Revalidate when the application regains focus, if enabled.
    pub async fn on_focus(&self) -> Option<AuthState> {
        if !self.inner.config.revalidate_on_focus {
            return None;
        }
        Some(self.revalidate().await)
    }

    /// Revalidate immediately and then every `poll_interval` until `cancel`
    /// fires.
    pub fn spawn_polling(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let session = self.clone();
        let period = self.inner.config.poll_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Session polling stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        session.revalidate().await;
                    }
                }
            }
        })
    }
}

impl Inner {
    async fn check(self: Arc<Self>) -> (u64, AuthState) {
        let epoch = self.epoch.load(Ordering::SeqCst);

        let Some(token) = self.tokens.get_token() else {
            return (epoch, self.publish_at(epoch, AuthState::signed_out()));
        };

        self.set_loading();
        let result = retry_with_backoff(&self.config.retry, ClientError::is_transient, || {
            self.backend.status(&token)
        })
        .await;

        let state = match result {
            Ok(status) => match status.user() {
                Some(user) => AuthState::Authenticated(user),
                None => {
                    self.discard_checked_token(epoch, &token);
                    AuthState::Unauthenticated {
                        error: status.error,
                    }
                }
            },
            Err(e) if e.is_auth_failure() => {
                tracing::info!(error = %e, "Session rejected; clearing token");
                self.discard_checked_token(epoch, &token);
                AuthState::failed(e.user_message())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session check failed");
                AuthState::failed(e.user_message())
            }
        };

        (epoch, self.publish_at(epoch, state))
    }

    fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    fn set_loading(&self) {
        self.state.send_modify(|snapshot| snapshot.loading = true);
    }

    fn publish(&self, state: AuthState) {
        self.state.send_replace(SessionSnapshot {
            state,
            loading: false,
        });
    }

    /// Publish only if no login or logout happened since `epoch`.
    fn publish_at(&self, epoch: u64, state: AuthState) -> AuthState {
        if self.epoch.load(Ordering::SeqCst) == epoch {
            self.publish(state.clone());
        }
        state
    }

    fn discard_token(&self) {
        if let Err(e) = self.tokens.clear_token() {
            tracing::warn!(error = %e, "Failed to clear token");
        }
    }

    /// Clear a token a check found rejected, unless a login or logout has
    /// happened since the check began or the stored token has changed.
    fn discard_checked_token(&self, epoch: u64, checked: &BearerToken) {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        match self.tokens.clear_token_if(checked) {
            Ok(true) => {}
            Ok(false) => tracing::debug!("Stored token changed during check; keeping it"),
            Err(e) => tracing::warn!(error = %e, "Failed to clear token"),
        }
    }

    fn return_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.return_path
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU32;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use pitchcraft_core::auth::{AuthStatus, LoginResponse};

    use super::*;

    const TOKEN: &str = "aaa.bbb.ccc";
    const FRESH_TOKEN: &str = "ddd.eee.fff";

    #[derive(Debug, Clone, Copy)]
    enum Reply {
        Ok,
        Unauthorized,
        Unavailable,
    }

    impl Reply {
        fn into_error(self) -> ClientError {
            match self {
                Reply::Unauthorized => ClientError::Api {
                    status: 401,
                    message: "Invalid or expired token".into(),
                },
                _ => ClientError::Api {
                    status: 503,
                    message: "Service unavailable".into(),
                },
            }
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        status_replies: Mutex<VecDeque<Reply>>,
        login_reply: Mutex<Option<Reply>>,
        rejected_token: Option<&'static str>,
        status_delay: Duration,
        status_calls: AtomicU32,
        logout_calls: AtomicU32,
    }

    impl FakeBackend {
        fn with_status(replies: impl IntoIterator<Item = Reply>) -> Self {
            Self {
                status_replies: Mutex::new(replies.into_iter().collect()),
                ..Default::default()
            }
        }

        fn status_calls(&self) -> u32 {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    fn user() -> SessionUser {
        SessionUser {
            id: 42,
            email: "user@example.com".into(),
            email_verified: true,
        }
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn status(&self, token: &BearerToken) -> Result<AuthStatus, ClientError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            if !self.status_delay.is_zero() {
                tokio::time::sleep(self.status_delay).await;
            }
            if self.rejected_token == Some(token.raw()) {
                return Err(Reply::Unauthorized.into_error());
            }
            let reply = self
                .status_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Reply::Ok);
            match reply {
                Reply::Ok => Ok(AuthStatus::authenticated(user())),
                other => Err(other.into_error()),
            }
        }

        async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, ClientError> {
            match self.login_reply.lock().unwrap().unwrap_or(Reply::Ok) {
                Reply::Ok => Ok(LoginResponse {
                    token: TOKEN.into(),
                    user_id: 42,
                }),
                Reply::Unauthorized => Err(ClientError::Api {
                    status: 401,
                    message: "Invalid email or password".into(),
                }),
                other => Err(other.into_error()),
            }
        }

        async fn logout(&self, _token: Option<&BearerToken>) -> Result<(), ClientError> {
            self.logout_calls.fetch_add(1, Ordering::SeqCst);
            Err(Reply::Unavailable.into_error())
        }

        async fn refresh(&self, _token: &BearerToken) -> Result<Option<String>, ClientError> {
            Ok(Some(FRESH_TOKEN.into()))
        }
    }

    fn session_with(backend: Arc<FakeBackend>) -> Session {
        Session::new(backend, TokenStore::in_memory(), SessionConfig::default())
    }

    fn credentials() -> Credentials {
        Credentials::new("user@example.com", "correct-horse")
    }

    #[tokio::test]
    async fn no_token_is_unauthenticated_without_request() {
        let backend = Arc::new(FakeBackend::default());
        let session = session_with(backend.clone());

        assert_eq!(session.state(), AuthState::Unknown);
        assert!(session.is_loading());

        assert_eq!(session.revalidate().await, AuthState::signed_out());
        assert_eq!(backend.status_calls(), 0);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn valid_token_authenticates() {
        let backend = Arc::new(FakeBackend::default());
        let session = session_with(backend.clone());
        session.tokens().set_token(TOKEN).unwrap();

        assert_eq!(session.revalidate().await, AuthState::Authenticated(user()));
        assert_eq!(session.user(), Some(user()));
        assert_eq!(session.error(), None);
    }

    #[tokio::test]
    async fn rejected_token_is_cleared() {
        let backend = Arc::new(FakeBackend::with_status([Reply::Unauthorized]));
        let session = session_with(backend.clone());
        session.tokens().set_token(TOKEN).unwrap();

        let state = session.revalidate().await;
        assert_eq!(state.error(), Some("Invalid or expired token"));
        assert!(session.token().is_none());
        assert_eq!(backend.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let backend = Arc::new(FakeBackend::with_status([
            Reply::Unavailable,
            Reply::Unavailable,
        ]));
        let session = session_with(backend.clone());
        session.tokens().set_token(TOKEN).unwrap();

        assert_eq!(session.revalidate().await, AuthState::Authenticated(user()));
        assert_eq!(backend.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_keep_token() {
        let backend = Arc::new(FakeBackend::with_status([Reply::Unavailable; 3]));
        let session = session_with(backend.clone());
        session.tokens().set_token(TOKEN).unwrap();

        let state = session.revalidate().await;
        assert_eq!(state.error(), Some("Service unavailable"));
        assert!(session.token().is_some());
        assert_eq!(backend.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_checks_share_one_request() {
        let backend = Arc::new(FakeBackend {
            status_delay: Duration::from_millis(200),
            ..Default::default()
        });
        let session = session_with(backend.clone());
        session.tokens().set_token(TOKEN).unwrap();

        let (a, b, c) = tokio::join!(
            session.revalidate(),
            session.revalidate(),
            session.revalidate()
        );

        assert_eq!(a, AuthState::Authenticated(user()));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(backend.status_calls(), 1);
    }

    #[tokio::test]
    async fn login_stores_token_and_returns_remembered_path() {
        let backend = Arc::new(FakeBackend::default());
        let session = session_with(backend.clone());
        session.remember_return_path("/projects/7");

        let success = session.login(&credentials()).await.unwrap();

        assert_eq!(success.user, user());
        assert_eq!(success.return_to.as_deref(), Some("/projects/7"));
        assert_eq!(session.take_return_path(), None);
        assert_eq!(session.token().unwrap().raw(), TOKEN);
        assert_eq!(session.user(), Some(user()));
    }

    #[tokio::test]
    async fn failed_login_clears_token_and_reports_message() {
        let backend = Arc::new(FakeBackend {
            login_reply: Mutex::new(Some(Reply::Unauthorized)),
            ..Default::default()
        });
        let session = session_with(backend.clone());
        session.tokens().set_token(TOKEN).unwrap();

        let err = session.login(&credentials()).await.unwrap_err();

        assert_matches!(err, ClientError::Api { status: 401, .. });
        assert_eq!(session.error().as_deref(), Some("Invalid email or password"));
        assert!(session.token().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn login_is_not_confused_by_a_stale_check() {
        let backend = Arc::new(FakeBackend {
            status_delay: Duration::from_millis(200),
            ..Default::default()
        });
        let session = session_with(backend.clone());
        session.tokens().set_token(TOKEN).unwrap();

        let stale = session.clone();
        let in_flight = tokio::spawn(async move { stale.revalidate().await });
        tokio::task::yield_now().await;

        let success = session.login(&credentials()).await.unwrap();
        assert_eq!(success.user, user());
        in_flight.await.unwrap();
        assert_eq!(session.state(), AuthState::Authenticated(user()));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_stale_check_keeps_the_login_token() {
        const EXPIRED: &str = "old.old.old";
        let backend = Arc::new(FakeBackend {
            rejected_token: Some(EXPIRED),
            status_delay: Duration::from_millis(200),
            ..Default::default()
        });
        let session = session_with(backend.clone());
        session.tokens().set_token(EXPIRED).unwrap();

        let stale = session.clone();
        let in_flight = tokio::spawn(async move { stale.revalidate().await });
        tokio::task::yield_now().await;

        let success = session.login(&credentials()).await.unwrap();
        assert_eq!(success.user, user());
        assert_eq!(session.token().unwrap().raw(), TOKEN);

        let stale_state = in_flight.await.unwrap();
        assert_eq!(stale_state.error(), Some("Invalid or expired token"));
        assert_eq!(session.state(), AuthState::Authenticated(user()));
        assert_eq!(session.token().unwrap().raw(), TOKEN);
        assert_eq!(backend.status_calls(), 2);
    }

    #[tokio::test]
    async fn rejected_check_without_login_still_clears_token() {
        let backend = Arc::new(FakeBackend {
            rejected_token: Some(TOKEN),
            ..Default::default()
        });
        let session = session_with(backend.clone());
        session.tokens().set_token(TOKEN).unwrap();

        session.revalidate().await;
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn logout_is_idempotent_and_best_effort() {
        let backend = Arc::new(FakeBackend::default());
        let session = session_with(backend.clone());
        session.login(&credentials()).await.unwrap();

        session.logout().await.unwrap();
        session.logout().await.unwrap();

        assert_eq!(session.state(), AuthState::signed_out());
        assert!(session.token().is_none());
        assert_eq!(backend.logout_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_stores_new_token() {
        let session = session_with(Arc::new(FakeBackend::default()));
        assert!(!session.refresh_token().await.unwrap());

        session.tokens().set_token(TOKEN).unwrap();
        assert!(session.refresh_token().await.unwrap());
        assert_eq!(session.token().unwrap().raw(), FRESH_TOKEN);
    }

    #[tokio::test]
    async fn opaque_token_is_never_due_for_refresh() {
        let session = session_with(Arc::new(FakeBackend::default()));
        session.tokens().set_token(TOKEN).unwrap();

        let refreshed = session
            .refresh_if_expiring(chrono::Duration::minutes(5))
            .await
            .unwrap();
        assert!(!refreshed);
        assert_eq!(session.token().unwrap().raw(), TOKEN);
    }

    #[tokio::test]
    async fn focus_revalidation_can_be_disabled() {
        let backend = Arc::new(FakeBackend::default());
        let session = Session::new(
            backend.clone(),
            TokenStore::in_memory(),
            SessionConfig {
                revalidate_on_focus: false,
                ..Default::default()
            },
        );
        session.tokens().set_token(TOKEN).unwrap();

        assert_eq!(session.on_focus().await, None);
        assert_eq!(backend.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_checks_on_interval_until_cancelled() {
        let backend = Arc::new(FakeBackend::default());
        let session = session_with(backend.clone());
        session.tokens().set_token(TOKEN).unwrap();
        let mut updates = session.subscribe();

        let cancel = CancellationToken::new();
        let handle = session.spawn_polling(cancel.clone());

        updates
            .wait_for(|snapshot| snapshot.state == AuthState::Authenticated(user()))
            .await
            .unwrap();

        // Ticks at 0s, 60s, and 120s.
        tokio::time::sleep(Duration::from_secs(125)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(backend.status_calls(), 3);
    }
}
