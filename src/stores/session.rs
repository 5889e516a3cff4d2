//! Session Store
//!
//! Authentication lifecycle and the current identity. Sole writer of the
//! persisted credential slots.

use std::sync::Arc;

use leptos::prelude::*;
use reactive_stores::Store;

use crate::commands;
use crate::models::{ProfileChanges, User};
use crate::navigation::{Navigator, Route};
use crate::storage::{CredentialStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::store::PendingGuard;
use crate::transport::{ApiError, ApiResult, Transport};

#[derive(Clone, Debug, Default, Store)]
pub struct SessionState {
    /// Identity from the "who am I" fetch, not from the login response
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub pending: bool,
    pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct SessionStore {
    state: Store<SessionState>,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStorage>,
    navigator: Arc<dyn Navigator>,
}

impl SessionStore {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            state: Store::new(SessionState::default()),
            transport,
            credentials,
            navigator,
        }
    }

    /// Reactive handle for views; the accessors below are untracked snapshots
    pub fn state(&self) -> Store<SessionState> {
        self.state
    }

    pub fn user(&self) -> Option<User> {
        self.state.user().get_untracked()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated().get_untracked()
    }

    pub fn pending(&self) -> bool {
        self.state.pending().get_untracked()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.last_error().get_untracked()
    }

    fn begin(&self) -> PendingGuard<impl FnOnce()> {
        let state = self.state;
        *state.pending().write() = true;
        *state.last_error().write() = None;
        PendingGuard::new(move || *state.pending().write() = false)
    }

    fn clear_error(&self) {
        *self.state.last_error().write() = None;
    }

    fn fail(&self, err: &ApiError, fallback: &str) {
        let message = err.message_or(fallback);
        log::warn!("[session] {}: {}", message, err);
        *self.state.last_error().write() = Some(message);
    }

    fn store_credential(&self, key: &str, value: &str) {
        if let Err(e) = self.credentials.set(key, value) {
            log::warn!("[session] could not persist {}: {}", key, e);
        }
    }

    fn clear_credential(&self, key: &str) {
        if let Err(e) = self.credentials.remove(key) {
            log::warn!("[session] could not clear {}: {}", key, e);
        }
    }

    /// Restore a persisted session.
    ///
    /// A stored access token marks the session authenticated before the
    /// identity fetch confirms it; a rejected token ends in `logout`.
    /// Returns `Ok(None)` when nothing was stored.
    pub async fn initialize(&self) -> ApiResult<Option<User>> {
        self.clear_error();
        if self.credentials.get(ACCESS_TOKEN_KEY).is_none() {
            log::debug!("[session] no stored credential");
            return Ok(None);
        }
        log::info!("[session] restoring stored session");
        *self.state.is_authenticated().write() = true;
        self.fetch_identity().await.map(Some)
    }

    /// Exchange credentials for tokens and load the identity.
    ///
    /// Navigates to the dashboard on success. Failures are recorded in
    /// `last_error` and reported as `false`.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let _pending = self.begin();
        match self.sign_in(email, password).await {
            Ok(user) => {
                log::info!("[session] signed in as {}", user.email);
                self.navigator.navigate(Route::Dashboard);
                true
            }
            Err(e) => {
                self.fail(&e, "Login failed");
                false
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<User> {
        let tokens = commands::login(self.transport.as_ref(), email, password).await?;

        self.store_credential(ACCESS_TOKEN_KEY, &tokens.access_token);
        if let Some(refresh_token) = &tokens.refresh_token {
            self.store_credential(REFRESH_TOKEN_KEY, refresh_token);
        }
        *self.state.is_authenticated().write() = true;

        self.fetch_identity().await
    }

    /// Create the account, then log in with the same credentials
    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> bool {
        let _pending = self.begin();
        match commands::register(self.transport.as_ref(), email, password, full_name).await {
            Ok(user) => {
                log::info!("[session] registered account {}", user.id);
                self.login(email, password).await
            }
            Err(e) => {
                self.fail(&e, "Registration failed");
                false
            }
        }
    }

    /// Drop the session and its persisted tokens, then navigate to login
    pub fn logout(&self) {
        self.clear_credential(ACCESS_TOKEN_KEY);
        self.clear_credential(REFRESH_TOKEN_KEY);

        *self.state.user().write() = None;
        *self.state.is_authenticated().write() = false;
        log::info!("[session] signed out");

        self.navigator.navigate(Route::Login);
    }

    /// Fetch the current identity.
    ///
    /// Unlike the other session operations this one raises: a failure logs
    /// the session out and is returned to the caller.
    pub async fn fetch_identity(&self) -> ApiResult<User> {
        self.clear_error();
        match commands::current_user(self.transport.as_ref()).await {
            Ok(user) => {
                *self.state.user().write() = Some(user.clone());
                Ok(user)
            }
            Err(e) => {
                self.fail(&e, "Failed to fetch user");
                self.logout();
                Err(e)
            }
        }
    }

    /// Send a partial profile update; `user` takes the server's version
    pub async fn update_profile(&self, changes: &ProfileChanges) -> bool {
        self.clear_error();
        match commands::update_current_user(self.transport.as_ref(), changes).await {
            Ok(user) => {
                *self.state.user().write() = Some(user);
                true
            }
            Err(e) => {
                self.fail(&e, "Failed to update profile");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::testing::{user_json, MockTransport};
    use serde_json::json;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    struct Fixture {
        store: SessionStore,
        transport: Arc<MockTransport>,
        credentials: Arc<MemoryStorage>,
        routes: UnboundedReceiver<Route>,
    }

    fn setup_with(credentials: MemoryStorage) -> Fixture {
        let transport = MockTransport::new();
        let credentials = Arc::new(credentials);
        let (tx, routes) = mpsc::unbounded_channel();
        let store = SessionStore::new(transport.clone(), credentials.clone(), Arc::new(tx));
        Fixture { store, transport, credentials, routes }
    }

    fn setup() -> Fixture {
        setup_with(MemoryStorage::new())
    }

    fn drain(routes: &mut UnboundedReceiver<Route>) -> Vec<Route> {
        let mut seen = Vec::new();
        while let Ok(route) = routes.try_recv() {
            seen.push(route);
        }
        seen
    }

    #[tokio::test]
    async fn test_login_persists_token_and_loads_user() {
        let mut fx = setup();
        fx.transport.ok("POST", "/api/v1/auth/login", json!({ "access_token": "T" }));
        fx.transport.ok("GET", "/api/v1/users/me", user_json(1, "a@b.com"));

        assert!(fx.store.login("a@b.com", "pw").await);

        assert_eq!(fx.credentials.get(ACCESS_TOKEN_KEY).as_deref(), Some("T"));
        assert_eq!(fx.credentials.get(REFRESH_TOKEN_KEY), None);
        assert!(fx.store.is_authenticated());
        assert_eq!(fx.store.user().map(|u| u.email), Some("a@b.com".to_string()));
        assert!(!fx.store.pending());
        assert_eq!(fx.store.last_error(), None);
        assert_eq!(drain(&mut fx.routes), vec![Route::Dashboard]);

        let calls = fx.transport.calls();
        assert_eq!(calls[0].body, Some(json!({ "username": "a@b.com", "password": "pw" })));
    }

    #[tokio::test]
    async fn test_login_keeps_refresh_token() {
        let fx = setup();
        fx.transport.ok(
            "POST",
            "/api/v1/auth/login",
            json!({ "access_token": "T", "refresh_token": "R", "token_type": "bearer" }),
        );
        fx.transport.ok("GET", "/api/v1/users/me", user_json(1, "a@b.com"));

        assert!(fx.store.login("a@b.com", "pw").await);
        assert_eq!(fx.credentials.get(REFRESH_TOKEN_KEY).as_deref(), Some("R"));
    }

    #[tokio::test]
    async fn test_login_rejected_reports_false() {
        let mut fx = setup();
        fx.transport.fail("POST", "/api/v1/auth/login", 401, Some("Incorrect email or password"));

        assert!(!fx.store.login("a@b.com", "wrong").await);

        assert!(!fx.store.is_authenticated());
        assert!(!fx.store.pending());
        assert_eq!(fx.store.last_error().as_deref(), Some("Incorrect email or password"));
        assert_eq!(fx.credentials.get(ACCESS_TOKEN_KEY), None);
        assert!(drain(&mut fx.routes).is_empty());
    }

    #[tokio::test]
    async fn test_login_network_failure_uses_fallback() {
        let fx = setup();

        assert!(!fx.store.login("a@b.com", "pw").await);
        assert_eq!(fx.store.last_error().as_deref(), Some("Login failed"));
    }

    #[tokio::test]
    async fn test_login_with_failing_identity_logs_out() {
        let mut fx = setup();
        fx.transport.ok("POST", "/api/v1/auth/login", json!({ "access_token": "T" }));
        fx.transport.fail("GET", "/api/v1/users/me", 401, Some("Could not validate credentials"));

        assert!(!fx.store.login("a@b.com", "pw").await);

        assert!(!fx.store.is_authenticated());
        assert_eq!(fx.store.user(), None);
        assert_eq!(fx.credentials.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(fx.store.last_error().as_deref(), Some("Could not validate credentials"));
        assert_eq!(drain(&mut fx.routes), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_register_chains_into_login() {
        let mut fx = setup();
        fx.transport.ok("POST", "/api/v1/auth/register", user_json(3, "new@b.com"));
        fx.transport.ok("POST", "/api/v1/auth/login", json!({ "access_token": "T" }));
        fx.transport.ok("GET", "/api/v1/users/me", user_json(3, "new@b.com"));

        assert!(fx.store.register("new@b.com", "pw", "New User").await);

        let calls = fx.transport.calls();
        assert_eq!(
            calls[0].body,
            Some(json!({ "email": "new@b.com", "password": "pw", "full_name": "New User" }))
        );
        assert_eq!(calls[1].path, "/api/v1/auth/login");
        assert!(fx.store.is_authenticated());
        assert!(!fx.store.pending());
        assert_eq!(drain(&mut fx.routes), vec![Route::Dashboard]);
    }

    #[tokio::test]
    async fn test_register_failure_has_own_message() {
        let fx = setup();
        fx.transport.fail("POST", "/api/v1/auth/register", 400, None);

        assert!(!fx.store.register("a@b.com", "pw", "A").await);

        assert_eq!(fx.store.last_error().as_deref(), Some("Registration failed"));
        assert_eq!(fx.transport.calls().len(), 1);
        assert!(!fx.store.pending());
    }

    #[tokio::test]
    async fn test_register_then_failing_login() {
        let fx = setup();
        fx.transport.ok("POST", "/api/v1/auth/register", user_json(3, "new@b.com"));
        fx.transport.fail("POST", "/api/v1/auth/login", 500, None);

        assert!(!fx.store.register("new@b.com", "pw", "New").await);

        assert_eq!(fx.store.last_error().as_deref(), Some("Login failed"));
        assert!(!fx.store.is_authenticated());
    }

    #[tokio::test]
    async fn test_initialize_without_token_is_anonymous() {
        let fx = setup();

        assert_eq!(fx.store.initialize().await.unwrap(), None);

        assert!(!fx.store.is_authenticated());
        assert!(fx.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_restores_session() {
        let mut fx = setup_with(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, "T"));
        fx.transport.ok("GET", "/api/v1/users/me", user_json(1, "a@b.com"));

        let user = fx.store.initialize().await.unwrap();

        assert_eq!(user.map(|u| u.id), Some(1));
        assert!(fx.store.is_authenticated());
        assert!(drain(&mut fx.routes).is_empty());
    }

    #[tokio::test]
    async fn test_identity_failure_forces_logout() {
        let mut fx = setup_with(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, "T"));
        fx.transport.ok("GET", "/api/v1/users/me", user_json(1, "a@b.com"));
        fx.store.initialize().await.unwrap();
        assert!(fx.store.is_authenticated());

        let err = fx.store.fetch_identity().await.unwrap_err();

        assert!(matches!(err, ApiError::Network(_)));
        assert!(!fx.store.is_authenticated());
        assert_eq!(fx.store.user(), None);
        assert_eq!(fx.credentials.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(fx.store.last_error().as_deref(), Some("Failed to fetch user"));
        assert_eq!(drain(&mut fx.routes), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let mut fx = setup_with(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, "T"));
        fx.credentials.set(REFRESH_TOKEN_KEY, "R").unwrap();
        fx.transport.ok("GET", "/api/v1/users/me", user_json(1, "a@b.com"));
        fx.store.initialize().await.unwrap();

        fx.store.logout();

        assert_eq!(fx.credentials.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(fx.credentials.get(REFRESH_TOKEN_KEY), None);
        assert_eq!(fx.store.user(), None);
        assert!(!fx.store.is_authenticated());
        assert_eq!(drain(&mut fx.routes), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_update_profile_replaces_user() {
        let fx = setup();
        let mut updated = user_json(1, "a@b.com");
        updated["full_name"] = json!("Ada King");
        fx.transport.ok("PUT", "/api/v1/users/me", updated);

        let changes = ProfileChanges { full_name: Some("Ada King".to_string()), ..Default::default() };
        assert!(fx.store.update_profile(&changes).await);

        assert_eq!(fx.store.user().map(|u| u.full_name), Some("Ada King".to_string()));
        assert_eq!(fx.transport.calls()[0].body, Some(json!({ "full_name": "Ada King" })));
    }

    #[tokio::test]
    async fn test_update_profile_failure_swallowed() {
        let fx = setup();
        fx.transport.fail("PUT", "/api/v1/users/me", 400, Some("Email already registered"));

        let changes = ProfileChanges { email: Some("taken@b.com".to_string()), ..Default::default() };
        assert!(!fx.store.update_profile(&changes).await);

        assert_eq!(fx.store.last_error().as_deref(), Some("Email already registered"));
        assert!(!fx.store.pending());
    }

    #[tokio::test]
    async fn test_update_profile_clears_earlier_error() {
        let fx = setup();
        let mut updated = user_json(1, "a@b.com");
        updated["full_name"] = json!("Ada King");
        fx.transport.ok("PUT", "/api/v1/users/me", updated);

        assert!(!fx.store.login("a@b.com", "pw").await);
        assert_eq!(fx.store.last_error().as_deref(), Some("Login failed"));

        let changes = ProfileChanges { full_name: Some("Ada King".to_string()), ..Default::default() };
        assert!(fx.store.update_profile(&changes).await);

        assert_eq!(fx.store.last_error(), None);
    }

    #[tokio::test]
    async fn test_fetch_identity_clears_earlier_error() {
        let fx = setup();
        fx.transport.fail("PUT", "/api/v1/users/me", 400, Some("Email already registered"));
        fx.transport.ok("GET", "/api/v1/users/me", user_json(1, "a@b.com"));

        assert!(!fx.store.update_profile(&ProfileChanges::default()).await);
        fx.store.fetch_identity().await.unwrap();

        assert_eq!(fx.store.last_error(), None);
    }

    #[tokio::test]
    async fn test_initialize_without_token_clears_earlier_error() {
        let fx = setup();

        assert!(!fx.store.login("a@b.com", "pw").await);
        assert_eq!(fx.store.initialize().await.unwrap(), None);

        assert_eq!(fx.store.last_error(), None);
    }
}
