//! Current-session ownership and the auth workflows.
//!
//! `AuthSession` is built once at process start and handed by reference to
//! every consumer; the current value is exposed through a watch channel
//! instead of ambient global state.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, instrument};
use uuid::Uuid;

use backend::{AuthApi, AuthEvent, BackendError, BackendSession, RowStore};
use common::notify::Notices;
use models::perfil::{self, Perfil, PerfilRow};

const PERFILES_TABLE: &str = "perfiles";

/// Lifecycle of the authenticated identity. `Authenticating` covers process
/// start until the backend reports session status.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Authenticating,
    Anonymous,
    Authenticated(CurrentUser),
}

/// Signed-in user; `perfil` stays `None` while its fetch is in flight or
/// when the fetch failed.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub perfil: Option<Perfil>,
}

/// Result of a credential operation, rendered inline by the calling form.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl AuthOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

struct Inner<B> {
    backend: Arc<B>,
    notices: Notices,
    tx: watch::Sender<SessionState>,
}

pub struct AuthSession<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for AuthSession<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: RowStore + AuthApi + 'static> AuthSession<B> {
    pub fn new(backend: Arc<B>, notices: Notices) -> Self {
        let (tx, _) = watch::channel(SessionState::Authenticating);
        Self {
            inner: Arc::new(Inner {
                backend,
                notices,
                tx,
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> SessionState {
        self.inner.tx.borrow().clone()
    }

    /// Reactive view of the current state; consumers await `changed()`.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.tx.subscribe()
    }

    /// Resolve any existing session and begin consuming the backend's
    /// auth-state events.
    pub async fn start(&self) {
        match self.inner.backend.current_session().await {
            Ok(session) => self.apply_session(session),
            Err(e) => {
                error!(error = %e, "no se pudo consultar la sesión inicial");
                self.inner.tx.send_replace(SessionState::Anonymous);
            }
        }
        let mut events = self.inner.backend.subscribe();
        let listener = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => listener.on_event(event),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Check credentials against the backend. Failures come back inside the
    /// outcome, never as an error.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use backend::MemoryBackend;
    /// use common::notify::Notices;
    /// use service::session::AuthSession;
    /// let backend = Arc::new(MemoryBackend::new());
    /// backend.register_user("ana@example.com", "secreta123");
    /// let auth = AuthSession::new(backend, Notices::new());
    /// let outcome = tokio_test::block_on(auth.sign_in("ana@example.com", "secreta123"));
    /// assert!(outcome.success);
    /// ```
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthOutcome {
        match self.inner.backend.sign_in(email, password).await {
            Ok(session) => {
                info!(user_id = %session.user.id, "sesión iniciada");
                AuthOutcome::ok()
            }
            Err(e) => {
                error!(error = %e, "no se pudo iniciar sesión");
                AuthOutcome::fail(e.to_string())
            }
        }
    }

    /// Create a backend identity plus its `perfiles` row. The new identity
    /// is not signed in automatically; the caller signs in separately.
    #[instrument(skip(self, password, nombre_completo), fields(email = %email))]
    pub async fn sign_up(&self, email: &str, password: &str, nombre_completo: &str) -> AuthOutcome {
        let user = match self.inner.backend.sign_up(email, password).await {
            Ok(user) => user,
            Err(e) => {
                error!(error = %e, "no se pudo registrar el usuario");
                return AuthOutcome::fail(e.to_string());
            }
        };
        match serde_json::to_value(perfil::new_row(user.id, nombre_completo)) {
            Ok(row) => {
                if let Err(e) = self.inner.backend.insert(PERFILES_TABLE, row).await {
                    // identity exists; the user can still sign in without a perfil
                    error!(error = %e, user_id = %user.id, "no se pudo crear el perfil");
                }
            }
            Err(e) => error!(error = %e, "no se pudo serializar el perfil"),
        }
        self.inner
            .notices
            .success("¡Usuario creado con éxito! Por favor inicia sesión.");
        AuthOutcome::ok()
    }

    /// Best-effort remote sign-out; local state is cleared no matter what.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        if let Err(e) = self.inner.backend.sign_out().await {
            error!(error = %e, "error al cerrar sesión");
        }
        self.inner.tx.send_replace(SessionState::Anonymous);
    }

    fn apply_session(&self, session: Option<BackendSession>) {
        match session {
            Some(session) => self.set_user(session),
            None => {
                self.inner.tx.send_replace(SessionState::Anonymous);
            }
        }
    }

    fn on_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => {
                self.set_user(session)
            }
            AuthEvent::SignedOut => {
                self.inner.tx.send_replace(SessionState::Anonymous);
            }
        }
    }

    /// Publish the user right away; the profile arrives later. The fetch is
    /// deferred to its own task so the event dispatch is never re-entered.
    fn set_user(&self, session: BackendSession) {
        let user_id = session.user.id;
        let user = CurrentUser {
            id: user_id,
            email: session.user.email,
            perfil: None,
        };
        self.inner.tx.send_replace(SessionState::Authenticated(user));
        let this = self.clone();
        tokio::spawn(async move {
            this.attach_perfil(user_id).await;
        });
    }

    async fn attach_perfil(&self, user_id: Uuid) {
        let Some(perfil) = self.fetch_perfil(user_id).await else {
            return;
        };
        self.inner.tx.send_modify(|state| {
            // a stale fetch for a user who signed out meanwhile is discarded
            if let SessionState::Authenticated(user) = state {
                if user.id == user_id {
                    user.perfil = Some(perfil);
                }
            }
        });
    }

    /// Profile lookup keyed by user id. Every failure degrades to `None`:
    /// the user stays present without a profile.
    async fn fetch_perfil(&self, user_id: Uuid) -> Option<Perfil> {
        let value: Value = match self
            .inner
            .backend
            .fetch_one(PERFILES_TABLE, "user_id", user_id)
            .await
        {
            Ok(value) => value,
            Err(BackendError::RowNotFound) => return None,
            Err(e) => {
                error!(error = %e, "no se pudo cargar el perfil");
                return None;
            }
        };
        let row: PerfilRow = match serde_json::from_value(value) {
            Ok(row) => row,
            Err(e) => {
                error!(error = %e, "perfil malformado");
                return None;
            }
        };
        match perfil::from_row(row) {
            Ok(perfil) => Some(perfil),
            Err(e) => {
                error!(error = %e, "perfil malformado");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use backend::MemoryBackend;
    use serde_json::json;

    use super::*;

    fn session(backend: &Arc<MemoryBackend>) -> AuthSession<MemoryBackend> {
        AuthSession::new(Arc::clone(backend), Notices::new())
    }

    async fn wait_for(
        auth: &AuthSession<MemoryBackend>,
        pred: impl Fn(&SessionState) -> bool,
    ) {
        let mut rx = auth.subscribe();
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if pred(&rx.borrow_and_update()) {
                    break;
                }
                rx.changed().await.expect("sender alive");
            }
        })
        .await
        .expect("state change");
    }

    #[tokio::test]
    async fn starts_authenticating_then_anonymous_without_session() {
        let backend = Arc::new(MemoryBackend::new());
        let auth = session(&backend);
        assert_eq!(auth.current(), SessionState::Authenticating);

        auth.start().await;
        assert_eq!(auth.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn sign_in_failure_is_a_structured_outcome() {
        let backend = Arc::new(MemoryBackend::new());
        let auth = session(&backend);
        auth.start().await;

        let outcome = auth.sign_in("nadie@example.com", "loquesea").await;
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert_eq!(auth.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn sign_in_attaches_perfil_asynchronously() {
        let backend = Arc::new(MemoryBackend::new());
        let user_id = backend.register_user("ana@example.com", "secreta123");
        backend.seed(
            "perfiles",
            vec![json!({
                "user_id": user_id,
                "nombre_completo": "Ana García",
                "rol": "admin",
                "avatar_url": null
            })],
        );
        let auth = session(&backend);
        auth.start().await;

        let outcome = auth.sign_in("ana@example.com", "secreta123").await;
        assert!(outcome.success);

        wait_for(&auth, |state| {
            matches!(
                state,
                SessionState::Authenticated(user) if user.perfil.is_some()
            )
        })
        .await;

        match auth.current() {
            SessionState::Authenticated(user) => {
                assert_eq!(user.email, "ana@example.com");
                let perfil = user.perfil.expect("perfil");
                assert_eq!(perfil.nombre_completo, "Ana García");
                assert_eq!(perfil.rol.as_deref(), Some("admin"));
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn perfil_fetch_failure_leaves_user_without_perfil() {
        let backend = Arc::new(MemoryBackend::new());
        backend.register_user("ana@example.com", "secreta123");
        backend.fail_rows(true);
        let auth = session(&backend);
        auth.start().await;

        let outcome = auth.sign_in("ana@example.com", "secreta123").await;
        assert!(outcome.success);

        wait_for(&auth, |state| matches!(state, SessionState::Authenticated(_))).await;
        // give the deferred fetch a chance to run and fail
        tokio::time::sleep(Duration::from_millis(50)).await;

        match auth.current() {
            SessionState::Authenticated(user) => assert!(user.perfil.is_none()),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sign_up_creates_perfil_but_does_not_authenticate() {
        let backend = Arc::new(MemoryBackend::new());
        let auth = session(&backend);
        auth.start().await;

        let outcome = auth.sign_up("nuevo@example.com", "secreta123", "Nuevo Usuario").await;
        assert!(outcome.success);

        let perfiles = backend.rows("perfiles");
        assert_eq!(perfiles.len(), 1);
        assert_eq!(perfiles[0]["nombre_completo"], "Nuevo Usuario");
        assert_eq!(auth.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn sign_up_rejects_duplicate_email() {
        let backend = Arc::new(MemoryBackend::new());
        backend.register_user("ana@example.com", "secreta123");
        let auth = session(&backend);
        auth.start().await;

        let outcome = auth.sign_up("ana@example.com", "otra", "Ana").await;
        assert!(!outcome.success);
        assert!(backend.rows("perfiles").is_empty());
    }

    #[tokio::test]
    async fn sign_out_clears_state_even_when_backend_fails() {
        let backend = Arc::new(MemoryBackend::new());
        backend.register_user("ana@example.com", "secreta123");
        let auth = session(&backend);
        auth.start().await;
        auth.sign_in("ana@example.com", "secreta123").await;
        wait_for(&auth, |state| matches!(state, SessionState::Authenticated(_))).await;

        backend.fail_auth(true);
        auth.sign_out().await;
        assert_eq!(auth.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn backend_originated_events_rederive_the_session() {
        let backend = Arc::new(MemoryBackend::new());
        let auth = session(&backend);
        auth.start().await;
        assert_eq!(auth.current(), SessionState::Anonymous);

        let user_id = Uuid::new_v4();
        backend.emit(AuthEvent::SignedIn(BackendSession {
            user: backend::BackendUser {
                id: user_id,
                email: "remota@example.com".into(),
            },
            access_token: "token".into(),
            refresh_token: "refresh".into(),
        }));
        wait_for(&auth, |state| {
            matches!(state, SessionState::Authenticated(user) if user.id == user_id)
        })
        .await;

        backend.emit(AuthEvent::SignedOut);
        wait_for(&auth, |state| matches!(state, SessionState::Anonymous)).await;
    }
}
