use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::errors::BackendError;

/// Row-level access to one hosted collection.
///
/// Values are the raw JSON objects the backend exchanges; decoding into
/// typed rows happens at the model mapping boundary, never here.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// All rows of `table`, ordered ascending by `order_by`.
    async fn fetch_all(&self, table: &str, order_by: &str) -> Result<Vec<Value>, BackendError>;

    /// The single row whose `filter_col` equals `id`; `RowNotFound` when absent.
    async fn fetch_one(&self, table: &str, filter_col: &str, id: Uuid) -> Result<Value, BackendError>;

    /// Insert one row and return the stored representation.
    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError>;

    /// Update the row whose id matches and return the stored representation;
    /// `RowNotFound` when no row matched.
    async fn update(&self, table: &str, id: Uuid, row: Value) -> Result<Value, BackendError>;

    /// Delete the row whose id matches. Deleting an absent row is a success.
    async fn delete(&self, table: &str, id: Uuid) -> Result<(), BackendError>;
}

/// Identity as the backend auth engine reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSession {
    pub user: BackendUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Auth-state changes as the backend reports them.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(BackendSession),
    TokenRefreshed(BackendSession),
    SignedOut,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<BackendSession, BackendError>;

    /// Create a new identity. Per the confirmation policy the new identity
    /// is not signed in automatically.
    async fn sign_up(&self, email: &str, password: &str) -> Result<BackendUser, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    async fn current_session(&self) -> Result<Option<BackendSession>, BackendError>;

    /// Subscribe to auth-state changes (sign-in elsewhere, token refresh,
    /// sign-out).
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
