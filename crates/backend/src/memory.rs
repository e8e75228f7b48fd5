//! In-memory stand-in for the hosted backend, for tests and doc examples.
//!
//! Rows live in plain JSON vectors per table and ids are assigned on
//! insert, so service-level behavior (ordering, read-your-own-write,
//! not-found propagation) can be exercised without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::api::{AuthApi, AuthEvent, BackendSession, BackendUser, RowStore};
use crate::errors::BackendError;

struct MemoryUser {
    id: Uuid,
    password: String,
}

pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    users: Mutex<HashMap<String, MemoryUser>>,
    session: Mutex<Option<BackendSession>>,
    fail_rows: AtomicBool,
    fail_auth: AtomicBool,
    events: broadcast::Sender<AuthEvent>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            tables: Mutex::new(HashMap::new()),
            users: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            fail_rows: AtomicBool::new(false),
            fail_auth: AtomicBool::new(false),
            events,
        }
    }

    /// Make every row operation fail until reset, simulating an outage.
    pub fn fail_rows(&self, fail: bool) {
        self.fail_rows.store(fail, Ordering::SeqCst);
    }

    /// Make every auth operation fail until reset.
    pub fn fail_auth(&self, fail: bool) {
        self.fail_auth.store(fail, Ordering::SeqCst);
    }

    /// Register a sign-in-able identity and return its id.
    pub fn register_user(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().insert(
            email.to_string(),
            MemoryUser {
                id,
                password: password.to_string(),
            },
        );
        id
    }

    /// Load fixture rows directly, bypassing the service layer.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut tables = self.tables.lock().unwrap();
        let stored = tables.entry(table.to_string()).or_default();
        for mut row in rows {
            ensure_id(&mut row);
            stored.push(row);
        }
    }

    /// Snapshot of a table's raw rows, for assertions.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Emit a backend-originated auth event (sign-in elsewhere, refresh).
    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    fn check(flag: &AtomicBool) -> Result<(), BackendError> {
        if flag.load(Ordering::SeqCst) {
            return Err(BackendError::Network("simulated backend outage".into()));
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_id(row: &mut Value) {
    if let Value::Object(obj) = row {
        if !matches!(obj.get("id"), Some(Value::String(_))) {
            obj.insert("id".into(), json!(Uuid::new_v4()));
        }
    }
}

fn row_id_matches(row: &Value, id: Uuid) -> bool {
    row.get("id").and_then(Value::as_str) == Some(id.to_string().as_str())
}

#[async_trait]
impl RowStore for MemoryBackend {
    async fn fetch_all(&self, table: &str, order_by: &str) -> Result<Vec<Value>, BackendError> {
        Self::check(&self.fail_rows)?;
        let tables = self.tables.lock().unwrap();
        let mut rows = tables.get(table).cloned().unwrap_or_default();
        rows.sort_by(|a, b| {
            let a = a.get(order_by).and_then(Value::as_str).unwrap_or("");
            let b = b.get(order_by).and_then(Value::as_str).unwrap_or("");
            a.cmp(b)
        });
        Ok(rows)
    }

    async fn fetch_one(&self, table: &str, filter_col: &str, id: Uuid) -> Result<Value, BackendError> {
        Self::check(&self.fail_rows)?;
        let tables = self.tables.lock().unwrap();
        tables
            .get(table)
            .and_then(|rows| {
                rows.iter()
                    .find(|r| r.get(filter_col).and_then(Value::as_str) == Some(id.to_string().as_str()))
            })
            .cloned()
            .ok_or(BackendError::RowNotFound)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
        Self::check(&self.fail_rows)?;
        if !row.is_object() {
            return Err(BackendError::Parse("row must be a JSON object".into()));
        }
        let mut row = row;
        ensure_id(&mut row);
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: Uuid, row: Value) -> Result<Value, BackendError> {
        Self::check(&self.fail_rows)?;
        let incoming = match row {
            Value::Object(obj) => obj,
            _ => return Err(BackendError::Parse("row must be a JSON object".into())),
        };
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.get_mut(table).ok_or(BackendError::RowNotFound)?;
        let stored = rows
            .iter_mut()
            .find(|r| row_id_matches(r, id))
            .ok_or(BackendError::RowNotFound)?;
        if let Value::Object(target) = stored {
            for (k, v) in incoming {
                if k != "id" {
                    target.insert(k, v);
                }
            }
        }
        Ok(stored.clone())
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<(), BackendError> {
        Self::check(&self.fail_rows)?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| !row_id_matches(r, id));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthApi for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<BackendSession, BackendError> {
        Self::check(&self.fail_auth)?;
        let session = {
            let users = self.users.lock().unwrap();
            let user = users
                .get(email)
                .filter(|u| u.password == password)
                .ok_or_else(|| BackendError::Api {
                    status: 400,
                    message: "Invalid login credentials".into(),
                })?;
            BackendSession {
                user: BackendUser {
                    id: user.id,
                    email: email.to_string(),
                },
                access_token: format!("token-{}", user.id),
                refresh_token: format!("refresh-{}", user.id),
            }
        };
        *self.session.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<BackendUser, BackendError> {
        Self::check(&self.fail_auth)?;
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(BackendError::Api {
                status: 400,
                message: "User already registered".into(),
            });
        }
        let id = Uuid::new_v4();
        users.insert(
            email.to_string(),
            MemoryUser {
                id,
                password: password.to_string(),
            },
        );
        Ok(BackendUser {
            id,
            email: email.to_string(),
        })
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        Self::check(&self.fail_auth)?;
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<BackendSession>, BackendError> {
        Self::check(&self.fail_auth)?;
        Ok(self.session.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_id_and_fetch_all_sorts() -> Result<(), anyhow::Error> {
        let backend = MemoryBackend::new();
        let stored = backend
            .insert("empleados", json!({"nombre": "Zoe"}))
            .await?;
        assert!(stored.get("id").and_then(Value::as_str).is_some());
        backend.insert("empleados", json!({"nombre": "Ana"})).await?;

        let rows = backend.fetch_all("empleados", "nombre").await?;
        assert_eq!(rows[0]["nombre"], "Ana");
        assert_eq!(rows[1]["nombre"], "Zoe");
        Ok(())
    }

    #[tokio::test]
    async fn update_merges_and_missing_row_is_not_found() -> Result<(), anyhow::Error> {
        let backend = MemoryBackend::new();
        let stored = backend
            .insert("empleados", json!({"nombre": "Ana", "salario": 1000}))
            .await?;
        let id: Uuid = stored["id"].as_str().unwrap().parse()?;

        let updated = backend
            .update("empleados", id, json!({"salario": 2000}))
            .await?;
        assert_eq!(updated["nombre"], "Ana");
        assert_eq!(updated["salario"], 2000);
        assert_eq!(updated["id"], stored["id"]);

        let missing = backend
            .update("empleados", Uuid::new_v4(), json!({"salario": 1}))
            .await;
        assert!(matches!(missing, Err(BackendError::RowNotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn delete_of_absent_row_is_a_success() -> Result<(), anyhow::Error> {
        let backend = MemoryBackend::new();
        backend.delete("empleados", Uuid::new_v4()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_credentials() {
        let backend = MemoryBackend::new();
        backend.register_user("ana@example.com", "secreta123");

        let err = backend.sign_in("ana@example.com", "otra").await;
        assert!(matches!(err, Err(BackendError::Api { status: 400, .. })));

        let session = backend
            .sign_in("ana@example.com", "secreta123")
            .await
            .expect("sign in");
        assert_eq!(session.user.email, "ana@example.com");
        assert!(backend.current_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sign_up_does_not_authenticate() {
        let backend = MemoryBackend::new();
        let user = backend
            .sign_up("nuevo@example.com", "secreta123")
            .await
            .expect("sign up");
        assert_eq!(user.email, "nuevo@example.com");
        assert!(backend.current_session().await.unwrap().is_none());
    }
}
