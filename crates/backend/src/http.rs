//! HTTP implementation of the backend client against the hosted service's
//! PostgREST-style row endpoints and its password-auth endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use configs::BackendConfig;

use crate::api::{AuthApi, AuthEvent, BackendSession, BackendUser, RowStore};
use crate::errors::BackendError;

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<BackendSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl HttpBackend {
    pub fn new(cfg: &BackendConfig) -> anyhow::Result<Self> {
        cfg.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            http,
            base_url: cfg.url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            session: RwLock::new(None),
            events,
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Access token of the signed-in session, or the publishable key.
    async fn bearer(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(s) => s.access_token.clone(),
            None => self.api_key.clone(),
        }
    }

    async fn rest_request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, self.rest_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
    }

    /// Decode an error payload into a typed API error. The auth and rest
    /// endpoints disagree on the message key, so several are tried.
    async fn api_error(resp: Response) -> BackendError {
        let status = resp.status().as_u16();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        let message = ["message", "error_description", "msg", "error"]
            .iter()
            .find_map(|k| body.get(k).and_then(Value::as_str))
            .unwrap_or("unexpected backend response")
            .to_string();
        BackendError::Api { status, message }
    }

    async fn ok_or_api_error(resp: Response) -> Result<Response, BackendError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(Self::api_error(resp).await)
        }
    }
}

fn network(e: reqwest::Error) -> BackendError {
    BackendError::Network(e.to_string())
}

fn parse(e: reqwest::Error) -> BackendError {
    BackendError::Parse(e.to_string())
}

#[async_trait]
impl RowStore for HttpBackend {
    async fn fetch_all(&self, table: &str, order_by: &str) -> Result<Vec<Value>, BackendError> {
        let order = format!("{order_by}.asc");
        let resp = self
            .rest_request(Method::GET, table)
            .await
            .query(&[("select", "*"), ("order", order.as_str())])
            .send()
            .await
            .map_err(network)?;
        let resp = Self::ok_or_api_error(resp).await?;
        resp.json::<Vec<Value>>().await.map_err(parse)
    }

    async fn fetch_one(&self, table: &str, filter_col: &str, id: Uuid) -> Result<Value, BackendError> {
        let filter = format!("eq.{id}");
        let resp = self
            .rest_request(Method::GET, table)
            .await
            .query(&[("select", "*"), (filter_col, filter.as_str())])
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(network)?;
        // the object representation answers 406 when no row matched
        if resp.status() == StatusCode::NOT_ACCEPTABLE || resp.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::RowNotFound);
        }
        let resp = Self::ok_or_api_error(resp).await?;
        resp.json::<Value>().await.map_err(parse)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
        let resp = self
            .rest_request(Method::POST, table)
            .await
            .header("Prefer", "return=representation")
            .json(&json!([row]))
            .send()
            .await
            .map_err(network)?;
        let resp = Self::ok_or_api_error(resp).await?;
        let mut rows: Vec<Value> = resp.json().await.map_err(parse)?;
        if rows.is_empty() {
            return Err(BackendError::Parse("insert returned no representation".into()));
        }
        Ok(rows.remove(0))
    }

    async fn update(&self, table: &str, id: Uuid, row: Value) -> Result<Value, BackendError> {
        let filter = format!("eq.{id}");
        let resp = self
            .rest_request(Method::PATCH, table)
            .await
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(network)?;
        let resp = Self::ok_or_api_error(resp).await?;
        let mut rows: Vec<Value> = resp.json().await.map_err(parse)?;
        if rows.is_empty() {
            return Err(BackendError::RowNotFound);
        }
        Ok(rows.remove(0))
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<(), BackendError> {
        let filter = format!("eq.{id}");
        let resp = self
            .rest_request(Method::DELETE, table)
            .await
            .query(&[("id", filter.as_str())])
            .send()
            .await
            .map_err(network)?;
        Self::ok_or_api_error(resp).await.map(|_| ())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    user: BackendUser,
}

/// The sign-up endpoint returns the user object directly, or nested under
/// `user` when confirmation is pending.
#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user: Option<BackendUser>,
}

#[async_trait]
impl AuthApi for HttpBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<BackendSession, BackendError> {
        let resp = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(network)?;
        let resp = Self::ok_or_api_error(resp).await?;
        let token: TokenResponse = resp.json().await.map_err(parse)?;
        let session = BackendSession {
            user: token.user,
            access_token: token.access_token,
            refresh_token: token.refresh_token.unwrap_or_default(),
        };
        *self.session.write().await = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<BackendUser, BackendError> {
        let resp = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(network)?;
        let resp = Self::ok_or_api_error(resp).await?;
        let body: SignUpResponse = resp.json().await.map_err(parse)?;
        body.user
            .or_else(|| {
                body.id
                    .zip(body.email)
                    .map(|(id, email)| BackendUser { id, email })
            })
            .ok_or_else(|| BackendError::Parse("sign-up response without user".into()))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let token = self.bearer().await;
        let result = async {
            let resp = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.api_key)
                .bearer_auth(token)
                .send()
                .await
                .map_err(network)?;
            Self::ok_or_api_error(resp).await.map(|_| ())
        }
        .await;
        // the stored session is gone either way
        *self.session.write().await = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        result
    }

    async fn current_session(&self) -> Result<Option<BackendSession>, BackendError> {
        Ok(self.session.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
