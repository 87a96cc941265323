//! Session lifecycle management on top of the API client.
//!
//! The client keeps the bearer token in memory only; this module owns the
//! persistent side of a session. It restores a prior session at startup,
//! persists credentials after login/register, and tears everything down on
//! logout or authentication failure.

use crate::client::ApiClient;
use crate::errors::ApiResult;
use crate::models::{AuthResponse, keys};
use crate::storage::SessionStore;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Manages the persisted session around a shared [`ApiClient`].
pub struct SessionManager {
    client: Arc<ApiClient>,
    store: Arc<dyn SessionStore>,
    user: RwLock<Option<Value>>,
}

impl SessionManager {
    /// Creates a manager over the given client and store. The store should
    /// be the same instance the client refreshes through, so that a token
    /// rotated mid-session is the one restored on the next startup.
    pub fn new(client: Arc<ApiClient>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            store,
            user: RwLock::new(None),
        }
    }

    /// Restores a prior session from the store, arming the client with the
    /// cached access token. Returns the cached user payload when a complete
    /// session was found. A corrupt cached user clears the session instead
    /// of failing startup.
    pub async fn restore(&self) -> ApiResult<Option<Value>> {
        let token = self.store.get(keys::ACCESS_TOKEN).await?;
        let stored_user = self.store.get(keys::USER).await?;

        if let (Some(token), Some(raw_user)) = (token, stored_user) {
            match serde_json::from_str::<Value>(&raw_user) {
                Ok(user) => {
                    self.client.set_token(&token).await;
                    *self.user.write().await = Some(user.clone());
                    info!("restored cached session");
                    return Ok(Some(user));
                }
                Err(e) => {
                    warn!(error = %e, "cached user payload is corrupt, clearing session");
                    self.clear().await?;
                }
            }
        }

        Ok(None)
    }

    /// Logs in and persists the returned session. On any failure the local
    /// session state is cleared before the error propagates.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Value> {
        match self.client.login(email, password).await {
            Ok(response) => self.persist(response).await,
            Err(e) => {
                self.clear().await?;
                Err(e)
            }
        }
    }

    /// Registers a company and persists the returned session. On any
    /// failure the local session state is cleared before the error
    /// propagates.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        company_name: &str,
        industry: Option<&str>,
    ) -> ApiResult<Value> {
        match self
            .client
            .register(email, password, company_name, industry)
            .await
        {
            Ok(response) => self.persist(response).await,
            Err(e) => {
                self.clear().await?;
                Err(e)
            }
        }
    }

    /// Logs out locally: clears the client token and the persisted keys.
    /// No revocation call is made to the server.
    pub async fn logout(&self) -> ApiResult<()> {
        info!("logging out, clearing session");
        self.clear().await
    }

    /// The cached user payload, if a session is active.
    pub async fn current_user(&self) -> Option<Value> {
        self.user.read().await.clone()
    }

    async fn persist(&self, response: AuthResponse) -> ApiResult<Value> {
        self.store
            .set(keys::ACCESS_TOKEN, &response.access_token)
            .await?;
        self.store
            .set(keys::REFRESH_TOKEN, &response.refresh_token)
            .await?;
        let raw_user = serde_json::to_string(&response.user)
            .map_err(crate::storage::StoreError::from)?;
        self.store.set(keys::USER, &raw_user).await?;

        *self.user.write().await = Some(response.user.clone());
        Ok(response.user)
    }

    async fn clear(&self) -> ApiResult<()> {
        self.client.clear_token().await;
        self.store.remove(&keys::ALL).await?;
        *self.user.write().await = None;
        Ok(())
    }
}
