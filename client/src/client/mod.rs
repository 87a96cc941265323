//! Authenticated HTTP client for the ArcusHR backend.
//!
//! Owns the base endpoint and the in-memory bearer token, attaches
//! authentication to every request, and transparently recovers from an
//! expired access token with a single refresh-and-retry cycle. Session
//! persistence lives behind the injected [`SessionStore`]; this client only
//! touches it during that refresh cycle.

use crate::errors::{ApiError, ApiResult};
use crate::models::{
    ApproveLeaveRequest, AttendanceAction, AuthResponse, CheckInOutRequest, LeaveDecision,
    LoginRequest, RefreshRequest, RegisterRequest, keys,
};
use crate::storage::{SessionStore, StoreError};
use chrono::NaiveDate;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// API client for the ArcusHR backend.
///
/// Construct one instance at startup and share it (`Arc`) across consumers;
/// the token is interior-mutable so screens can hold the same handle for
/// the lifetime of the session.
pub struct ApiClient {
    base_url: String,
    token: RwLock<Option<String>>,
    http: Client,
    store: Arc<dyn SessionStore>,
}

impl ApiClient {
    /// Creates a client against `base_url`. Trailing slashes are trimmed so
    /// endpoint concatenation yields a single separator.
    pub fn new(base_url: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            base_url,
            token: RwLock::new(None),
            http: Client::new(),
            store,
        }
    }

    /// Creates a client from loaded configuration.
    pub fn from_config(config: &crate::config::Config, store: Arc<dyn SessionStore>) -> Self {
        Self::new(config.api_base_url.clone(), store)
    }

    /// Replaces the in-memory access token. No I/O, no validation.
    pub async fn set_token(&self, token: &str) {
        *self.token.write().await = Some(token.to_string());
    }

    /// Clears the in-memory token; subsequent requests go out unauthenticated.
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    /// Issues a request against `endpoint` (relative to the base URL) and
    /// deserializes the JSON response body.
    ///
    /// Every request carries `Content-Type: application/json`; caller
    /// header overrides are merged on top, and `Authorization: Bearer
    /// <token>` is attached when a token is armed. A 401 on an
    /// authenticated request triggers exactly one token refresh followed by
    /// one retry of the original request; a second 401 is reported like any
    /// other failed response. When the refresh itself fails (or no refresh
    /// token is cached) the session is torn down locally and
    /// [`ApiError::SessionExpired`] is returned.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let token = self.token.read().await.clone();
        debug!(%method, endpoint, authenticated = token.is_some(), "issuing API request");

        let mut response = self
            .send(method.clone(), &url, body.as_ref(), headers.as_ref(), token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && token.is_some() {
            let fresh_token = self.refresh_session().await?;
            debug!(endpoint, "retrying request with refreshed token");
            response = self
                .send(method, &url, body.as_ref(), headers.as_ref(), Some(&fresh_token))
                .await?;
        }

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<Value>().await {
                Ok(body) => body
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .unwrap_or_else(|| "Request failed".to_string()),
                Err(_) => "Network error".to_string(),
            };
            return Err(ApiError::request_failed(status.as_u16(), message));
        }

        Ok(response.json::<T>().await?)
    }

    /// Builds headers and dispatches a single HTTP call.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        overrides: Option<&HeaderMap>,
        token: Option<&str>,
    ) -> ApiResult<reqwest::Response> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(overrides) = overrides {
            for (name, value) in overrides.iter() {
                headers.insert(name.clone(), value.clone());
            }
        }

        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::validation("Bearer token contains invalid characters"))?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// Exchanges the cached refresh token for a fresh session.
    ///
    /// Runs at most once per original request. Any failure along the way
    /// (no cached refresh token, non-OK refresh response, transport or
    /// store errors) tears down the local session and maps to
    /// [`ApiError::SessionExpired`].
    async fn refresh_session(&self) -> ApiResult<String> {
        let refresh_token = match self.store.get(keys::REFRESH_TOKEN).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("access token rejected and no refresh token cached");
                self.teardown_session().await;
                return Err(ApiError::SessionExpired);
            }
            Err(e) => {
                warn!(error = %e, "failed to read refresh token from store");
                self.teardown_session().await;
                return Err(ApiError::SessionExpired);
            }
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(auth) => Ok(auth.access_token),
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                self.teardown_session().await;
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Calls the refresh endpoint and persists the rotated session, both in
    /// memory and in the external store.
    async fn exchange_refresh_token(&self, refresh_token: &str) -> ApiResult<AuthResponse> {
        let url = format!("{}/auth/refresh", self.base_url);
        let body = to_body(&RefreshRequest {
            refresh_token: refresh_token.to_string(),
        })?;

        let response = self.send(Method::POST, &url, Some(&body), None, None).await?;
        if !response.status().is_success() {
            return Err(ApiError::request_failed(
                response.status().as_u16(),
                "Token refresh rejected",
            ));
        }

        let auth = response.json::<AuthResponse>().await?;

        self.set_token(&auth.access_token).await;
        self.store.set(keys::ACCESS_TOKEN, &auth.access_token).await?;
        self.store.set(keys::REFRESH_TOKEN, &auth.refresh_token).await?;
        let user = serde_json::to_string(&auth.user).map_err(StoreError::from)?;
        self.store.set(keys::USER, &user).await?;

        Ok(auth)
    }

    /// Clears the in-memory token and removes the cached session keys.
    /// Store failures during teardown are logged and otherwise ignored; the
    /// session is unusable either way.
    async fn teardown_session(&self) {
        self.clear_token().await;
        if let Err(e) = self.store.remove(&keys::ALL).await {
            warn!(error = %e, "failed to clear cached session keys");
        }
    }

    // Auth endpoints

    /// Authenticates and arms the client with the returned access token, so
    /// an immediately subsequent request is already authenticated.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        validate(&request)?;

        let response: AuthResponse = self
            .request(Method::POST, "/auth/login", Some(to_body(&request)?), None)
            .await?;

        self.set_token(&response.access_token).await;
        Ok(response)
    }

    /// Registers a company and its first user, then arms the client with
    /// the returned access token.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        company_name: &str,
        industry: Option<&str>,
    ) -> ApiResult<AuthResponse> {
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            company_name: company_name.to_string(),
            industry: industry.map(str::to_string),
        };
        validate(&request)?;

        let response: AuthResponse = self
            .request(Method::POST, "/auth/register", Some(to_body(&request)?), None)
            .await?;

        self.set_token(&response.access_token).await;
        Ok(response)
    }

    // Employee endpoints

    /// Fetches the authenticated employee's profile.
    pub async fn get_my_profile(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/employees/me", None, None).await
    }

    /// Updates the authenticated employee's profile.
    pub async fn update_my_profile<T: Serialize>(&self, profile: &T) -> ApiResult<Value> {
        self.request(Method::PUT, "/employees/me", Some(to_body(profile)?), None)
            .await
    }

    /// Fetches the authenticated employee's attendance, optionally filtered
    /// to a single day.
    pub async fn get_my_attendance(&self, date: Option<NaiveDate>) -> ApiResult<Value> {
        let endpoint = with_date_filter("/employees/attendance", date);
        self.request(Method::GET, &endpoint, None, None).await
    }

    /// Records a check-in or check-out for the authenticated employee.
    pub async fn check_in_out(&self, action: AttendanceAction) -> ApiResult<Value> {
        let body = to_body(&CheckInOutRequest { action })?;
        self.request(Method::POST, "/employees/attendance", Some(body), None)
            .await
    }

    /// Lists the authenticated employee's leave requests.
    pub async fn get_my_leaves(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/employees/leaves", None, None).await
    }

    /// Submits a new leave request for the authenticated employee.
    pub async fn create_my_leave<T: Serialize>(&self, leave: &T) -> ApiResult<Value> {
        self.request(Method::POST, "/employees/leaves", Some(to_body(leave)?), None)
            .await
    }

    /// Fetches the authenticated employee's attendance/leave statistics.
    pub async fn get_my_stats(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/employees/stats", None, None).await
    }

    // Admin endpoints

    /// Fetches company-wide dashboard statistics. Admin-only by convention;
    /// authorization is enforced server-side.
    pub async fn get_dashboard_stats(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/dashboard/stats", None, None).await
    }

    /// Lists all employees of the company.
    pub async fn get_employees(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/employees", None, None).await
    }

    /// Lists company-wide attendance, optionally filtered to a single day.
    pub async fn get_attendance(&self, date: Option<NaiveDate>) -> ApiResult<Value> {
        let endpoint = with_date_filter("/attendance", date);
        self.request(Method::GET, &endpoint, None, None).await
    }

    /// Lists company-wide leave requests.
    pub async fn get_leaves(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/leaves", None, None).await
    }

    /// Approves or rejects a pending leave request.
    pub async fn approve_leave(
        &self,
        leave_id: i64,
        decision: LeaveDecision,
        comments: Option<&str>,
    ) -> ApiResult<Value> {
        let body = to_body(&ApproveLeaveRequest {
            action: decision,
            comments: comments.map(str::to_string),
        })?;
        let endpoint = format!("/leaves/{leave_id}/approve");
        self.request(Method::POST, &endpoint, Some(body), None).await
    }
}

/// Appends a `?date=YYYY-MM-DD` filter to an attendance path.
fn with_date_filter(path: &str, date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => format!("{}?date={}", path, date.format("%Y-%m-%d")),
        None => path.to_string(),
    }
}

fn to_body<T: Serialize>(payload: &T) -> ApiResult<Value> {
    serde_json::to_value(payload)
        .map_err(|e| ApiError::validation(format!("Unserializable request body: {e}")))
}

fn validate(payload: &impl validator::Validate) -> ApiResult<()> {
    if let Err(validation_errors) = payload.validate() {
        let error_messages: Vec<String> = validation_errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                })
            })
            .collect();

        return Err(ApiError::validation(error_messages.join(", ")));
    }
    Ok(())
}
