//! Global client error types.
//!
//! This module defines custom error types that are used across the entire
//! client SDK and provides mechanisms for consistent error handling.

use crate::storage::StoreError;
use thiserror::Error;

/// Errors surfaced by the API client and its session collaborators.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A 401 was received and the refresh attempt failed or no refresh
    /// token was available. The local session has already been torn down.
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    /// Non-OK response after the (possible) refresh-and-retry cycle.
    /// The message is sourced from the response body when parsable.
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    /// Network or connection failure, propagated unmodified.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Failure while reading or writing the persistent session store.
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    /// Input rejected client-side before any request was issued.
    #[error("Validation error: {message}")]
    Validation { message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn request_failed(status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Whether the error terminated the current session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
