//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the API base endpoint and the on-disk location of the cached session.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub session_file: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("ARCUSHR_API_URL")
            .context("ARCUSHR_API_URL not set")?
            .trim_end_matches('/')
            .to_string();

        let session_file =
            env::var("ARCUSHR_SESSION_FILE").unwrap_or_else(|_| "~/.arcushr/session.json".to_string());

        let session_file = expanduser::expanduser(&session_file)
            .context("ARCUSHR_SESSION_FILE must be a valid path")?;

        Ok(Config {
            api_base_url,
            session_file,
        })
    }
}
