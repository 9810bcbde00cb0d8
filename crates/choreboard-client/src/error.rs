// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of ChoreBoard Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use thiserror::Error;

/// ChoreBoard API error taxonomy. One enum so callers can catch the
/// whole family or match a single variant.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 401. The cached token has already been dropped; the next
    /// request regenerates it. No automatic retry.
    #[error("authentication failed")]
    Auth,

    /// HTTP 404, with the path that missed.
    #[error("endpoint not found: {path}")]
    NotFound { path: String },

    /// HTTP 5xx.
    #[error("server error: {status}")]
    Server { status: u16 },

    /// Transport-level failure (connect, timeout).
    #[error("connection failed: {0}")]
    Connection(#[source] reqwest::Error),

    /// Any other non-success status or a malformed response body.
    #[error("request failed: {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// Client could not be constructed.
    #[error("client configuration error: {0}")]
    Config(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Connection(err)
        } else {
            Self::Api {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}
