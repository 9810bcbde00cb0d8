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

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Tokens are reused for 23 hours, refreshed ahead of the backend's
/// 24-hour expiry.
pub const TOKEN_REFRESH_AFTER: Duration = Duration::from_secs(23 * 3600);

#[derive(Debug)]
struct CachedToken {
    token: String,
    issued_at: u64,
}

/// Stateless HMAC bearer-token generator with a time-boxed cache.
///
/// Token format: `{username}:{unix_timestamp}:{signature}` where the
/// signature is hex HMAC-SHA256 over `{username}:{unix_timestamp}`
/// keyed by the shared secret. Within the refresh window `token()`
/// returns the cached string byte-for-byte.
#[derive(Debug)]
pub struct TokenGenerator {
    username: String,
    secret: String,
    refresh_after: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenGenerator {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::with_refresh_after(username, secret, TOKEN_REFRESH_AFTER)
    }

    /// Refresh window injectable for tests.
    pub fn with_refresh_after(
        username: impl Into<String>,
        secret: impl Into<String>,
        refresh_after: Duration,
    ) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
            refresh_after,
            cached: Mutex::new(None),
        }
    }

    /// Current token, reusing the cached one while it is fresh.
    pub fn token(&self) -> String {
        self.token_at(unix_now())
    }

    /// Clock-injected variant of [`token`](Self::token).
    pub fn token_at(&self, now_unix: u64) -> String {
        let mut cached = self.cached.lock();

        if let Some(entry) = cached.as_ref()
            && now_unix.saturating_sub(entry.issued_at) < self.refresh_after.as_secs()
        {
            debug!("Using cached token");
            return entry.token.clone();
        }

        let token = generate_token(&self.username, &self.secret, now_unix);
        debug!(
            "Generated token for user {} at timestamp {}",
            self.username, now_unix
        );
        *cached = Some(CachedToken {
            token: token.clone(),
            issued_at: now_unix,
        });
        token
    }

    /// Drop the cached token so the next request regenerates it.
    /// Called by the client on HTTP 401.
    pub fn invalidate(&self) {
        *self.cached.lock() = None;
    }

    /// The currently cached token, if any.
    pub fn cached_token(&self) -> Option<String> {
        self.cached.lock().as_ref().map(|c| c.token.clone())
    }
}

/// Hex HMAC-SHA256 of `message` keyed by `secret`.
pub fn sign(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn generate_token(username: &str, secret: &str, timestamp: u64) -> String {
    let signature = sign(secret, &format!("{username}:{timestamp}"));
    format!("{username}:{timestamp}:{signature}")
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
