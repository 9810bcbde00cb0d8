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

use serde::{Deserialize, Serialize};

/// Live arcade status for one user, from the status-by-user endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArcadeStatus {
    #[serde(default)]
    pub has_active_session: bool,

    #[serde(default, alias = "id")]
    pub session_id: Option<i64>,

    #[serde(default, alias = "chore_id")]
    pub instance_id: Option<i64>,

    #[serde(default)]
    pub chore_name: Option<String>,

    #[serde(default, alias = "start_time")]
    pub started_at: Option<String>,

    #[serde(default)]
    pub elapsed_seconds: i64,

    #[serde(default)]
    pub status: Option<String>,
}

/// One row of the global pending-approval list. The backend emits this
/// shape under different key names than the status endpoint, hence
/// the alias table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    #[serde(default, alias = "id")]
    pub session_id: Option<i64>,

    #[serde(default, alias = "chore_id")]
    pub instance_id: Option<i64>,

    #[serde(default)]
    pub chore_name: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub user_id: Option<i64>,

    #[serde(default, alias = "start_time")]
    pub started_at: Option<String>,

    #[serde(default)]
    pub elapsed_seconds: i64,

    #[serde(default)]
    pub status: Option<String>,
}

/// A timed arcade challenge as published in the snapshot, synthesized
/// from either the live status or a pending approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcadeSession {
    pub id: Option<i64>,
    pub chore_id: Option<i64>,
    pub chore_name: Option<String>,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub start_time: Option<String>,
    pub elapsed_seconds: i64,
    pub status: String,
}

impl ArcadeSession {
    /// Session record for a running challenge.
    pub fn from_status(status: &ArcadeStatus, user_id: i64, username: &str) -> Self {
        Self {
            id: status.session_id,
            chore_id: status.instance_id,
            chore_name: status.chore_name.clone(),
            user_id: Some(user_id),
            user_name: username.to_owned(),
            start_time: status.started_at.clone(),
            elapsed_seconds: status.elapsed_seconds,
            status: status.status.clone().unwrap_or_else(|| "active".to_owned()),
        }
    }

    /// Session record for a stopped challenge awaiting a judge.
    pub fn from_pending(pending: &PendingApproval, username: &str) -> Self {
        Self {
            id: pending.session_id,
            chore_id: pending.instance_id,
            chore_name: pending.chore_name.clone(),
            user_id: pending.user_id,
            user_name: username.to_owned(),
            start_time: pending.started_at.clone(),
            elapsed_seconds: pending.elapsed_seconds,
            status: pending
                .status
                .clone()
                .unwrap_or_else(|| "judging".to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_decodes_alternate_keys() {
        let status: ArcadeStatus = serde_json::from_value(serde_json::json!({
            "has_active_session": true,
            "id": 11,
            "chore_id": 4,
            "chore_name": "Laundry",
            "start_time": "2025-12-15T10:00:00Z",
            "elapsed_seconds": 120
        }))
        .unwrap();
        assert_eq!(status.session_id, Some(11));
        assert_eq!(status.instance_id, Some(4));
        assert_eq!(status.started_at.as_deref(), Some("2025-12-15T10:00:00Z"));
    }

    #[test]
    fn session_from_status_defaults_to_active() {
        let status = ArcadeStatus {
            has_active_session: true,
            session_id: Some(1),
            ..Default::default()
        };
        let session = ArcadeSession::from_status(&status, 5, "alice");
        assert_eq!(session.status, "active");
        assert_eq!(session.user_id, Some(5));
    }

    #[test]
    fn session_from_pending_defaults_to_judging() {
        let pending: PendingApproval = serde_json::from_value(serde_json::json!({
            "session_id": 9,
            "instance_id": 2,
            "username": "bob",
            "started_at": "2025-12-15T09:00:00Z"
        }))
        .unwrap();
        let session = ArcadeSession::from_pending(&pending, "bob");
        assert_eq!(session.status, "judging");
        assert_eq!(session.id, Some(9));
        assert_eq!(session.user_name, "bob");
    }
}
