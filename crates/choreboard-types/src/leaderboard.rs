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

/// Which global leaderboard a query targets. Serialized form matches the
/// backend's `type=` query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardKind {
    Weekly,
    Alltime,
}

impl LeaderboardKind {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Alltime => "alltime",
        }
    }
}

/// Minimal user reference inside leaderboard payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub weekly_points: Option<i64>,

    #[serde(default)]
    pub all_time_points: Option<i64>,
}

/// One raw leaderboard row. Some backends nest the user object, some
/// flatten it into the entry; both shapes decode here and are resolved
/// during reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(default)]
    pub user: Option<UserRef>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub points: Option<i64>,

    #[serde(default)]
    pub weekly_points: Option<i64>,

    #[serde(default)]
    pub all_time_points: Option<i64>,
}

impl LeaderboardEntry {
    pub fn resolved_username(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.username.as_deref())
            .or(self.username.as_deref())
            .unwrap_or("unknown")
    }

    pub fn resolved_display_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.display_name.as_deref())
            .or(self.display_name.as_deref())
            .unwrap_or_else(|| self.resolved_username())
    }

    /// Point value for the given leaderboard kind: the nested user object
    /// wins, then the flat fields, then a generic `points` field, then 0.
    pub fn resolved_points(&self, kind: LeaderboardKind) -> i64 {
        let nested = self.user.as_ref().and_then(|u| match kind {
            LeaderboardKind::Weekly => u.weekly_points,
            LeaderboardKind::Alltime => u.all_time_points,
        });
        let flat = match kind {
            LeaderboardKind::Weekly => self.weekly_points,
            LeaderboardKind::Alltime => self.all_time_points,
        };
        nested.or(flat).or(self.points).unwrap_or(0)
    }
}

/// A resolved leaderboard row as published in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position in the backend's returned ordering
    pub rank: usize,
    pub username: String,
    pub display_name: String,
    pub points: i64,
}

/// Arcade high-score row on a per-chore leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoreScore {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default, alias = "time_seconds")]
    pub best_seconds: Option<f64>,

    #[serde(default)]
    pub points: Option<i64>,
}

/// Arcade-mode leaderboard for a single chore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoreLeaderboard {
    #[serde(default, alias = "id")]
    pub chore_id: Option<i64>,

    #[serde(default, alias = "name")]
    pub chore_name: Option<String>,

    #[serde(default, alias = "high_scores")]
    pub entries: Vec<ChoreScore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_user_object_wins() {
        let entry: LeaderboardEntry = serde_json::from_value(serde_json::json!({
            "user": {"username": "alice", "display_name": "Alice", "weekly_points": 42},
            "points": 7
        }))
        .unwrap();
        assert_eq!(entry.resolved_username(), "alice");
        assert_eq!(entry.resolved_display_name(), "Alice");
        assert_eq!(entry.resolved_points(LeaderboardKind::Weekly), 42);
    }

    #[test]
    fn flat_entry_falls_back_to_generic_points() {
        let entry: LeaderboardEntry = serde_json::from_value(serde_json::json!({
            "username": "bob",
            "points": 100
        }))
        .unwrap();
        assert_eq!(entry.resolved_username(), "bob");
        assert_eq!(entry.resolved_display_name(), "bob");
        assert_eq!(entry.resolved_points(LeaderboardKind::Alltime), 100);
    }

    #[test]
    fn chore_leaderboard_accepts_alias_keys() {
        let board: ChoreLeaderboard = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "Vacuuming",
            "high_scores": [{"username": "alice", "time_seconds": 93.5}]
        }))
        .unwrap();
        assert_eq!(board.chore_id, Some(3));
        assert_eq!(board.chore_name.as_deref(), Some("Vacuuming"));
        assert_eq!(board.entries[0].best_seconds, Some(93.5));
    }
}
