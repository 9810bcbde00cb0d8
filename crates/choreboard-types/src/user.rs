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

fn default_true() -> bool {
    true
}

/// A ChoreBoard user with their point tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Stable key; monitored-user matching is by username
    pub username: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default = "default_true")]
    pub is_assignable: bool,

    #[serde(default = "default_true")]
    pub points_eligible: bool,

    #[serde(default)]
    pub weekly_points: i64,

    #[serde(default)]
    pub all_time_points: i64,

    #[serde(default)]
    pub daily_claim_count: i64,
}

impl User {
    pub fn display_label(&self) -> &str {
        match &self.display_name {
            Some(label) if !label.is_empty() => label,
            _ => &self.username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_user() {
        let user: User =
            serde_json::from_value(serde_json::json!({"id": 7, "username": "carol"})).unwrap();
        assert!(user.is_assignable);
        assert!(user.points_eligible);
        assert_eq!(user.weekly_points, 0);
        assert_eq!(user.display_label(), "carol");
    }

    #[test]
    fn display_label_prefers_display_name() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": 8,
            "username": "dave",
            "display_name": "Dave D.",
            "weekly_points": 12,
            "all_time_points": 300,
            "daily_claim_count": 2
        }))
        .unwrap();
        assert_eq!(user.display_label(), "Dave D.");
        assert_eq!(user.all_time_points, 300);
    }
}
