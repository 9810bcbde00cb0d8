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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::arcade::ArcadeSession;
use crate::chore::{ChoreInstance, CompletionRecord};
use crate::leaderboard::{ChoreLeaderboard, RankedEntry};
use crate::user::User;

fn default_points_label() -> String {
    "points".to_owned()
}

/// Site-wide settings relevant to display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default = "default_points_label")]
    pub points_label: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            points_label: default_points_label(),
        }
    }
}

/// The reconciled view of the whole board, rebuilt on every poll tick.
///
/// Immutable once published; consumers hold it behind an `Arc` and are
/// superseded atomically by the next tick's value. Maps are ordered so
/// identical inputs serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub outstanding_chores: Vec<ChoreInstance>,
    pub late_chores: Vec<ChoreInstance>,
    pub pool_chores: Vec<ChoreInstance>,
    pub users: Vec<User>,
    pub points_label: String,
    pub recent_completions: Vec<CompletionRecord>,
    pub chore_leaderboards: Vec<ChoreLeaderboard>,
    pub leaderboard_weekly: Vec<RankedEntry>,
    pub leaderboard_alltime: Vec<RankedEntry>,
    /// Monitored username -> that user's merged chore list
    pub my_chores: BTreeMap<String, Vec<ChoreInstance>>,
    /// Monitored username -> active or judging arcade session, absent if none
    pub arcade_sessions: BTreeMap<String, ArcadeSession>,
}
