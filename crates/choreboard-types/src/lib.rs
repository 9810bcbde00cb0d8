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

pub mod arcade;
pub mod chore;
pub mod leaderboard;
pub mod snapshot;
pub mod user;

// Re-export common types for convenience
pub use arcade::{ArcadeSession, ArcadeStatus, PendingApproval};
pub use chore::{Assignee, ChoreInstance, ChoreMeta, CompletionRecord, HelperShare, ScheduleKind};
pub use leaderboard::{ChoreLeaderboard, LeaderboardEntry, LeaderboardKind, RankedEntry};
pub use snapshot::{SiteSettings, Snapshot};
pub use user::User;
