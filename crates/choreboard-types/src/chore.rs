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

use serde::{Deserialize, Deserializer, Serialize};

/// The year the backend uses as a "no due date" marker on one-time chores.
pub const SENTINEL_DUE_YEAR: i32 = 9999;

/// How a chore recurs. The backend sends free-form strings under
/// `schedule_type`; anything that is not one-time or daily collapses
/// into `Other` (weekly, monthly, custom cron setups and so on).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Once,
    Daily,
    #[default]
    Other,
}

impl ScheduleKind {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "once" | "one_time" | "one-time" | "onetime" => Self::Once,
            "daily" => Self::Daily,
            _ => Self::Other,
        }
    }
}

impl<'de> Deserialize<'de> for ScheduleKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Static chore metadata nested under each instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoreMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub points: i64,

    /// Open for any eligible user to claim
    #[serde(default)]
    pub is_pool: bool,

    /// Flexible chores the user may defer past their nominal due time
    #[serde(default)]
    pub complete_later: bool,

    #[serde(default, alias = "schedule_type")]
    pub schedule_kind: ScheduleKind,
}

/// Who a chore instance is assigned to. Depending on the endpoint the
/// backend sends either a user object or a bare username string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Assignee {
    User {
        username: String,
        #[serde(default)]
        display_name: Option<String>,
        #[serde(default)]
        id: Option<i64>,
    },
    Name(String),
}

impl Assignee {
    pub fn username(&self) -> &str {
        match self {
            Self::User { username, .. } => username,
            Self::Name(name) => name,
        }
    }

    /// Display name with username fallback.
    pub fn display_label(&self) -> &str {
        match self {
            Self::User {
                display_name: Some(label),
                ..
            } if !label.is_empty() => label,
            Self::User { username, .. } => username,
            Self::Name(name) => name,
        }
    }
}

/// Summary of the most recent completion of a chore, as embedded in
/// chore instance payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    #[serde(default)]
    pub completed_by: Option<Assignee>,

    #[serde(default)]
    pub completed_at: Option<String>,

    #[serde(default)]
    pub was_late: bool,

    #[serde(default)]
    pub helpers: Vec<HelperShare>,
}

/// A helper credited on a completion and the points they were awarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperShare {
    pub user: Assignee,

    #[serde(default)]
    pub points_awarded: i64,
}

/// One scheduled occurrence of a chore.
///
/// `due_at` and `completed_at` stay strings: the reconciler rewrites
/// them in place to local minute precision and must leave unparseable
/// values untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoreInstance {
    pub id: i64,

    #[serde(default)]
    pub chore: ChoreMeta,

    /// Backend assignment status, e.g. "ASSIGNED" or "POOL"
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub assigned_to: Option<Assignee>,

    #[serde(default)]
    pub due_at: Option<String>,

    #[serde(default)]
    pub completed_at: Option<String>,

    #[serde(default)]
    pub is_overdue: bool,

    /// Point value for this occurrence; falls back to the chore's base
    /// points when absent
    #[serde(default)]
    pub points_value: Option<i64>,

    #[serde(default)]
    pub last_completion: Option<CompletionSummary>,
}

impl ChoreInstance {
    pub fn points(&self) -> i64 {
        self.points_value.unwrap_or(self.chore.points)
    }

    pub fn assignee_username(&self) -> Option<&str> {
        self.assigned_to.as_ref().map(Assignee::username)
    }
}

/// A completed chore occurrence from the recent-completions feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: i64,

    #[serde(default)]
    pub instance_id: Option<i64>,

    #[serde(default)]
    pub chore_name: Option<String>,

    #[serde(default)]
    pub completed_by: Option<Assignee>,

    #[serde(default)]
    pub completed_at: Option<String>,

    #[serde(default)]
    pub was_late: bool,

    #[serde(default)]
    pub helpers: Vec<HelperShare>,
}
