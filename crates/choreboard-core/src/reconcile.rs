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

use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone};
use tracing::debug;

use choreboard_types::chore::SENTINEL_DUE_YEAR;
use choreboard_types::{
    ArcadeSession, ArcadeStatus, ChoreInstance, ChoreLeaderboard, CompletionRecord,
    LeaderboardEntry, LeaderboardKind, PendingApproval, RankedEntry, ScheduleKind, SiteSettings,
    Snapshot, User,
};

/// How many recent completions each tick requests.
pub const COMPLETIONS_LIMIT: u32 = 20;

/// Everything one poll tick fetched, before reconciliation.
#[derive(Debug, Clone, Default)]
pub struct RawData {
    pub outstanding_chores: Vec<ChoreInstance>,
    pub late_chores: Vec<ChoreInstance>,
    pub users: Vec<User>,
    pub settings: SiteSettings,
    pub recent_completions: Vec<CompletionRecord>,
    pub chore_leaderboards: Vec<ChoreLeaderboard>,
    pub leaderboard_weekly: Vec<LeaderboardEntry>,
    pub leaderboard_alltime: Vec<LeaderboardEntry>,
    /// (username, user id, live status) for each monitored user whose
    /// status fetch succeeded
    pub arcade_statuses: Vec<(String, i64, ArcadeStatus)>,
    pub pending_approvals: Vec<PendingApproval>,
}

/// Parse a backend timestamp into local time. Accepts RFC 3339 with any
/// offset, and naive ISO strings which are taken as already local.
fn parse_datetime(value: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Local.from_local_datetime(&naive).single();
    }
    None
}

/// Whether a due timestamp is the backend's "no due date" marker.
fn is_sentinel_due(value: &str) -> bool {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.year() >= SENTINEL_DUE_YEAR,
        Err(_) => value.starts_with("9999-"),
    }
}

fn end_of_day(now: DateTime<Local>) -> NaiveDateTime {
    now.date_naive()
        .and_hms_micro_opt(23, 59, 59, 999_999)
        .expect("valid end-of-day time")
}

/// Due-date inclusion policy.
///
/// One-time chores carrying the year-9999 sentinel have no real due
/// date and are always shown. Everything else is shown iff it is due by
/// 23:59:59.999999 local time today, which keeps both chores due later
/// today and chores already overdue. Recurring chores get no sentinel
/// exemption.
pub fn should_display(chore: &ChoreInstance, now: DateTime<Local>) -> bool {
    let Some(due_at) = chore.due_at.as_deref() else {
        return false;
    };

    if chore.chore.schedule_kind == ScheduleKind::Once && is_sentinel_due(due_at) {
        return true;
    }

    match parse_datetime(due_at) {
        Some(due) => due.naive_local() <= end_of_day(now),
        None => {
            debug!("Failed to parse due_at '{}'", due_at);
            false
        }
    }
}

/// Rewrite a timestamp to local minute precision (`YYYY-MM-DD HH:MM`).
/// Unparseable input passes through unchanged.
pub fn normalize_datetime(value: &str) -> String {
    match parse_datetime(value) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => {
            debug!("Failed to normalize datetime '{}'", value);
            value.to_owned()
        }
    }
}

/// Apply the due-date policy and normalize timestamps on the survivors.
/// Operates on copies; the raw fetch results stay untouched.
pub fn filter_chores(chores: &[ChoreInstance], now: DateTime<Local>) -> Vec<ChoreInstance> {
    chores
        .iter()
        .filter(|chore| should_display(chore, now))
        .cloned()
        .map(|mut chore| {
            if let Some(due_at) = chore.due_at.take() {
                chore.due_at = Some(normalize_datetime(&due_at));
            }
            if let Some(completed_at) = chore.completed_at.take() {
                chore.completed_at = Some(normalize_datetime(&completed_at));
            }
            chore
        })
        .collect()
}

fn is_pool_chore(chore: &ChoreInstance) -> bool {
    chore
        .status
        .as_deref()
        .is_some_and(|status| status.eq_ignore_ascii_case("POOL"))
        || (chore.chore.is_pool && chore.assigned_to.is_none())
}

/// Pool subset of the filtered outstanding list, order preserved.
/// Status match is case-insensitive; backends that never set a status
/// fall back to the pool flag plus a missing assignee.
pub fn extract_pool_chores(outstanding: &[ChoreInstance]) -> Vec<ChoreInstance> {
    outstanding
        .iter()
        .filter(|chore| is_pool_chore(chore))
        .cloned()
        .collect()
}

/// Per-user chore lists. Outstanding chores are scanned before late
/// ones; a chore present in both fetches is kept once, by id.
pub fn build_user_views(
    outstanding: &[ChoreInstance],
    late: &[ChoreInstance],
    monitored_users: &[String],
) -> BTreeMap<String, Vec<ChoreInstance>> {
    monitored_users
        .iter()
        .map(|username| {
            let mut user_chores: Vec<ChoreInstance> = Vec::new();
            for chore in outstanding.iter().chain(late) {
                if chore.assignee_username() == Some(username.as_str())
                    && !user_chores.iter().any(|c| c.id == chore.id)
                {
                    user_chores.push(chore.clone());
                }
            }
            (username.clone(), user_chores)
        })
        .collect()
}

/// Assign 1-based ranks by the backend's returned ordering.
pub fn rank_leaderboard(entries: &[LeaderboardEntry], kind: LeaderboardKind) -> Vec<RankedEntry> {
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| RankedEntry {
            rank: idx + 1,
            username: entry.resolved_username().to_owned(),
            display_name: entry.resolved_display_name().to_owned(),
            points: entry.resolved_points(kind),
        })
        .collect()
}

/// Merge live arcade statuses with the pending-approval list.
/// A live session wins; pending entries only fill in monitored users
/// without one.
pub fn merge_arcade_sessions(
    statuses: &[(String, i64, ArcadeStatus)],
    pending: &[PendingApproval],
    monitored_users: &[String],
) -> BTreeMap<String, ArcadeSession> {
    let mut sessions = BTreeMap::new();

    for (username, user_id, status) in statuses {
        if status.has_active_session {
            sessions.insert(
                username.clone(),
                ArcadeSession::from_status(status, *user_id, username),
            );
        }
    }

    for entry in pending {
        let Some(username) = entry.username.as_deref() else {
            continue;
        };
        if monitored_users.iter().any(|m| m == username) && !sessions.contains_key(username) {
            sessions.insert(username.to_owned(), ArcadeSession::from_pending(entry, username));
        }
    }

    sessions
}

/// Build one consistent snapshot out of a tick's raw fetches.
///
/// Pure over (`raw`, `monitored_users`, `now`): identical inputs yield
/// identical snapshots.
pub fn reconcile(raw: &RawData, monitored_users: &[String], now: DateTime<Local>) -> Snapshot {
    let outstanding_chores = filter_chores(&raw.outstanding_chores, now);
    let late_chores = filter_chores(&raw.late_chores, now);
    let pool_chores = extract_pool_chores(&outstanding_chores);
    let my_chores = build_user_views(&outstanding_chores, &late_chores, monitored_users);
    let arcade_sessions =
        merge_arcade_sessions(&raw.arcade_statuses, &raw.pending_approvals, monitored_users);

    debug!(
        "Reconciled {} outstanding, {} late, {} pool, {} users, {} arcade sessions",
        outstanding_chores.len(),
        late_chores.len(),
        pool_chores.len(),
        raw.users.len(),
        arcade_sessions.len()
    );

    Snapshot {
        outstanding_chores,
        late_chores,
        pool_chores,
        users: raw.users.clone(),
        points_label: raw.settings.points_label.clone(),
        recent_completions: raw.recent_completions.clone(),
        chore_leaderboards: raw.chore_leaderboards.clone(),
        leaderboard_weekly: rank_leaderboard(&raw.leaderboard_weekly, LeaderboardKind::Weekly),
        leaderboard_alltime: rank_leaderboard(&raw.leaderboard_alltime, LeaderboardKind::Alltime),
        my_chores,
        arcade_sessions,
    }
}
