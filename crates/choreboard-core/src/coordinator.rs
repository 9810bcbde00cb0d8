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

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use choreboard_client::{ApiResult, ChoreboardClient};
use choreboard_types::{LeaderboardKind, Snapshot};

use crate::reconcile::{self, COMPLETIONS_LIMIT, RawData};

/// Receiving side of the snapshot channel. `borrow()` yields `None`
/// until the first successful tick.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<Snapshot>>>;

/// Cloneable handle that asks the coordinator for an out-of-band
/// refresh. Requests sent while one is already queued coalesce.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    pub fn request_refresh(&self) {
        if self.tx.try_send(()).is_err() {
            debug!("Refresh already queued, coalescing request");
        }
    }
}

/// Polls the backend on a fixed interval, reconciles each tick's
/// fetches into a snapshot and publishes it. Failed ticks keep the
/// previous snapshot in place.
#[derive(Debug)]
pub struct Coordinator {
    client: Arc<ChoreboardClient>,
    monitored_users: Vec<String>,
    interval: Duration,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    refresh_rx: mpsc::Receiver<()>,
}

impl Coordinator {
    pub fn new(
        client: Arc<ChoreboardClient>,
        monitored_users: Vec<String>,
        interval: Duration,
    ) -> (Self, SnapshotReceiver, RefreshHandle) {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let coordinator = Self {
            client,
            monitored_users,
            interval,
            snapshot_tx,
            refresh_rx,
        };
        (coordinator, snapshot_rx, RefreshHandle { tx: refresh_tx })
    }

    /// One full fetch-reconcile-publish cycle.
    pub async fn tick(&self) {
        match self.fetch_raw().await {
            Ok(raw) => {
                let snapshot = reconcile::reconcile(&raw, &self.monitored_users, Local::now());
                self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
            }
            Err(err) => {
                error!("Update cycle failed, keeping previous snapshot: {err}");
            }
        }
    }

    /// Drives ticks until the process shuts down. The interval timer
    /// fires immediately, so the first snapshot lands without waiting
    /// a full period.
    pub async fn run(mut self) {
        info!(
            "Starting update loop (interval {:?}, {} monitored users)",
            self.interval,
            self.monitored_users.len()
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                Some(()) = self.refresh_rx.recv() => {
                    debug!("Refresh requested, running immediate update");
                    self.tick().await;
                    ticker.reset();
                }
            }
        }
    }

    /// Fetch everything one tick needs. The eight core requests run
    /// concurrently and any failure fails the tick; per-user arcade
    /// lookups only log and omit their entry.
    async fn fetch_raw(&self) -> ApiResult<RawData> {
        let client = &self.client;
        let (
            outstanding_chores,
            late_chores,
            users,
            settings,
            recent_completions,
            chore_leaderboards,
            leaderboard_weekly,
            leaderboard_alltime,
        ) = tokio::try_join!(
            client.get_outstanding_chores(),
            client.get_late_chores(),
            client.get_users(),
            client.get_settings(),
            client.get_recent_completions(COMPLETIONS_LIMIT),
            client.get_chore_leaderboards(),
            client.get_leaderboard(LeaderboardKind::Weekly),
            client.get_leaderboard(LeaderboardKind::Alltime),
        )?;

        let mut arcade_statuses = Vec::with_capacity(self.monitored_users.len());
        for username in &self.monitored_users {
            let Some(user) = users.iter().find(|u| u.username == *username) else {
                debug!("Monitored user '{username}' not found in backend user list");
                continue;
            };
            match client.get_arcade_status(user.id).await {
                Ok(status) => arcade_statuses.push((username.clone(), user.id, status)),
                Err(err) => {
                    debug!("Arcade status fetch failed for '{username}': {err}");
                }
            }
        }

        let pending_approvals = match client.get_pending_arcade_approvals().await {
            Ok(pending) => pending,
            Err(err) => {
                debug!("Pending approval fetch failed: {err}");
                Vec::new()
            }
        };

        Ok(RawData {
            outstanding_chores,
            late_chores,
            users,
            settings,
            recent_completions,
            chore_leaderboards,
            leaderboard_weekly,
            leaderboard_alltime,
            arcade_statuses,
            pending_approvals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refresh_requests_coalesce_while_one_is_queued() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = RefreshHandle { tx };

        // Second and third requests land while the first is still queued.
        handle.request_refresh();
        handle.request_refresh();
        handle.request_refresh();

        assert_eq!(rx.recv().await, Some(()));
        assert!(rx.try_recv().is_err());

        // Once drained, the next request queues again.
        handle.request_refresh();
        assert_eq!(rx.recv().await, Some(()));
    }
}
