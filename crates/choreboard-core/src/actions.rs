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

use tracing::{debug, error, info};

use choreboard_client::{ApiResult, ChoreboardClient};

use crate::coordinator::RefreshHandle;

/// User-initiated writes against the backend. Every successful call
/// requests an immediate refresh so the published snapshot catches up
/// without waiting for the next scheduled tick. Failures propagate to
/// the caller unchanged.
#[derive(Debug, Clone)]
pub struct ChoreActions {
    client: Arc<ChoreboardClient>,
    refresh: RefreshHandle,
}

impl ChoreActions {
    pub fn new(client: Arc<ChoreboardClient>, refresh: RefreshHandle) -> Self {
        Self { client, refresh }
    }

    fn settled(&self, what: &str) {
        info!("{what} succeeded, refreshing data");
        self.refresh.request_refresh();
    }

    pub async fn claim_chore(
        &self,
        instance_id: i64,
        assign_to_user_id: Option<i64>,
    ) -> ApiResult<()> {
        debug!("Claiming chore instance {instance_id}");
        match self.client.claim_chore(instance_id, assign_to_user_id).await {
            Ok(_) => {
                self.settled("Claim");
                Ok(())
            }
            Err(err) => {
                error!("Failed to claim chore instance {instance_id}: {err}");
                Err(err)
            }
        }
    }

    pub async fn unclaim_chore(&self, instance_id: i64) -> ApiResult<()> {
        debug!("Unclaiming chore instance {instance_id}");
        match self.client.unclaim_chore(instance_id).await {
            Ok(_) => {
                self.settled("Unclaim");
                Ok(())
            }
            Err(err) => {
                error!("Failed to unclaim chore instance {instance_id}: {err}");
                Err(err)
            }
        }
    }

    pub async fn mark_complete(
        &self,
        instance_id: i64,
        helper_ids: Option<&[i64]>,
        completed_by_user_id: Option<i64>,
    ) -> ApiResult<()> {
        debug!("Completing chore instance {instance_id}");
        match self
            .client
            .complete_chore(instance_id, helper_ids, completed_by_user_id)
            .await
        {
            Ok(_) => {
                self.settled("Completion");
                Ok(())
            }
            Err(err) => {
                error!("Failed to complete chore instance {instance_id}: {err}");
                Err(err)
            }
        }
    }

    pub async fn undo_completion(&self, completion_id: i64) -> ApiResult<()> {
        debug!("Undoing completion {completion_id}");
        match self.client.undo_completion(completion_id).await {
            Ok(_) => {
                self.settled("Undo");
                Ok(())
            }
            Err(err) => {
                error!("Failed to undo completion {completion_id}: {err}");
                Err(err)
            }
        }
    }

    pub async fn start_arcade(&self, instance_id: i64, user_id: Option<i64>) -> ApiResult<()> {
        debug!("Starting arcade session for instance {instance_id}");
        match self.client.start_arcade(instance_id, user_id).await {
            Ok(_) => {
                self.settled("Arcade start");
                Ok(())
            }
            Err(err) => {
                error!("Failed to start arcade session for instance {instance_id}: {err}");
                Err(err)
            }
        }
    }

    pub async fn stop_arcade(&self, session_id: i64) -> ApiResult<()> {
        debug!("Stopping arcade session {session_id}");
        match self.client.stop_arcade(session_id).await {
            Ok(_) => {
                self.settled("Arcade stop");
                Ok(())
            }
            Err(err) => {
                error!("Failed to stop arcade session {session_id}: {err}");
                Err(err)
            }
        }
    }

    pub async fn approve_arcade(
        &self,
        session_id: i64,
        judge_id: Option<i64>,
        notes: Option<&str>,
    ) -> ApiResult<()> {
        debug!("Approving arcade session {session_id}");
        match self.client.approve_arcade(session_id, judge_id, notes).await {
            Ok(_) => {
                self.settled("Arcade approval");
                Ok(())
            }
            Err(err) => {
                error!("Failed to approve arcade session {session_id}: {err}");
                Err(err)
            }
        }
    }

    pub async fn deny_arcade(
        &self,
        session_id: i64,
        judge_id: Option<i64>,
        notes: Option<&str>,
    ) -> ApiResult<()> {
        debug!("Denying arcade session {session_id}");
        match self.client.deny_arcade(session_id, judge_id, notes).await {
            Ok(_) => {
                self.settled("Arcade denial");
                Ok(())
            }
            Err(err) => {
                error!("Failed to deny arcade session {session_id}: {err}");
                Err(err)
            }
        }
    }

    pub async fn continue_arcade(&self, session_id: i64) -> ApiResult<()> {
        debug!("Continuing arcade session {session_id}");
        match self.client.continue_arcade(session_id).await {
            Ok(_) => {
                self.settled("Arcade continue");
                Ok(())
            }
            Err(err) => {
                error!("Failed to continue arcade session {session_id}: {err}");
                Err(err)
            }
        }
    }

    pub async fn cancel_arcade(&self, session_id: i64) -> ApiResult<()> {
        debug!("Cancelling arcade session {session_id}");
        match self.client.cancel_arcade(session_id).await {
            Ok(_) => {
                self.settled("Arcade cancel");
                Ok(())
            }
            Err(err) => {
                error!("Failed to cancel arcade session {session_id}: {err}");
                Err(err)
            }
        }
    }
}
