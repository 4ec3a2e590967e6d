use std::sync::Arc;

use tokio::sync::watch;

use crate::errors::StoreError;
use crate::gateway::InvitationApi;
use crate::kanban::models::{Invitation, InvitationResponse, InvitationStatus};

use super::{AppState, Slice, StateCell, StoreResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvitationState {
    pub invitations: Vec<Invitation>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Slice for InvitationState {
    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

impl InvitationState {
    pub fn pending(&self) -> impl Iterator<Item = &Invitation> {
        self.invitations
            .iter()
            .filter(|i| i.status == InvitationStatus::Pending)
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }
}

pub struct InvitationStore<G: ?Sized> {
    gateway: Arc<G>,
    state: Arc<StateCell<InvitationState>>,
}

impl<G: ?Sized> Clone for InvitationStore<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            state: self.state.clone(),
        }
    }
}

impl<G: InvitationApi + ?Sized> InvitationStore<G> {
    pub fn new(gateway: Arc<G>, app: &AppState) -> Self {
        Self {
            gateway,
            state: app.invitations.clone(),
        }
    }

    pub fn state(&self) -> Arc<InvitationState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<InvitationState>> {
        self.state.subscribe()
    }

    pub async fn fetch_invitations(&self) -> StoreResult<()> {
        self.state.update(|s| s.loading = true);
        let result = self.gateway.list_received_invitations().await;
        self.state.update(|s| {
            s.loading = false;
            match &result {
                Ok(invitations) => {
                    s.invitations = invitations.clone();
                    s.error = None;
                }
                Err(e) => s.error = Some(e.user_message()),
            }
        });
        result.map(|_| ()).map_err(StoreError::from)
    }

    pub async fn accept(&self, invitation_id: &str) -> StoreResult<InvitationResponse> {
        self.respond(invitation_id, true).await
    }

    pub async fn reject(&self, invitation_id: &str) -> StoreResult<InvitationResponse> {
        self.respond(invitation_id, false).await
    }

    /// The invitation leaves the list as soon as the user answers it.
    async fn respond(&self, invitation_id: &str, accept: bool) -> StoreResult<InvitationResponse> {
        let snapshot = self.state.snapshot();
        self.state
            .update(|s| s.invitations.retain(|i| i.id != invitation_id));

        match self.gateway.respond_to_invitation(invitation_id, accept).await {
            Ok(response) => {
                self.state.update(|s| s.error = None);
                Ok(response)
            }
            Err(e) => {
                let err = StoreError::from(e);
                let action = if accept { "accept_invitation" } else { "reject_invitation" };
                self.state.rollback(&snapshot, action, &err);
                Err(err)
            }
        }
    }
}
