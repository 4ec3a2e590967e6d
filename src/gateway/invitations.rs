use async_trait::async_trait;
use reqwest::Method;

use crate::kanban::models::{Invitation, InvitationResponse};

use super::http::HttpGateway;
use super::{GatewayResult, InvitationApi};

#[async_trait]
impl InvitationApi for HttpGateway {
    async fn list_received_invitations(&self) -> GatewayResult<Vec<Invitation>> {
        let path = "/api/boards/invitations/received";
        // The endpoint answers `null` when there is nothing pending.
        let invitations: Option<Vec<Invitation>> =
            self.send_json(self.request(Method::GET, path), path).await?;
        Ok(invitations.unwrap_or_default())
    }

    async fn respond_to_invitation(
        &self,
        invitation_id: &str,
        accept: bool,
    ) -> GatewayResult<InvitationResponse> {
        let path = format!("/api/boards/invitations/{}/respond", invitation_id);
        let body = serde_json::json!({ "accept": accept });
        self.send_json(self.request(Method::POST, &path).json(&body), &path)
            .await
    }
}
