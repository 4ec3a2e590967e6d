use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;

use crate::kanban::models::{Notification, NotificationFilters, NotificationPage};

use super::http::HttpGateway;
use super::{GatewayResult, NotificationApi};

#[derive(Deserialize)]
struct UnreadCount {
    count: u64,
}

#[async_trait]
impl NotificationApi for HttpGateway {
    async fn list_notifications(
        &self,
        filters: &NotificationFilters,
    ) -> GatewayResult<NotificationPage> {
        let path = "/api/notifications";
        self.send_json(self.request(Method::GET, path).query(filters), path)
            .await
    }

    async fn unread_count(&self) -> GatewayResult<u64> {
        let path = "/api/notifications/unread-count";
        let body: UnreadCount = self.send_json(self.request(Method::GET, path), path).await?;
        Ok(body.count)
    }

    async fn mark_read(&self, notification_id: &str) -> GatewayResult<Notification> {
        let path = format!("/api/notifications/{}/read", notification_id);
        self.send_json(self.request(Method::PATCH, &path), &path).await
    }

    async fn mark_all_read(&self) -> GatewayResult<()> {
        let path = "/api/notifications/mark-all-read";
        self.send_empty(self.request(Method::PATCH, path)).await
    }

    async fn delete_notification(&self, notification_id: &str) -> GatewayResult<()> {
        let path = format!("/api/notifications/{}", notification_id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }
}
