use async_trait::async_trait;
use reqwest::Method;

use crate::kanban::models::{Column, ColumnOrderInput, CreateColumnInput, UpdateColumnInput};

use super::http::HttpGateway;
use super::{ColumnApi, GatewayResult};

#[async_trait]
impl ColumnApi for HttpGateway {
    async fn create_column(
        &self,
        board_id: &str,
        input: &CreateColumnInput,
    ) -> GatewayResult<Column> {
        let path = format!("/api/boards/{}/columns", board_id);
        // The API wants the owning board repeated in the body.
        let mut body = serde_json::to_value(input).unwrap_or_default();
        if let Some(object) = body.as_object_mut() {
            object.insert("boardId".into(), board_id.into());
        }
        self.send_json(self.request(Method::POST, &path).json(&body), &path)
            .await
    }

    async fn update_column(
        &self,
        board_id: &str,
        column_id: &str,
        input: &UpdateColumnInput,
    ) -> GatewayResult<Column> {
        let path = format!("/api/boards/{}/columns/{}", board_id, column_id);
        self.send_json(self.request(Method::PUT, &path).json(input), &path)
            .await
    }

    async fn delete_column(&self, board_id: &str, column_id: &str) -> GatewayResult<()> {
        let path = format!("/api/boards/{}/columns/{}", board_id, column_id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    async fn reorder_column(
        &self,
        board_id: &str,
        column_id: &str,
        new_order: usize,
    ) -> GatewayResult<()> {
        let path = format!("/api/boards/{}/columns/reorder", board_id);
        let body = ColumnOrderInput {
            column_id,
            new_order,
        };
        self.send_empty(self.request(Method::PUT, &path).json(&body))
            .await
    }
}
