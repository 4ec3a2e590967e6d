use async_trait::async_trait;
use reqwest::Method;

use crate::kanban::models::{Board, BoardSummary, CreateBoardInput, UpdateBoardInput};

use super::http::HttpGateway;
use super::{BoardApi, GatewayResult};

#[async_trait]
impl BoardApi for HttpGateway {
    async fn list_boards(&self) -> GatewayResult<Vec<Board>> {
        let path = "/api/boards";
        self.send_json(self.request(Method::GET, path), path).await
    }

    async fn list_board_summaries(&self) -> GatewayResult<Vec<BoardSummary>> {
        let path = "/api/boards/simple";
        self.send_json(self.request(Method::GET, path), path).await
    }

    async fn get_board(&self, board_id: &str) -> GatewayResult<Board> {
        let path = format!("/api/boards/{}", board_id);
        self.send_json(self.request(Method::GET, &path), &path).await
    }

    async fn create_board(&self, input: &CreateBoardInput) -> GatewayResult<Board> {
        let path = "/api/boards";
        self.send_json(self.request(Method::POST, path).json(input), path)
            .await
    }

    async fn update_board(&self, board_id: &str, input: &UpdateBoardInput) -> GatewayResult<Board> {
        let path = format!("/api/boards/{}", board_id);
        self.send_json(self.request(Method::PUT, &path).json(input), &path)
            .await
    }

    async fn delete_board(&self, board_id: &str) -> GatewayResult<()> {
        let path = format!("/api/boards/{}", board_id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    async fn add_member(&self, board_id: &str, email: &str) -> GatewayResult<Board> {
        let path = format!("/api/boards/{}/members", board_id);
        let body = serde_json::json!({ "email": email });
        self.send_json(self.request(Method::POST, &path).json(&body), &path)
            .await
    }

    async fn leave_board(&self, board_id: &str) -> GatewayResult<()> {
        let path = format!("/api/boards/{}/leave", board_id);
        self.send_empty(self.request(Method::POST, &path)).await
    }

    async fn remove_member(&self, board_id: &str, member_id: &str) -> GatewayResult<()> {
        let path = format!("/api/boards/{}/members/{}", board_id, member_id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }
}
