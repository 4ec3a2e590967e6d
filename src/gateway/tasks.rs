use async_trait::async_trait;
use reqwest::Method;

use crate::kanban::models::{CreateTaskInput, MoveTaskInput, Task, UpdateTaskInput};

use super::http::HttpGateway;
use super::{GatewayResult, TaskApi};

fn task_path(board_id: &str, task_id: &str) -> String {
    format!("/api/boards/{}/tasks/{}", board_id, task_id)
}

#[async_trait]
impl TaskApi for HttpGateway {
    async fn create_task(
        &self,
        board_id: &str,
        column_id: &str,
        input: &CreateTaskInput,
    ) -> GatewayResult<Task> {
        let path = format!("/api/boards/{}/columns/{}/tasks", board_id, column_id);
        self.send_enveloped(self.request(Method::POST, &path).json(input), &path)
            .await
    }

    async fn get_task(&self, board_id: &str, task_id: &str) -> GatewayResult<Task> {
        let path = task_path(board_id, task_id);
        self.send_enveloped(self.request(Method::GET, &path), &path)
            .await
    }

    async fn update_task(
        &self,
        board_id: &str,
        task_id: &str,
        input: &UpdateTaskInput,
    ) -> GatewayResult<Task> {
        let path = task_path(board_id, task_id);
        self.send_enveloped(self.request(Method::PUT, &path).json(input), &path)
            .await
    }

    async fn delete_task(&self, board_id: &str, task_id: &str) -> GatewayResult<()> {
        let path = task_path(board_id, task_id);
        self.send_enveloped_ack(self.request(Method::DELETE, &path), &path, "Failed to delete task")
            .await
    }

    async fn move_task(
        &self,
        board_id: &str,
        task_id: &str,
        input: &MoveTaskInput,
    ) -> GatewayResult<Task> {
        let path = format!("{}/move", task_path(board_id, task_id));
        self.send_enveloped(self.request(Method::PUT, &path).json(input), &path)
            .await
    }

    async fn add_comment(
        &self,
        board_id: &str,
        task_id: &str,
        content: &str,
    ) -> GatewayResult<Task> {
        let path = format!("{}/comments", task_path(board_id, task_id));
        let body = serde_json::json!({ "content": content });
        self.send_enveloped(self.request(Method::POST, &path).json(&body), &path)
            .await
    }

    async fn update_comment(
        &self,
        board_id: &str,
        task_id: &str,
        comment_id: &str,
        content: &str,
    ) -> GatewayResult<Task> {
        let path = format!("{}/comments/{}", task_path(board_id, task_id), comment_id);
        let body = serde_json::json!({ "content": content });
        self.send_enveloped(self.request(Method::PUT, &path).json(&body), &path)
            .await
    }

    async fn delete_comment(
        &self,
        board_id: &str,
        task_id: &str,
        comment_id: &str,
    ) -> GatewayResult<()> {
        let path = format!("{}/comments/{}", task_path(board_id, task_id), comment_id);
        self.send_enveloped_ack(
            self.request(Method::DELETE, &path),
            &path,
            "Failed to delete comment",
        )
            .await
    }

    async fn assign_user(
        &self,
        board_id: &str,
        task_id: &str,
        user_id: &str,
    ) -> GatewayResult<Task> {
        let path = format!("{}/assign/{}", task_path(board_id, task_id), user_id);
        self.send_enveloped(self.request(Method::POST, &path), &path)
            .await
    }

    async fn unassign_user(
        &self,
        board_id: &str,
        task_id: &str,
        user_id: &str,
    ) -> GatewayResult<Task> {
        let path = format!("{}/assign/{}", task_path(board_id, task_id), user_id);
        self.send_enveloped(self.request(Method::DELETE, &path), &path)
            .await
    }
}
