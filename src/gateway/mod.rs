//! Remote data gateway: typed wrappers over the board REST API.
//!
//! One trait per resource so stores depend only on what they call and
//! tests can swap in an in-memory double. `HttpGateway` implements all of
//! them over `reqwest`.
//!
//! | Module          | Responsibility                                   |
//! |-----------------|--------------------------------------------------|
//! | `http`          | `HttpGateway`: auth header, status → error map   |
//! | `boards`        | `BoardApi` over `/api/boards`                    |
//! | `columns`       | `ColumnApi` over `/api/boards/:id/columns`       |
//! | `tasks`         | `TaskApi` over `/api/boards/:id/tasks` (enveloped)|
//! | `invitations`   | `InvitationApi`                                  |
//! | `notifications` | `NotificationApi`                                |

use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::kanban::models::{
    Board, BoardSummary, Column, CreateBoardInput, CreateColumnInput, CreateTaskInput, Invitation,
    InvitationResponse, MoveTaskInput, Notification, NotificationFilters, NotificationPage, Task,
    UpdateBoardInput, UpdateColumnInput, UpdateTaskInput,
};

mod boards;
mod columns;
pub mod http;
mod invitations;
mod notifications;
mod tasks;

#[cfg(test)]
pub(crate) mod memory;

pub use http::{HttpGateway, SessionEvent};

pub type GatewayResult<T> = Result<T, GatewayError>;

#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn list_boards(&self) -> GatewayResult<Vec<Board>>;
    async fn list_board_summaries(&self) -> GatewayResult<Vec<BoardSummary>>;
    async fn get_board(&self, board_id: &str) -> GatewayResult<Board>;
    async fn create_board(&self, input: &CreateBoardInput) -> GatewayResult<Board>;
    async fn update_board(&self, board_id: &str, input: &UpdateBoardInput) -> GatewayResult<Board>;
    async fn delete_board(&self, board_id: &str) -> GatewayResult<()>;
    async fn add_member(&self, board_id: &str, email: &str) -> GatewayResult<Board>;
    async fn leave_board(&self, board_id: &str) -> GatewayResult<()>;
    async fn remove_member(&self, board_id: &str, member_id: &str) -> GatewayResult<()>;
}

#[async_trait]
pub trait ColumnApi: Send + Sync {
    async fn create_column(
        &self,
        board_id: &str,
        input: &CreateColumnInput,
    ) -> GatewayResult<Column>;
    async fn update_column(
        &self,
        board_id: &str,
        column_id: &str,
        input: &UpdateColumnInput,
    ) -> GatewayResult<Column>;
    async fn delete_column(&self, board_id: &str, column_id: &str) -> GatewayResult<()>;
    async fn reorder_column(
        &self,
        board_id: &str,
        column_id: &str,
        new_order: usize,
    ) -> GatewayResult<()>;
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn create_task(
        &self,
        board_id: &str,
        column_id: &str,
        input: &CreateTaskInput,
    ) -> GatewayResult<Task>;
    async fn get_task(&self, board_id: &str, task_id: &str) -> GatewayResult<Task>;
    async fn update_task(
        &self,
        board_id: &str,
        task_id: &str,
        input: &UpdateTaskInput,
    ) -> GatewayResult<Task>;
    async fn delete_task(&self, board_id: &str, task_id: &str) -> GatewayResult<()>;
    async fn move_task(
        &self,
        board_id: &str,
        task_id: &str,
        input: &MoveTaskInput,
    ) -> GatewayResult<Task>;
    async fn add_comment(
        &self,
        board_id: &str,
        task_id: &str,
        content: &str,
    ) -> GatewayResult<Task>;
    async fn update_comment(
        &self,
        board_id: &str,
        task_id: &str,
        comment_id: &str,
        content: &str,
    ) -> GatewayResult<Task>;
    async fn delete_comment(
        &self,
        board_id: &str,
        task_id: &str,
        comment_id: &str,
    ) -> GatewayResult<()>;
    async fn assign_user(
        &self,
        board_id: &str,
        task_id: &str,
        user_id: &str,
    ) -> GatewayResult<Task>;
    async fn unassign_user(
        &self,
        board_id: &str,
        task_id: &str,
        user_id: &str,
    ) -> GatewayResult<Task>;
}

#[async_trait]
pub trait InvitationApi: Send + Sync {
    async fn list_received_invitations(&self) -> GatewayResult<Vec<Invitation>>;
    async fn respond_to_invitation(
        &self,
        invitation_id: &str,
        accept: bool,
    ) -> GatewayResult<InvitationResponse>;
}

#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn list_notifications(
        &self,
        filters: &NotificationFilters,
    ) -> GatewayResult<NotificationPage>;
    async fn unread_count(&self) -> GatewayResult<u64>;
    async fn mark_read(&self, notification_id: &str) -> GatewayResult<Notification>;
    async fn mark_all_read(&self) -> GatewayResult<()>;
    async fn delete_notification(&self, notification_id: &str) -> GatewayResult<()>;
}

/// Everything the board page needs.
pub trait KanbanApi: BoardApi + ColumnApi + TaskApi {}

impl<T: BoardApi + ColumnApi + TaskApi> KanbanApi for T {}
