//! In-memory gateway used by store tests.
//!
//! Keeps boards, invitations and notifications in a mutex, records every
//! call as `"<verb> <resource>"`, and can be told to fail or to hold calls
//! until released so tests can observe the optimistic state in flight.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::errors::GatewayError;
use crate::kanban::models::{
    Board, BoardSummary, Column, Comment, CreateBoardInput, CreateColumnInput, CreateTaskInput,
    DEFAULT_COLUMN_COLOR, Invitation, InvitationResponse, InvitationStatus, MoveTaskInput,
    Notification, NotificationFilters, NotificationPage, OwnerRef, Pagination, Task,
    UpdateBoardInput, UpdateColumnInput, UpdateTaskInput,
};
use crate::kanban::reorder;

use super::{BoardApi, ColumnApi, GatewayResult, InvitationApi, NotificationApi, TaskApi};

/// User the fake treats as signed in.
pub(crate) const CURRENT_USER: &str = "u1";

#[derive(Default)]
struct Inner {
    boards: Vec<Board>,
    invitations: Vec<Invitation>,
    notifications: Vec<Notification>,
    calls: Vec<String>,
    failure: Option<(u16, String)>,
    gate: Option<Arc<Notify>>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn board_mut(&mut self, board_id: &str) -> GatewayResult<&mut Board> {
        self.boards
            .iter_mut()
            .find(|b| b.id == board_id)
            .ok_or_else(|| GatewayError::NotFound("Board not found".into()))
    }

    fn task_mut(&mut self, board_id: &str, task_id: &str) -> GatewayResult<&mut Task> {
        self.board_mut(board_id)?
            .columns
            .iter_mut()
            .flat_map(|c| c.tasks.iter_mut())
            .find(|t| t.id == task_id)
            .ok_or_else(|| GatewayError::NotFound("Task not found".into()))
    }
}

#[derive(Default)]
pub(crate) struct MemoryGateway {
    inner: Mutex<Inner>,
}

impl MemoryGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_boards(self, boards: Vec<Board>) -> Self {
        self.lock().boards = boards;
        self
    }

    pub(crate) fn with_invitations(self, invitations: Vec<Invitation>) -> Self {
        self.lock().invitations = invitations;
        self
    }

    pub(crate) fn with_notifications(self, notifications: Vec<Notification>) -> Self {
        self.lock().notifications = notifications;
        self
    }

    /// Every following call fails with `status` until [`Self::recover`].
    pub(crate) fn fail_with(&self, status: u16, message: &str) {
        self.lock().failure = Some((status, message.to_string()));
    }

    pub(crate) fn recover(&self) {
        self.lock().failure = None;
    }

    /// Park every following call until the returned `Notify` fires once per call.
    pub(crate) fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().gate = Some(gate.clone());
        gate
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub(crate) fn board(&self, board_id: &str) -> Option<Board> {
        self.lock().boards.iter().find(|b| b.id == board_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn enter(&self, call: String) -> GatewayResult<()> {
        let (gate, failure) = {
            let mut inner = self.lock();
            inner.calls.push(call);
            (inner.gate.clone(), inner.failure.clone())
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match failure {
            None => Ok(()),
            Some((401, _)) => Err(GatewayError::SessionExpired),
            Some((404, message)) => Err(GatewayError::NotFound(message)),
            Some((status, message)) => Err(GatewayError::Api { status, message }),
        }
    }
}

#[async_trait]
impl BoardApi for MemoryGateway {
    async fn list_boards(&self) -> GatewayResult<Vec<Board>> {
        self.enter("GET boards".into()).await?;
        Ok(self.lock().boards.clone())
    }

    async fn list_board_summaries(&self) -> GatewayResult<Vec<BoardSummary>> {
        self.enter("GET boards/simple".into()).await?;
        Ok(self
            .lock()
            .boards
            .iter()
            .map(|b| BoardSummary {
                id: b.id.clone(),
                name: b.name.clone(),
                description: b.description.clone(),
                owner: None,
            })
            .collect())
    }

    async fn get_board(&self, board_id: &str) -> GatewayResult<Board> {
        self.enter(format!("GET boards/{}", board_id)).await?;
        Ok(self.lock().board_mut(board_id)?.clone())
    }

    async fn create_board(&self, input: &CreateBoardInput) -> GatewayResult<Board> {
        self.enter("POST boards".into()).await?;
        let mut inner = self.lock();
        let board = Board {
            id: inner.next_id("b"),
            name: input.name.clone(),
            description: input.description.clone(),
            owner: Some(OwnerRef::Id(CURRENT_USER.into())),
            members: vec![CURRENT_USER.into()],
            columns: vec![],
        };
        inner.boards.push(board.clone());
        Ok(board)
    }

    async fn update_board(&self, board_id: &str, input: &UpdateBoardInput) -> GatewayResult<Board> {
        self.enter(format!("PUT boards/{}", board_id)).await?;
        let mut inner = self.lock();
        let board = inner.board_mut(board_id)?;
        input.apply_to(board);
        Ok(board.clone())
    }

    async fn delete_board(&self, board_id: &str) -> GatewayResult<()> {
        self.enter(format!("DELETE boards/{}", board_id)).await?;
        self.lock().boards.retain(|b| b.id != board_id);
        Ok(())
    }

    async fn add_member(&self, board_id: &str, email: &str) -> GatewayResult<Board> {
        self.enter(format!("POST boards/{}/members", board_id)).await?;
        let member = format!("user:{}", email);
        let mut inner = self.lock();
        let board = inner.board_mut(board_id)?;
        board.members.push(member);
        Ok(board.clone())
    }

    async fn leave_board(&self, board_id: &str) -> GatewayResult<()> {
        self.enter(format!("POST boards/{}/leave", board_id)).await?;
        self.lock().boards.retain(|b| b.id != board_id);
        Ok(())
    }

    async fn remove_member(&self, board_id: &str, member_id: &str) -> GatewayResult<()> {
        self.enter(format!("DELETE boards/{}/members/{}", board_id, member_id))
            .await?;
        self.lock().board_mut(board_id)?.members.retain(|m| m != member_id);
        Ok(())
    }
}

#[async_trait]
impl ColumnApi for MemoryGateway {
    async fn create_column(
        &self,
        board_id: &str,
        input: &CreateColumnInput,
    ) -> GatewayResult<Column> {
        self.enter(format!("POST boards/{}/columns", board_id)).await?;
        let mut inner = self.lock();
        let id = inner.next_id("c");
        let board = inner.board_mut(board_id)?;
        let column = Column {
            id,
            name: input.name.clone(),
            kind: input.kind,
            color: input.color.clone().unwrap_or_else(|| DEFAULT_COLUMN_COLOR.into()),
            limit: input.limit,
            order: board.columns.len(),
            is_default: false,
            tasks: vec![],
        };
        board.columns.push(column.clone());
        Ok(column)
    }

    async fn update_column(
        &self,
        board_id: &str,
        column_id: &str,
        input: &UpdateColumnInput,
    ) -> GatewayResult<Column> {
        self.enter(format!("PUT boards/{}/columns/{}", board_id, column_id))
            .await?;
        let mut inner = self.lock();
        let column = inner
            .board_mut(board_id)?
            .columns
            .iter_mut()
            .find(|c| c.id == column_id)
            .ok_or_else(|| GatewayError::NotFound("Column not found".into()))?;
        input.apply_to(column);
        Ok(column.clone())
    }

    async fn delete_column(&self, board_id: &str, column_id: &str) -> GatewayResult<()> {
        self.enter(format!("DELETE boards/{}/columns/{}", board_id, column_id))
            .await?;
        let mut inner = self.lock();
        let board = inner.board_mut(board_id)?;
        board.columns.retain(|c| c.id != column_id);
        reorder::reindex_columns(&mut board.columns);
        Ok(())
    }

    async fn reorder_column(
        &self,
        board_id: &str,
        column_id: &str,
        new_order: usize,
    ) -> GatewayResult<()> {
        self.enter(format!("PUT boards/{}/columns/reorder {}->{}", board_id, column_id, new_order))
            .await?;
        let mut inner = self.lock();
        let board = inner.board_mut(board_id)?;
        let reordered = reorder::reorder_column(&board.columns, column_id, new_order)
            .map_err(|e| GatewayError::Api {
            status: 400,
            message: e.to_string(),
        })?;
        board.columns = reordered.columns;
        Ok(())
    }
}

#[async_trait]
impl TaskApi for MemoryGateway {
    async fn create_task(
        &self,
        board_id: &str,
        column_id: &str,
        input: &CreateTaskInput,
    ) -> GatewayResult<Task> {
        self.enter(format!("POST boards/{}/columns/{}/tasks", board_id, column_id))
            .await?;
        let mut inner = self.lock();
        let id = inner.next_id("t");
        let column = inner
            .board_mut(board_id)?
            .columns
            .iter_mut()
            .find(|c| c.id == column_id)
            .ok_or_else(|| GatewayError::NotFound("Column not found".into()))?;
        let task = Task {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            priority: input.priority.unwrap_or_default(),
            status: input.status,
            due_date: input.due_date,
            assignees: vec![],
            labels: input.labels.clone(),
            comments: vec![],
            order: column.tasks.len(),
            column_id: column_id.to_string(),
        };
        column.tasks.push(task.clone());
        Ok(task)
    }

    async fn get_task(&self, board_id: &str, task_id: &str) -> GatewayResult<Task> {
        self.enter(format!("GET boards/{}/tasks/{}", board_id, task_id))
            .await?;
        Ok(self.lock().task_mut(board_id, task_id)?.clone())
    }

    async fn update_task(
        &self,
        board_id: &str,
        task_id: &str,
        input: &UpdateTaskInput,
    ) -> GatewayResult<Task> {
        self.enter(format!("PUT boards/{}/tasks/{}", board_id, task_id))
            .await?;
        let mut inner = self.lock();
        let task = inner.task_mut(board_id, task_id)?;
        input.apply_to(task);
        Ok(task.clone())
    }

    async fn delete_task(&self, board_id: &str, task_id: &str) -> GatewayResult<()> {
        self.enter(format!("DELETE boards/{}/tasks/{}", board_id, task_id))
            .await?;
        let mut inner = self.lock();
        for column in &mut inner.board_mut(board_id)?.columns {
            column.tasks.retain(|t| t.id != task_id);
            reorder::reindex_tasks(&mut column.tasks);
        }
        Ok(())
    }

    async fn move_task(
        &self,
        board_id: &str,
        task_id: &str,
        input: &MoveTaskInput,
    ) -> GatewayResult<Task> {
        self.enter(format!(
            "PUT boards/{}/tasks/{}/move {}@{}",
            board_id, task_id, input.target_column_id, input.order
        ))
        .await?;
        let mut inner = self.lock();
        let board = inner.board_mut(board_id)?;
        let (source, _) = reorder::locate(&board.columns, reorder::DraggedKind::Task, task_id)
            .ok_or_else(|| GatewayError::NotFound("Task not found".into()))?;
        let moved = reorder::move_task(
            &board.columns,
            task_id,
            &source,
            &input.target_column_id,
            input.order,
        )
        .map_err(|e| GatewayError::Api {
            status: 400,
            message: e.to_string(),
        })?;
        board.columns = moved.columns;
        Ok(inner.task_mut(board_id, task_id)?.clone())
    }

    async fn add_comment(
        &self,
        board_id: &str,
        task_id: &str,
        content: &str,
    ) -> GatewayResult<Task> {
        self.enter(format!("POST boards/{}/tasks/{}/comments", board_id, task_id))
            .await?;
        let mut inner = self.lock();
        let id = inner.next_id("cm");
        let task = inner.task_mut(board_id, task_id)?;
        task.comments.push(Comment {
            id,
            content: content.to_string(),
            created_by: CURRENT_USER.into(),
            created_at: Utc::now(),
        });
        Ok(task.clone())
    }

    async fn update_comment(
        &self,
        board_id: &str,
        task_id: &str,
        comment_id: &str,
        content: &str,
    ) -> GatewayResult<Task> {
        self.enter(format!("PUT boards/{}/tasks/{}/comments/{}", board_id, task_id, comment_id))
            .await?;
        let mut inner = self.lock();
        let task = inner.task_mut(board_id, task_id)?;
        let comment = task
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| GatewayError::NotFound("Comment not found".into()))?;
        comment.content = content.to_string();
        Ok(task.clone())
    }

    async fn delete_comment(
        &self,
        board_id: &str,
        task_id: &str,
        comment_id: &str,
    ) -> GatewayResult<()> {
        self.enter(format!("DELETE boards/{}/tasks/{}/comments/{}", board_id, task_id, comment_id))
            .await?;
        self.lock()
            .task_mut(board_id, task_id)?
            .comments
            .retain(|c| c.id != comment_id);
        Ok(())
    }

    async fn assign_user(
        &self,
        board_id: &str,
        task_id: &str,
        user_id: &str,
    ) -> GatewayResult<Task> {
        self.enter(format!("POST boards/{}/tasks/{}/assign/{}", board_id, task_id, user_id))
            .await?;
        let mut inner = self.lock();
        let task = inner.task_mut(board_id, task_id)?;
        if !task.assignees.iter().any(|a| a.id == user_id) {
            task.assignees.push(crate::kanban::models::Assignee {
                id: user_id.to_string(),
                name: user_id.to_string(),
                email: format!("{}@example.com", user_id),
            });
        }
        Ok(task.clone())
    }

    async fn unassign_user(
        &self,
        board_id: &str,
        task_id: &str,
        user_id: &str,
    ) -> GatewayResult<Task> {
        self.enter(format!("DELETE boards/{}/tasks/{}/assign/{}", board_id, task_id, user_id))
            .await?;
        let mut inner = self.lock();
        let task = inner.task_mut(board_id, task_id)?;
        task.assignees.retain(|a| a.id != user_id);
        Ok(task.clone())
    }
}

#[async_trait]
impl InvitationApi for MemoryGateway {
    async fn list_received_invitations(&self) -> GatewayResult<Vec<Invitation>> {
        self.enter("GET invitations/received".into()).await?;
        Ok(self.lock().invitations.clone())
    }

    async fn respond_to_invitation(
        &self,
        invitation_id: &str,
        accept: bool,
    ) -> GatewayResult<InvitationResponse> {
        self.enter(format!("POST invitations/{}/respond {}", invitation_id, accept))
            .await?;
        let mut inner = self.lock();
        let invitation = inner
            .invitations
            .iter_mut()
            .find(|i| i.id == invitation_id)
            .ok_or_else(|| GatewayError::NotFound("Invitation not found".into()))?;
        invitation.status = if accept {
            InvitationStatus::Accepted
        } else {
            InvitationStatus::Rejected
        };
        let invitation = invitation.clone();
        inner.invitations.retain(|i| i.id != invitation_id);
        Ok(InvitationResponse {
            message: if accept {
                "Invitation accepted".into()
            } else {
                "Invitation rejected".into()
            },
            invitation: Some(invitation),
            board: None,
        })
    }
}

#[async_trait]
impl NotificationApi for MemoryGateway {
    async fn list_notifications(
        &self,
        filters: &NotificationFilters,
    ) -> GatewayResult<NotificationPage> {
        let page = filters.page.unwrap_or(1).max(1);
        let limit = filters.limit.unwrap_or(10).max(1);
        self.enter(format!("GET notifications page={} limit={}", page, limit))
            .await?;
        let inner = self.lock();
        let matching: Vec<&Notification> = inner
            .notifications
            .iter()
            .filter(|n| filters.kind.is_none_or(|k| n.kind == k))
            .filter(|n| filters.is_read.is_none_or(|r| n.is_read == r))
            .collect();
        let total = matching.len() as u64;
        let pages = (matching.len() as u32).div_ceil(limit);
        let notifications = matching
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(NotificationPage {
            notifications,
            pagination: Pagination { total, page, pages },
        })
    }

    async fn unread_count(&self) -> GatewayResult<u64> {
        self.enter("GET notifications/unread-count".into()).await?;
        Ok(self.lock().notifications.iter().filter(|n| !n.is_read).count() as u64)
    }

    async fn mark_read(&self, notification_id: &str) -> GatewayResult<Notification> {
        self.enter(format!("PATCH notifications/{}/read", notification_id))
            .await?;
        let mut inner = self.lock();
        let notification = inner
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| GatewayError::NotFound("Notification not found".into()))?;
        notification.is_read = true;
        notification.read_at = Some(Utc::now());
        Ok(notification.clone())
    }

    async fn mark_all_read(&self) -> GatewayResult<()> {
        self.enter("PATCH notifications/mark-all-read".into()).await?;
        let now = Utc::now();
        for notification in &mut self.lock().notifications {
            notification.is_read = true;
            notification.read_at.get_or_insert(now);
        }
        Ok(())
    }

    async fn delete_notification(&self, notification_id: &str) -> GatewayResult<()> {
        self.enter(format!("DELETE notifications/{}", notification_id))
            .await?;
        self.lock().notifications.retain(|n| n.id != notification_id);
        Ok(())
    }
}
