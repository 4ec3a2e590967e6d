use std::sync::Arc;

use crate::errors::{ReorderError, StoreError};
use crate::gateway::{ColumnApi, GatewayResult, TaskApi};
use crate::kanban::drag::DragSession;
use crate::kanban::models::{self, Board, CreateTaskInput, MoveTaskInput, Task, UpdateTaskInput};
use crate::kanban::reorder::{self, DraggedKind, OrderPatch};
use crate::validation;

use super::column::{active_board, with_active};
use super::{AppState, BoardState, StateCell, StoreResult};

/// Task actions on the active board, plus drag-and-drop commit.
pub struct TaskStore<G: ?Sized> {
    gateway: Arc<G>,
    state: Arc<StateCell<BoardState>>,
}

impl<G: ?Sized> Clone for TaskStore<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            state: self.state.clone(),
        }
    }
}

fn task_mut<'a>(board: &'a mut Board, task_id: &str) -> Option<&'a mut Task> {
    board
        .columns
        .iter_mut()
        .flat_map(|c| c.tasks.iter_mut())
        .find(|t| t.id == task_id)
}

fn require_task<'a>(board: &'a Board, task_id: &str) -> StoreResult<(&'a str, &'a Task)> {
    board
        .find_task(task_id)
        .map(|(column, task)| (column.id.as_str(), task))
        .ok_or_else(|| {
            ReorderError::UnknownTask {
                id: task_id.to_string(),
            }
            .into()
        })
}

/// Take the server's copy of a task but keep where the client placed it.
fn merge_task(state: &mut BoardState, board_id: &str, server: &Task) -> bool {
    let merged = with_active(state, board_id, |board| {
        if let Some(entry) = task_mut(board, &server.id) {
            let (order, column_id) = (entry.order, entry.column_id.clone());
            *entry = server.clone();
            entry.order = order;
            entry.column_id = column_id;
        }
    });
    if let Some(active) = state.active_task.as_mut().filter(|t| t.id == server.id) {
        *active = server.clone();
    }
    merged
}

impl<G: TaskApi + ?Sized> TaskStore<G> {
    pub fn new(gateway: Arc<G>, app: &AppState) -> Self {
        Self {
            gateway,
            state: app.boards.clone(),
        }
    }

    /// Load a task with its comments and make it the active task.
    pub async fn fetch_task_details(&self, task_id: &str) -> StoreResult<Task> {
        let board_id = active_board(&self.state.snapshot())?.id.clone();
        match self.gateway.get_task(&board_id, task_id).await {
            Ok(task) => {
                self.state.update(|s| {
                    merge_task(s, &board_id, &task);
                    s.active_task = Some(task.clone());
                    s.error = None;
                });
                Ok(task)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.record_error(&err);
                Err(err)
            }
        }
    }

    pub async fn create_task(&self, column_id: &str, input: CreateTaskInput) -> StoreResult<Task> {
        validation::task_create(&input)?;
        let snapshot = self.state.snapshot();
        let board = active_board(&snapshot)?;
        let board_id = board.id.clone();
        let column = board.column(column_id).ok_or_else(|| ReorderError::UnknownColumn {
            id: column_id.to_string(),
        })?;
        let provisional = Task {
            id: models::provisional_id(),
            title: input.title.trim().to_string(),
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
        let provisional_id = provisional.id.clone();
        self.state.update(|s| {
            with_active(s, &board_id, |board| {
                if let Some(column) = board.columns.iter_mut().find(|c| c.id == column_id) {
                    column.tasks.push(provisional);
                }
            })
        });

        match self.gateway.create_task(&board_id, column_id, &input).await {
            Ok(task) => {
                self.state.update(|s| {
                    with_active(s, &board_id, |board| {
                        if let Some(entry) = task_mut(board, &provisional_id) {
                            let order = entry.order;
                            *entry = task.clone();
                            entry.order = order;
                        }
                    });
                    s.error = None;
                });
                Ok(task)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.rollback(&snapshot, "create_task", &err);
                Err(err)
            }
        }
    }

    pub async fn update_task(&self, task_id: &str, input: UpdateTaskInput) -> StoreResult<Task> {
        validation::task_update(&input)?;
        let snapshot = self.state.snapshot();
        let board = active_board(&snapshot)?;
        let board_id = board.id.clone();
        require_task(board, task_id)?;
        self.state.update(|s| {
            with_active(s, &board_id, |board| {
                if let Some(task) = task_mut(board, task_id) {
                    input.apply_to(task);
                }
            });
            if let Some(active) = s.active_task.as_mut().filter(|t| t.id == task_id) {
                input.apply_to(active);
            }
        });

        match self.gateway.update_task(&board_id, task_id, &input).await {
            Ok(task) => {
                self.state.update(|s| {
                    if !merge_task(s, &board_id, &task) {
                        tracing::debug!(
                            task = %task_id,
                            "active board changed, skipping task merge"
                        );
                    }
                    s.error = None;
                });
                Ok(task)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.rollback(&snapshot, "update_task", &err);
                Err(err)
            }
        }
    }

    pub async fn delete_task(&self, task_id: &str) -> StoreResult<()> {
        let snapshot = self.state.snapshot();
        let board = active_board(&snapshot)?;
        let board_id = board.id.clone();
        require_task(board, task_id)?;
        self.state.update(|s| {
            with_active(s, &board_id, |board| {
                for column in &mut board.columns {
                    let before = column.tasks.len();
                    column.tasks.retain(|t| t.id != task_id);
                    if column.tasks.len() != before {
                        reorder::reindex_tasks(&mut column.tasks);
                    }
                }
            });
            if s.active_task.as_ref().is_some_and(|t| t.id == task_id) {
                s.active_task = None;
            }
        });

        if let Err(e) = self.gateway.delete_task(&board_id, task_id).await {
            let err = StoreError::from(e);
            self.state.rollback(&snapshot, "delete_task", &err);
            return Err(err);
        }
        Ok(())
    }

    /// Move a task to `input.order` in `input.target_column_id`. Returns
    /// the patch sent, or `None` for a no-op.
    pub async fn move_task(
        &self,
        task_id: &str,
        input: MoveTaskInput,
    ) -> StoreResult<Option<OrderPatch>> {
        let snapshot = self.state.snapshot();
        let board = active_board(&snapshot)?;
        let board_id = board.id.clone();
        let (source, _) = require_task(board, task_id)?;
        let moved = reorder::move_task(
            &board.columns,
            task_id,
            source,
            &input.target_column_id,
            input.order,
        )?;
        let Some(patch) = moved.patch else {
            return Ok(None);
        };
        self.state
            .update(|s| with_active(s, &board_id, |board| board.columns = moved.columns));

        if let Err(err) = self.send_task_move(&board_id, &patch).await {
            self.state.rollback(&snapshot, "move_task", &err);
            return Err(err);
        }
        Ok(Some(patch))
    }

    async fn send_task_move(&self, board_id: &str, patch: &OrderPatch) -> StoreResult<()> {
        if let OrderPatch::TaskMove {
            task_id,
            target_column_id,
            order,
        } = patch
        {
            let input = MoveTaskInput {
                target_column_id: target_column_id.clone(),
                order: *order,
            };
            self.gateway.move_task(board_id, task_id, &input).await?;
        }
        Ok(())
    }

    // ── Confirm-only actions ──────────────────────────────────────────
    //
    // Nothing changes locally before the server answers; the task it
    // returns is merged on success.

    pub async fn add_comment(&self, task_id: &str, content: &str) -> StoreResult<Task> {
        validation::comment(content)?;
        let (snapshot, board_id) = self.confirm_target(task_id)?;
        let result = self.gateway.add_comment(&board_id, task_id, content.trim()).await;
        self.settle(&snapshot, &board_id, "add_comment", result)
    }

    pub async fn update_comment(
        &self,
        task_id: &str,
        comment_id: &str,
        content: &str,
    ) -> StoreResult<Task> {
        validation::comment(content)?;
        let (snapshot, board_id) = self.confirm_target(task_id)?;
        let result = self
            .gateway
            .update_comment(&board_id, task_id, comment_id, content.trim())
            .await;
        self.settle(&snapshot, &board_id, "update_comment", result)
    }

    pub async fn delete_comment(&self, task_id: &str, comment_id: &str) -> StoreResult<()> {
        let (snapshot, board_id) = self.confirm_target(task_id)?;

        if let Err(e) = self.gateway.delete_comment(&board_id, task_id, comment_id).await {
            let err = StoreError::from(e);
            self.state.rollback(&snapshot, "delete_comment", &err);
            return Err(err);
        }
        self.state.update(|s| {
            with_active(s, &board_id, |board| {
                if let Some(task) = task_mut(board, task_id) {
                    task.comments.retain(|c| c.id != comment_id);
                }
            });
            if let Some(active) = s.active_task.as_mut().filter(|t| t.id == task_id) {
                active.comments.retain(|c| c.id != comment_id);
            }
            s.error = None;
        });
        Ok(())
    }

    pub async fn assign_user(&self, task_id: &str, user_id: &str) -> StoreResult<Task> {
        let (snapshot, board_id) = self.confirm_target(task_id)?;
        let result = self.gateway.assign_user(&board_id, task_id, user_id).await;
        self.settle(&snapshot, &board_id, "assign_user", result)
    }

    pub async fn unassign_user(&self, task_id: &str, user_id: &str) -> StoreResult<Task> {
        let (snapshot, board_id) = self.confirm_target(task_id)?;
        let result = self.gateway.unassign_user(&board_id, task_id, user_id).await;
        self.settle(&snapshot, &board_id, "unassign_user", result)
    }

    fn confirm_target(&self, task_id: &str) -> StoreResult<(Arc<BoardState>, String)> {
        let snapshot = self.state.snapshot();
        let board = active_board(&snapshot)?;
        require_task(board, task_id)?;
        let board_id = board.id.clone();
        Ok((snapshot, board_id))
    }

    fn settle(
        &self,
        snapshot: &Arc<BoardState>,
        board_id: &str,
        action: &str,
        result: GatewayResult<Task>,
    ) -> StoreResult<Task> {
        match result {
            Ok(task) => {
                self.state.update(|s| {
                    if !merge_task(s, board_id, &task) {
                        tracing::debug!(action, "active board changed, skipping task merge");
                    }
                    s.error = None;
                });
                Ok(task)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.rollback(snapshot, action, &err);
                Err(err)
            }
        }
    }
}

// ── Drag and drop ─────────────────────────────────────────────────────

impl<G: TaskApi + ColumnApi + ?Sized> TaskStore<G> {
    /// Begin a gesture on the active board.
    pub fn start_drag(&self, dragged: DraggedKind, dragged_id: &str) -> StoreResult<DragSession> {
        let snapshot = self.state.snapshot();
        let board = active_board(&snapshot)?;
        Ok(DragSession::start(&board.columns, dragged, dragged_id)?)
    }

    /// Show the dragged entity over `container_id` at `index`. No request
    /// is sent and no snapshot is taken.
    pub fn preview_drag(
        &self,
        session: &mut DragSession,
        container_id: &str,
        index: usize,
    ) -> StoreResult<()> {
        let current = self.state.snapshot();
        let board = active_board(&current)?;
        let board_id = board.id.clone();
        let columns = session.hover(&board.columns, container_id, index)?;
        self.state
            .update(|s| with_active(s, &board_id, |board| board.columns = columns));
        Ok(())
    }

    /// Put the board back as it was when the gesture began.
    pub fn cancel_drag(&self, session: DragSession) -> StoreResult<()> {
        let board_id = active_board(&self.state.snapshot())?.id.clone();
        let columns = session.cancel();
        self.state
            .update(|s| with_active(s, &board_id, |board| board.columns = columns));
        Ok(())
    }

    /// Drop over `container_id` at `index` and send the net change.
    ///
    /// On failure the arrangement from drag start is restored verbatim.
    pub async fn commit_drag(
        &self,
        session: DragSession,
        container_id: &str,
        index: usize,
    ) -> StoreResult<Option<OrderPatch>> {
        let current = self.state.snapshot();
        let board = active_board(&current)?;
        let board_id = board.id.clone();

        let mut before = (*current).clone();
        with_active(&mut before, &board_id, |board| {
            board.columns = session.snapshot().to_vec()
        });
        let before = Arc::new(before);

        let dropped = match session.drop_at(&board.columns, container_id, index) {
            Ok(dropped) => dropped,
            Err(e) => {
                let err = StoreError::from(e);
                self.state.rollback(&before, "commit_drag", &err);
                return Err(err);
            }
        };
        self.state
            .update(|s| with_active(s, &board_id, |board| board.columns = dropped.columns));

        let Some(patch) = dropped.patch else {
            return Ok(None);
        };
        let sent = match &patch {
            OrderPatch::ColumnReorder {
                column_id,
                new_order,
            } => self
                .gateway
                .reorder_column(&board_id, column_id, *new_order)
                .await
                .map_err(StoreError::from),
            OrderPatch::TaskMove { .. } => self.send_task_move(&board_id, &patch).await,
        };
        if let Err(err) = sent {
            self.state.rollback(&before, "commit_drag", &err);
            return Err(err);
        }
        Ok(Some(patch))
    }
}
