use std::sync::Arc;

use crate::errors::{ReorderError, StoreError};
use crate::gateway::ColumnApi;
use crate::kanban::models::{
    self, Board, Column, CreateColumnInput, DEFAULT_COLUMN_COLOR, UpdateColumnInput,
};
use crate::kanban::reorder::{self, OrderPatch};
use crate::validation;

use super::{AppState, BoardState, StateCell, StoreResult};

/// Column actions on the active board.
pub struct ColumnStore<G: ?Sized> {
    gateway: Arc<G>,
    state: Arc<StateCell<BoardState>>,
}

impl<G: ?Sized> Clone for ColumnStore<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            state: self.state.clone(),
        }
    }
}

pub(super) fn active_board(state: &BoardState) -> StoreResult<&Board> {
    state.active_board.as_ref().ok_or(StoreError::NoActiveBoard)
}

fn column_position(board: &Board, column_id: &str) -> StoreResult<usize> {
    board
        .columns
        .iter()
        .position(|c| c.id == column_id)
        .ok_or_else(|| {
            ReorderError::UnknownColumn {
                id: column_id.to_string(),
            }
            .into()
        })
}

/// Run `f` on the active board if it is still `board_id`.
pub(super) fn with_active(
    state: &mut BoardState,
    board_id: &str,
    f: impl FnOnce(&mut Board),
) -> bool {
    match state.active_board.as_mut().filter(|b| b.id == board_id) {
        Some(board) => {
            f(board);
            true
        }
        None => false,
    }
}

impl<G: ColumnApi + ?Sized> ColumnStore<G> {
    pub fn new(gateway: Arc<G>, app: &AppState) -> Self {
        Self {
            gateway,
            state: app.boards.clone(),
        }
    }

    /// Append a column. It shows up at the end with a provisional id until
    /// the server confirms.
    pub async fn add_column(&self, input: CreateColumnInput) -> StoreResult<Column> {
        validation::column_create(&input)?;
        let snapshot = self.state.snapshot();
        let board_id = active_board(&snapshot)?.id.clone();
        let provisional = Column {
            id: models::provisional_id(),
            name: input.name.trim().to_string(),
            kind: input.kind,
            color: input
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_COLUMN_COLOR.to_string()),
            limit: input.limit,
            order: 0,
            is_default: false,
            tasks: vec![],
        };
        let provisional_id = provisional.id.clone();
        self.state.update(|s| {
            with_active(s, &board_id, |board| {
                let mut column = provisional;
                column.order = board.columns.len();
                board.columns.push(column);
            })
        });

        match self.gateway.create_column(&board_id, &input).await {
            Ok(column) => {
                self.state.update(|s| {
                    let merged = with_active(s, &board_id, |board| {
                        let entry = board.columns.iter_mut().find(|c| c.id == provisional_id);
                        if let Some(entry) = entry {
                            let order = entry.order;
                            *entry = column.clone();
                            entry.order = order;
                        }
                    });
                    if !merged {
                        tracing::debug!(
                            board = %board_id,
                            "active board changed, skipping column merge"
                        );
                    }
                    s.error = None;
                });
                Ok(column)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.rollback(&snapshot, "add_column", &err);
                Err(err)
            }
        }
    }

    pub async fn update_column(
        &self,
        column_id: &str,
        input: UpdateColumnInput,
    ) -> StoreResult<Column> {
        validation::column_update(&input)?;
        let snapshot = self.state.snapshot();
        let board = active_board(&snapshot)?;
        let board_id = board.id.clone();
        let index = column_position(board, column_id)?;
        self.state.update(|s| {
            with_active(s, &board_id, |board| input.apply_to(&mut board.columns[index]))
        });

        match self.gateway.update_column(&board_id, column_id, &input).await {
            Ok(column) => {
                self.state.update(|s| {
                    with_active(s, &board_id, |board| {
                        if let Some(entry) = board.columns.iter_mut().find(|c| c.id == column_id) {
                            entry.name = column.name.clone();
                            entry.kind = column.kind;
                            entry.color = column.color.clone();
                            entry.limit = column.limit;
                        }
                    });
                    s.error = None;
                });
                Ok(column)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.rollback(&snapshot, "update_column", &err);
                Err(err)
            }
        }
    }

    /// Remove a column and, locally, every task in it.
    pub async fn delete_column(&self, column_id: &str) -> StoreResult<()> {
        let snapshot = self.state.snapshot();
        let board = active_board(&snapshot)?;
        let board_id = board.id.clone();
        let index = column_position(board, column_id)?;
        self.state.update(|s| {
            with_active(s, &board_id, |board| {
                board.columns.remove(index);
                reorder::reindex_columns(&mut board.columns);
            });
            if s
                .active_task
                .as_ref()
                .is_some_and(|t| t.column_id == column_id)
            {
                s.active_task = None;
            }
        });

        if let Err(e) = self.gateway.delete_column(&board_id, column_id).await {
            let err = StoreError::from(e);
            self.state.rollback(&snapshot, "delete_column", &err);
            return Err(err);
        }
        Ok(())
    }

    /// Move a column to `target_index`. Returns the patch sent, or `None`
    /// when the column was already there and nothing was sent.
    pub async fn reorder_column(
        &self,
        column_id: &str,
        target_index: usize,
    ) -> StoreResult<Option<OrderPatch>> {
        let snapshot = self.state.snapshot();
        let board = active_board(&snapshot)?;
        let board_id = board.id.clone();
        let reordered = reorder::reorder_column(&board.columns, column_id, target_index)?;
        let Some(patch) = reordered.patch else {
            return Ok(None);
        };
        self.state
            .update(|s| with_active(s, &board_id, |board| board.columns = reordered.columns));

        if let Err(e) = self
            .gateway
            .reorder_column(&board_id, column_id, target_index)
            .await
        {
            let err = StoreError::from(e);
            self.state.rollback(&snapshot, "reorder_column", &err);
            return Err(err);
        }
        Ok(Some(patch))
    }
}
