//! Drag-and-drop reorder engine.
//!
//! Pure functions over a board's column list. Every function takes the
//! current arrangement by reference and returns a fresh one; nothing here
//! touches store state or the network. Callers resolve drop targets to a
//! numeric index first (see [`resolve_task_target_index`]).
//!
//! After any successful call, column `order` values are `0..n-1` in list
//! sequence and task `order` values are `0..n-1` within every column the
//! call touched.

use serde::{Deserialize, Serialize};

use crate::errors::ReorderError;

use super::models::{Column, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraggedKind {
    Column,
    Task,
}

/// A resolved drag gesture. For columns both container ids name the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEvent {
    pub dragged: DraggedKind,
    pub dragged_id: String,
    pub source_container_id: String,
    pub target_container_id: String,
    pub target_index: usize,
}

/// The single gateway instruction a drop translates into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderPatch {
    ColumnReorder {
        column_id: String,
        new_order: usize,
    },
    TaskMove {
        task_id: String,
        target_column_id: String,
        order: usize,
    },
}

/// New arrangement plus the patch to send. `patch` is `None` for no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reordered {
    pub columns: Vec<Column>,
    pub patch: Option<OrderPatch>,
}

/// What the pointer was over when the task was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget<'a> {
    Task(&'a str),
    Column(&'a str),
}

pub fn apply(columns: &[Column], event: &DragEvent) -> Result<Reordered, ReorderError> {
    match event.dragged {
        DraggedKind::Column => reorder_column(columns, &event.dragged_id, event.target_index),
        DraggedKind::Task => move_task(
            columns,
            &event.dragged_id,
            &event.source_container_id,
            &event.target_container_id,
            event.target_index,
        ),
    }
}

pub fn reorder_column(
    columns: &[Column],
    column_id: &str,
    target_index: usize,
) -> Result<Reordered, ReorderError> {
    let from = column_index(columns, column_id)?;
    if target_index >= columns.len() {
        return Err(ReorderError::IndexOutOfRange {
            index: target_index,
            len: columns.len(),
        });
    }

    let mut next = columns.to_vec();
    let moved = next.remove(from);
    next.insert(target_index, moved);
    reindex_columns(&mut next);

    let patch = (from != target_index).then(|| OrderPatch::ColumnReorder {
        column_id: column_id.to_string(),
        new_order: target_index,
    });
    Ok(Reordered {
        columns: next,
        patch,
    })
}

/// Move a task within its column or across columns.
///
/// `target_index` is a position in the target list once the task has been
/// taken out of its source; indices past the end append.
pub fn move_task(
    columns: &[Column],
    task_id: &str,
    source_column_id: &str,
    target_column_id: &str,
    target_index: usize,
) -> Result<Reordered, ReorderError> {
    let source = column_index(columns, source_column_id)?;
    let target = column_index(columns, target_column_id)?;
    let from = columns[source]
        .tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| {
            if columns.iter().any(|c| c.tasks.iter().any(|t| t.id == task_id)) {
                ReorderError::TaskNotInSource {
                    task_id: task_id.to_string(),
                    column_id: source_column_id.to_string(),
                }
            } else {
                ReorderError::UnknownTask {
                    id: task_id.to_string(),
                }
            }
        })?;

    let mut next = columns.to_vec();
    let mut task = next[source].tasks.remove(from);
    task.column_id = next[target].id.clone();

    let index = target_index.min(next[target].tasks.len());
    next[target].tasks.insert(index, task);

    reindex_tasks(&mut next[source].tasks);
    if source != target {
        reindex_tasks(&mut next[target].tasks);
    }

    let patch = (source != target || from != index).then(|| OrderPatch::TaskMove {
        task_id: task_id.to_string(),
        target_column_id: target_column_id.to_string(),
        order: index,
    });
    Ok(Reordered {
        columns: next,
        patch,
    })
}

/// Turn a drop target into the index the engine expects.
///
/// Over a task: that task's current index in the target column. Over the
/// column itself, empty space, or a task that is not in the column: append.
pub fn resolve_task_target_index(target_column: &Column, drop: DropTarget<'_>) -> usize {
    match drop {
        DropTarget::Task(over_id) => target_column
            .tasks
            .iter()
            .position(|t| t.id == over_id)
            .unwrap_or(target_column.tasks.len()),
        DropTarget::Column(_) => target_column.tasks.len(),
    }
}

/// Where an entity sits in an arrangement: `(container id, index)`.
pub fn locate(columns: &[Column], kind: DraggedKind, id: &str) -> Option<(String, usize)> {
    match kind {
        DraggedKind::Column => columns
            .iter()
            .position(|c| c.id == id)
            .map(|index| (String::new(), index)),
        DraggedKind::Task => columns.iter().find_map(|column| {
            column
                .tasks
                .iter()
                .position(|t| t.id == id)
                .map(|index| (column.id.clone(), index))
        }),
    }
}

/// Patch taking `before` to `after` for a single dragged entity.
///
/// Used when the final arrangement was reached through several hover
/// previews and the per-step patches no longer describe the net move.
pub fn net_patch(
    before: &[Column],
    after: &[Column],
    kind: DraggedKind,
    id: &str,
) -> Option<OrderPatch> {
    let origin = locate(before, kind, id)?;
    let destination = locate(after, kind, id)?;
    if origin == destination {
        return None;
    }
    let (container, index) = destination;
    Some(match kind {
        DraggedKind::Column => OrderPatch::ColumnReorder {
            column_id: id.to_string(),
            new_order: index,
        },
        DraggedKind::Task => OrderPatch::TaskMove {
            task_id: id.to_string(),
            target_column_id: container,
            order: index,
        },
    })
}

pub fn reindex_columns(columns: &mut [Column]) {
    for (index, column) in columns.iter_mut().enumerate() {
        column.order = index;
    }
}

pub fn reindex_tasks(tasks: &mut [Task]) {
    for (index, task) in tasks.iter_mut().enumerate() {
        task.order = index;
    }
}

fn column_index(columns: &[Column], column_id: &str) -> Result<usize, ReorderError> {
    columns
        .iter()
        .position(|c| c.id == column_id)
        .ok_or_else(|| ReorderError::UnknownColumn {
            id: column_id.to_string(),
        })
}
