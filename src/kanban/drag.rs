//! Ephemeral state of one pointer gesture.
//!
//! A `DragSession` snapshots the arrangement when the drag starts. Hover
//! previews are recomputed from whatever arrangement is currently shown,
//! never by composing deltas. Dropping yields the net patch relative to the
//! snapshot; if the gateway later rejects it, the snapshot is restored as is.

use crate::errors::ReorderError;

use super::models::Column;
use super::reorder::{self, DraggedKind, OrderPatch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverTarget {
    pub container_id: String,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct DragSession {
    dragged: DraggedKind,
    dragged_id: String,
    origin_container_id: String,
    snapshot: Vec<Column>,
    hover: Option<HoverTarget>,
}

/// Outcome of a drop: the arrangement to show and the patch to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropped {
    pub columns: Vec<Column>,
    pub patch: Option<OrderPatch>,
}

impl DragSession {
    pub fn start(
        columns: &[Column],
        dragged: DraggedKind,
        dragged_id: impl Into<String>,
    ) -> Result<Self, ReorderError> {
        let dragged_id = dragged_id.into();
        let (origin_container_id, _) =
            reorder::locate(columns, dragged, &dragged_id).ok_or_else(|| match dragged {
                DraggedKind::Column => ReorderError::UnknownColumn {
                    id: dragged_id.clone(),
                },
                DraggedKind::Task => ReorderError::UnknownTask {
                    id: dragged_id.clone(),
                },
            })?;
        Ok(Self {
            dragged,
            dragged_id,
            origin_container_id,
            snapshot: columns.to_vec(),
            hover: None,
        })
    }

    pub fn dragged(&self) -> DraggedKind {
        self.dragged
    }

    pub fn dragged_id(&self) -> &str {
        &self.dragged_id
    }

    /// Column the task was picked up from; empty for column drags.
    pub fn origin_container_id(&self) -> &str {
        &self.origin_container_id
    }

    pub fn hover_target(&self) -> Option<&HoverTarget> {
        self.hover.as_ref()
    }

    /// Arrangement as it was when the gesture began.
    pub fn snapshot(&self) -> &[Column] {
        &self.snapshot
    }

    /// Preview the arrangement with the dragged entity over `container_id`
    /// at `index`. `current` is the arrangement on screen right now, which
    /// may already include earlier previews.
    pub fn hover(
        &mut self,
        current: &[Column],
        container_id: &str,
        index: usize,
    ) -> Result<Vec<Column>, ReorderError> {
        let columns = self.place(current, container_id, index)?;
        self.hover = Some(HoverTarget {
            container_id: container_id.to_string(),
            index,
        });
        Ok(columns)
    }

    /// Finish the gesture over `container_id` at `index`.
    pub fn drop_at(
        self,
        current: &[Column],
        container_id: &str,
        index: usize,
    ) -> Result<Dropped, ReorderError> {
        let columns = self.place(current, container_id, index)?;
        let patch = reorder::net_patch(&self.snapshot, &columns, self.dragged, &self.dragged_id);
        Ok(Dropped { columns, patch })
    }

    /// Abandon the gesture, handing back the pre-drag arrangement.
    pub fn cancel(self) -> Vec<Column> {
        self.snapshot
    }

    fn place(
        &self,
        current: &[Column],
        container_id: &str,
        index: usize,
    ) -> Result<Vec<Column>, ReorderError> {
        match self.dragged {
            DraggedKind::Column => {
                let index = index.min(current.len().saturating_sub(1));
                Ok(reorder::reorder_column(current, &self.dragged_id, index)?.columns)
            }
            DraggedKind::Task => {
                let (source, _) = reorder::locate(current, DraggedKind::Task, &self.dragged_id)
                    .ok_or_else(|| ReorderError::UnknownTask {
                        id: self.dragged_id.clone(),
                    })?;
                Ok(reorder::move_task(current, &self.dragged_id, &source, container_id, index)?
                    .columns)
            }
        }
    }
}
