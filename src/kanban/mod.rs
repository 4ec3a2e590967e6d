//! Kanban domain: wire models, the reorder engine and drag sessions.
//!
//! | Module    | Responsibility                                          |
//! |-----------|---------------------------------------------------------|
//! | `models`  | `Board`, `Column`, `Task`, invitations, notifications   |
//! | `reorder` | Pure column/task reorder math + `OrderPatch`            |
//! | `drag`    | `DragSession`: snapshot, hover preview, drop            |

pub mod drag;
pub mod models;
pub mod reorder;
