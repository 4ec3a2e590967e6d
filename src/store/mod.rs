//! Client-side state: explicit cells, optimistic actions, rollback.
//!
//! Each slice lives in a [`StateCell`]: an immutable `Arc<S>` replaced as a
//! whole on every change and published over a `watch` channel. Store
//! handles (`BoardStore`, `ColumnStore`, ...) pair a cell with a gateway and
//! implement the optimistic protocol: snapshot, apply and publish, one
//! gateway call, then merge on success or restore the snapshot on failure.
//!
//! | Module         | Responsibility                                      |
//! |----------------|-----------------------------------------------------|
//! | `board`        | `BoardState`, `BoardStore`: boards and membership   |
//! | `column`       | `ColumnStore`: columns of the active board          |
//! | `task`         | `TaskStore`: tasks, comments, drag commit           |
//! | `invitation`   | `InvitationState`, `InvitationStore`                |
//! | `notification` | `NotificationState`, `NotificationStore`            |

use std::sync::Arc;

use tokio::sync::watch;

use crate::errors::StoreError;

pub mod board;
pub mod column;
pub mod invitation;
pub mod notification;
pub mod task;

pub use board::{BoardState, BoardStore};
pub use column::ColumnStore;
pub use invitation::{InvitationState, InvitationStore};
pub use notification::{NotificationState, NotificationStore};
pub use task::TaskStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// A slice that records the message of its last failed action.
pub trait Slice: Clone + Send + Sync + 'static {
    fn set_error(&mut self, error: Option<String>);
}

/// Copy-on-write holder for one state slice.
pub struct StateCell<S> {
    tx: watch::Sender<Arc<S>>,
}

impl<S: Slice> StateCell<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// Current state. Cheap; the returned value never changes.
    pub fn snapshot(&self) -> Arc<S> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<S>> {
        self.tx.subscribe()
    }

    pub fn replace(&self, next: S) {
        self.tx.send_replace(Arc::new(next));
    }

    /// Clone the current state, mutate the clone, publish it.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut next = (*self.snapshot()).clone();
        let out = f(&mut next);
        self.replace(next);
        out
    }

    /// Put `snapshot` back verbatim apart from the recorded error.
    pub fn rollback(&self, snapshot: &Arc<S>, action: &str, err: &StoreError) {
        tracing::warn!(action, error = %err, "optimistic update rolled back");
        let mut restored = (**snapshot).clone();
        restored.set_error(Some(err.user_message()));
        self.replace(restored);
    }

    /// Record a failure without touching anything else.
    pub fn record_error(&self, err: &StoreError) {
        self.update(|state| state.set_error(Some(err.user_message())));
    }
}

/// Every slice, injected into the store handles.
#[derive(Clone)]
pub struct AppState {
    pub boards: Arc<StateCell<BoardState>>,
    pub invitations: Arc<StateCell<InvitationState>>,
    pub notifications: Arc<StateCell<NotificationState>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            boards: Arc::new(StateCell::new(BoardState::default())),
            invitations: Arc::new(StateCell::new(InvitationState::default())),
            notifications: Arc::new(StateCell::new(NotificationState::default())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
