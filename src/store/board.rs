use std::sync::Arc;

use tokio::sync::watch;

use crate::errors::StoreError;
use crate::gateway::BoardApi;
use crate::kanban::models::{
    self, Board, BoardSummary, CreateBoardInput, Task, UpdateBoardInput,
};
use crate::validation;

use super::{AppState, Slice, StateCell, StoreResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    pub boards: Vec<Board>,
    pub summaries: Vec<BoardSummary>,
    pub active_board: Option<Board>,
    pub active_task: Option<Task>,
    pub loading: bool,
    pub initialized: bool,
    pub error: Option<String>,
}

impl Slice for BoardState {
    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

impl BoardState {
    pub fn board(&self, board_id: &str) -> Option<&Board> {
        self.boards.iter().find(|b| b.id == board_id)
    }

    pub fn active_board_id(&self) -> Option<&str> {
        self.active_board.as_ref().map(|b| b.id.as_str())
    }

    fn contains(&self, board_id: &str) -> bool {
        self.board(board_id).is_some() || self.active_board_id() == Some(board_id)
    }

    /// Apply `f` to every copy of the board: the list entry and the active one.
    fn edit_board(&mut self, board_id: &str, f: impl Fn(&mut Board)) {
        for board in self.boards.iter_mut().filter(|b| b.id == board_id) {
            f(board);
        }
        if let Some(active) = self.active_board.as_mut().filter(|b| b.id == board_id) {
            f(active);
        }
    }

    fn drop_board(&mut self, board_id: &str) {
        self.boards.retain(|b| b.id != board_id);
        self.summaries.retain(|b| b.id != board_id);
        if self.active_board_id() == Some(board_id) {
            self.active_board = None;
            self.active_task = None;
        }
    }
}

/// Server-owned board fields; columns stay as the client arranged them.
fn merge_board_fields(target: &mut Board, server: &Board) {
    target.name = server.name.clone();
    target.description = server.description.clone();
    target.owner = server.owner.clone();
    target.members = server.members.clone();
}

pub struct BoardStore<G: ?Sized> {
    gateway: Arc<G>,
    state: Arc<StateCell<BoardState>>,
}

impl<G: ?Sized> Clone for BoardStore<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            state: self.state.clone(),
        }
    }
}

impl<G: BoardApi + ?Sized> BoardStore<G> {
    pub fn new(gateway: Arc<G>, app: &AppState) -> Self {
        Self {
            gateway,
            state: app.boards.clone(),
        }
    }

    pub fn state(&self) -> Arc<BoardState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<BoardState>> {
        self.state.subscribe()
    }

    /// Load the board list unless it is already loaded.
    pub async fn fetch_boards(&self) -> StoreResult<()> {
        let current = self.state.snapshot();
        if current.initialized && !current.boards.is_empty() {
            tracing::debug!("board list already loaded");
            return Ok(());
        }
        self.refresh_boards().await
    }

    pub async fn refresh_boards(&self) -> StoreResult<()> {
        self.state.update(|s| s.loading = true);
        let result = self.gateway.list_boards().await;
        self.state.update(|s| {
            s.loading = false;
            match &result {
                Ok(boards) => {
                    s.boards = boards.clone();
                    s.initialized = true;
                    s.error = None;
                }
                Err(e) => s.error = Some(e.user_message()),
            }
        });
        result.map(|_| ()).map_err(StoreError::from)
    }

    pub async fn fetch_board_summaries(&self) -> StoreResult<Vec<BoardSummary>> {
        match self.gateway.list_board_summaries().await {
            Ok(summaries) => {
                self.state.update(|s| s.summaries = summaries.clone());
                Ok(summaries)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.record_error(&err);
                Err(err)
            }
        }
    }

    /// Load one board with its columns and tasks and make it active.
    ///
    /// A missing board clears the active board and is reported, not fatal.
    pub async fn fetch_board_details(&self, board_id: &str) -> StoreResult<Board> {
        self.state.update(|s| s.loading = true);
        let result = self.gateway.get_board(board_id).await;
        match result {
            Ok(board) => {
                self.state.update(|s| {
                    s.loading = false;
                    s.error = None;
                    s.active_task = None;
                    s.active_board = Some(board.clone());
                    if let Some(entry) = s.boards.iter_mut().find(|b| b.id == board.id) {
                        merge_board_fields(entry, &board);
                    }
                });
                Ok(board)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(err.user_message());
                    if err.is_not_found() {
                        s.active_board = None;
                        s.active_task = None;
                    }
                });
                Err(err)
            }
        }
    }

    /// Make a board from the loaded list active without a round trip.
    pub fn set_active_board(&self, board_id: &str) -> StoreResult<()> {
        let board = self
            .state
            .snapshot()
            .board(board_id)
            .cloned()
            .ok_or_else(|| StoreError::BoardMismatch {
                requested: board_id.to_string(),
            })?;
        self.state.update(|s| {
            s.active_board = Some(board);
            s.active_task = None;
        });
        Ok(())
    }

    pub async fn create_board(&self, input: CreateBoardInput) -> StoreResult<Board> {
        validation::board_create(&input)?;
        let snapshot = self.state.snapshot();
        let provisional = Board {
            id: models::provisional_id(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            owner: None,
            members: vec![],
            columns: vec![],
        };
        let provisional_id = provisional.id.clone();
        self.state.update(|s| s.boards.push(provisional));

        match self.gateway.create_board(&input).await {
            Ok(board) => {
                self.state.update(|s| {
                    match s.boards.iter_mut().find(|b| b.id == provisional_id) {
                        Some(entry) => *entry = board.clone(),
                        None => {
                            tracing::debug!(id = %provisional_id, "created board no longer listed")
                        }
                    }
                    s.error = None;
                });
                Ok(board)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.rollback(&snapshot, "create_board", &err);
                Err(err)
            }
        }
    }

    pub async fn update_board(
        &self,
        board_id: &str,
        input: UpdateBoardInput,
    ) -> StoreResult<Board> {
        validation::board_update(&input)?;
        let snapshot = self.state.snapshot();
        self.state.update(|s| s.edit_board(board_id, |b| input.apply_to(b)));

        match self.gateway.update_board(board_id, &input).await {
            Ok(board) => {
                self.state.update(|s| {
                    if s.contains(board_id) {
                        s.edit_board(board_id, |b| merge_board_fields(b, &board));
                    }
                    s.error = None;
                });
                Ok(board)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.rollback(&snapshot, "update_board", &err);
                Err(err)
            }
        }
    }

    pub async fn delete_board(&self, board_id: &str) -> StoreResult<()> {
        let snapshot = self.state.snapshot();
        self.state.update(|s| s.drop_board(board_id));

        if let Err(e) = self.gateway.delete_board(board_id).await {
            let err = StoreError::from(e);
            self.state.rollback(&snapshot, "delete_board", &err);
            return Err(err);
        }
        Ok(())
    }

    /// Invite a member by email. The member id is only known once the
    /// server answers, so nothing changes locally before that.
    pub async fn add_member(&self, board_id: &str, email: &str) -> StoreResult<Board> {
        validation::member_email(email)?;
        let snapshot = self.state.snapshot();

        match self.gateway.add_member(board_id, email.trim()).await {
            Ok(board) => {
                self.state.update(|s| {
                    if s.contains(board_id) {
                        s.edit_board(board_id, |b| merge_board_fields(b, &board));
                    }
                    s.error = None;
                });
                Ok(board)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.rollback(&snapshot, "add_member", &err);
                Err(err)
            }
        }
    }

    pub async fn remove_member(&self, board_id: &str, member_id: &str) -> StoreResult<()> {
        let snapshot = self.state.snapshot();
        self.state
            .update(|s| s.edit_board(board_id, |b| b.members.retain(|m| m != member_id)));

        if let Err(e) = self.gateway.remove_member(board_id, member_id).await {
            let err = StoreError::from(e);
            self.state.rollback(&snapshot, "remove_member", &err);
            return Err(err);
        }
        Ok(())
    }

    /// Leave a board, then reload the list since membership shifted.
    pub async fn leave_board(&self, board_id: &str) -> StoreResult<()> {
        let snapshot = self.state.snapshot();
        self.state.update(|s| s.drop_board(board_id));

        if let Err(e) = self.gateway.leave_board(board_id).await {
            let err = StoreError::from(e);
            self.state.rollback(&snapshot, "leave_board", &err);
            return Err(err);
        }
        self.refresh_boards().await
    }

    pub fn reset(&self) {
        self.state.replace(BoardState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryGateway;
    use crate::store::fixtures::{board, loaded, roadmap};

    fn store(gateway: &Arc<MemoryGateway>, app: &AppState) -> BoardStore<MemoryGateway> {
        BoardStore::new(gateway.clone(), app)
    }

    #[tokio::test]
    async fn fetch_boards_loads_once_and_refresh_forces() {
        let gateway = Arc::new(
            MemoryGateway::new().with_boards(vec![roadmap(), board("b2", "Ops", vec![])]),
        );
        let app = AppState::new();
        let boards = store(&gateway, &app);

        boards.fetch_boards().await.unwrap();
        boards.fetch_boards().await.unwrap();
        assert_eq!(gateway.calls(), vec!["GET boards"]);
        let state = boards.state();
        assert!(state.initialized);
        assert!(!state.loading);
        assert_eq!(state.boards.len(), 2);

        boards.refresh_boards().await.unwrap();
        assert_eq!(gateway.calls().len(), 2);
    }

    #[tokio::test]
    async fn fetch_board_details_sets_active_board() {
        let gateway = Arc::new(MemoryGateway::new().with_boards(vec![roadmap()]));
        let app = AppState::new();
        let boards = store(&gateway, &app);

        let board = boards.fetch_board_details("b1").await.unwrap();
        assert_eq!(board.columns.len(), 3);
        assert_eq!(boards.state().active_board_id(), Some("b1"));
    }

    #[tokio::test]
    async fn missing_board_clears_active_board_without_panicking() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);
        gateway.fail_with(404, "Board not found");

        let err = boards.fetch_board_details("b1").await.unwrap_err();
        assert!(err.is_not_found());
        let state = boards.state();
        assert_eq!(state.active_board, None);
        assert_eq!(state.error.as_deref(), Some("Board not found"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn create_board_shows_provisional_entry_while_in_flight() {
        let gateway = Arc::new(MemoryGateway::new());
        let app = AppState::new();
        let boards = store(&gateway, &app);
        let gate = gateway.hold();
        let mut rx = boards.subscribe();

        let pending = tokio::spawn({
            let boards = boards.clone();
            async move {
                boards
                    .create_board(CreateBoardInput {
                        name: "Launch".into(),
                        description: None,
                    })
                    .await
            }
        });

        rx.changed().await.unwrap();
        let optimistic = rx.borrow_and_update().clone();
        assert_eq!(optimistic.boards.len(), 1);
        assert!(models::is_provisional(&optimistic.boards[0].id));
        assert_eq!(optimistic.boards[0].name, "Launch");

        gate.notify_one();
        let created = pending.await.unwrap().unwrap();
        let state = boards.state();
        assert_eq!(state.boards, vec![created.clone()]);
        assert!(!models::is_provisional(&created.id));
    }

    #[tokio::test]
    async fn failed_create_removes_provisional_board() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);
        let before = boards.state();
        gateway.fail_with(500, "Server unavailable");

        let err = boards
            .create_board(CreateBoardInput {
                name: "Launch".into(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Gateway(_)));
        let after = boards.state();
        assert_eq!(after.boards, before.boards);
        assert_eq!(after.error.as_deref(), Some("Server unavailable"));
    }

    #[tokio::test]
    async fn failed_rename_reverts_name_and_records_error() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);
        let before = boards.state();
        gateway.fail_with(500, "Could not save");

        let rename = UpdateBoardInput {
            name: Some("X".into()),
            description: None,
        };
        assert!(boards.update_board("b1", rename).await.is_err());

        let after = boards.state();
        assert_eq!(after.board("b1").unwrap().name, "Roadmap");
        assert_eq!(after.active_board.as_ref().unwrap().name, "Roadmap");
        assert_eq!(after.error.as_deref(), Some("Could not save"));
        let mut expected = (*before).clone();
        expected.error = Some("Could not save".into());
        assert_eq!(*after, expected);
    }

    #[tokio::test]
    async fn rename_keeps_local_columns() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);

        boards
            .update_board(
                "b1",
                UpdateBoardInput {
                    name: Some("Roadmap 2027".into()),
                    description: Some("Next year".into()),
                },
            )
            .await
            .unwrap();
        let active = boards.state().active_board.clone().unwrap();
        assert_eq!(active.name, "Roadmap 2027");
        assert_eq!(active.columns.len(), 3);
        assert_eq!(gateway.board("b1").unwrap().name, "Roadmap 2027");
    }

    #[tokio::test]
    async fn invalid_name_never_reaches_the_gateway() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);
        let err = boards
            .update_board(
                "b1",
                UpdateBoardInput {
                    name: Some(" ".into()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_board_clears_active_and_failure_restores_it() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);

        gateway.fail_with(403, "Only the owner can delete");
        assert!(boards.delete_board("b1").await.is_err());
        assert_eq!(boards.state().active_board_id(), Some("b1"));
        assert_eq!(boards.state().boards.len(), 1);

        gateway.recover();
        boards.delete_board("b1").await.unwrap();
        let state = boards.state();
        assert!(state.boards.is_empty());
        assert_eq!(state.active_board, None);
    }

    #[tokio::test]
    async fn add_member_merges_server_members() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);

        assert!(matches!(
            boards.add_member("b1", "nope").await,
            Err(StoreError::Validation(_))
        ));
        boards.add_member("b1", "grace@example.com").await.unwrap();
        let active = boards.state().active_board.clone().unwrap();
        assert!(active.members.contains(&"user:grace@example.com".to_string()));
        assert_eq!(active.columns.len(), 3);
    }

    #[tokio::test]
    async fn remove_member_is_optimistic() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);
        boards.remove_member("b1", "u2").await.unwrap();
        assert_eq!(boards.state().board("b1").unwrap().members, vec!["u1"]);

        gateway.fail_with(500, "nope");
        assert!(boards.remove_member("b1", "u1").await.is_err());
        assert_eq!(boards.state().board("b1").unwrap().members, vec!["u1"]);
    }

    #[tokio::test]
    async fn leave_board_drops_it_and_reloads_list() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);
        boards.leave_board("b1").await.unwrap();
        assert_eq!(gateway.calls(), vec!["POST boards/b1/leave", "GET boards"]);
        let state = boards.state();
        assert!(state.boards.is_empty());
        assert_eq!(state.active_board, None);
    }

    #[tokio::test]
    async fn session_expiry_is_reported() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);
        gateway.fail_with(401, "");
        let err = boards.refresh_boards().await.unwrap_err();
        assert!(err.is_session_expired());
    }

    #[test]
    fn set_active_board_requires_a_loaded_board() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);
        boards.set_active_board("b1").unwrap();
        assert!(matches!(
            boards.set_active_board("zzz"),
            Err(StoreError::BoardMismatch { .. })
        ));
        boards.reset();
        assert_eq!(*boards.state(), BoardState::default());
    }

    #[test]
    fn unknown_active_board_publishes_nothing() {
        let (gateway, app) = loaded();
        let boards = store(&gateway, &app);
        let mut rx = boards.subscribe();
        rx.borrow_and_update();

        assert!(boards.set_active_board("zzz").is_err());
        assert!(!rx.has_changed().unwrap());

        boards.set_active_board("b1").unwrap();
        assert!(rx.has_changed().unwrap());
    }
}
