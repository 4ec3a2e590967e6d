//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                    |
//! |-----------------|-------------------------------------|
//! | `board`         | `Boards`, `Board`                   |
//! | `column`        | `Column`                            |
//! | `task`          | `Task`                              |
//! | `invitations`   | `Invitations`                       |
//! | `notifications` | `Notifications` (including `watch`) |
//! | `config`        | `Config`                            |

use std::sync::Arc;

use anyhow::{Context as _, Result};
use taskboard::config::{Config, Overrides};
use taskboard::errors::{GatewayError, StoreError};
use taskboard::gateway::HttpGateway;
use taskboard::kanban::models::Board;
use taskboard::store::{
    AppState, BoardStore, ColumnStore, InvitationStore, NotificationStore, TaskStore,
};

use super::Cli;

pub mod board;
pub mod column;
pub mod config;
pub mod invitations;
pub mod notifications;
pub mod task;

pub use board::{cmd_board, cmd_boards};
pub use column::cmd_column;
pub use config::cmd_config;
pub use invitations::cmd_invitations;
pub use notifications::cmd_notifications;
pub use task::cmd_task;

/// Everything a command needs: resolved config, one gateway, one state.
pub struct Context {
    pub config: Config,
    pub gateway: Arc<HttpGateway>,
    pub app: AppState,
    pub yes: bool,
}

pub fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        config_path: cli.config.clone(),
        api_url: cli.api_url.clone(),
        token: cli.token.clone(),
    }
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        let config = Config::load(&overrides(cli)).context("Failed to load configuration")?;
        let gateway = HttpGateway::new(&config).context("Failed to set up the HTTP client")?;
        tracing::debug!(api = %config.api_url, "client ready");
        Ok(Self {
            config,
            gateway: Arc::new(gateway),
            app: AppState::new(),
            yes: cli.yes,
        })
    }

    pub fn boards(&self) -> BoardStore<HttpGateway> {
        BoardStore::new(self.gateway.clone(), &self.app)
    }

    pub fn columns(&self) -> ColumnStore<HttpGateway> {
        ColumnStore::new(self.gateway.clone(), &self.app)
    }

    pub fn tasks(&self) -> TaskStore<HttpGateway> {
        TaskStore::new(self.gateway.clone(), &self.app)
    }

    pub fn invitations(&self) -> InvitationStore<HttpGateway> {
        InvitationStore::new(self.gateway.clone(), &self.app)
    }

    pub fn notifications(&self) -> NotificationStore<HttpGateway> {
        NotificationStore::new(self.gateway.clone(), &self.app, self.config.page_size)
    }

    /// Load a board and make it the active one.
    pub async fn open_board(&self, board_id: &str) -> Result<Board> {
        self.boards()
            .fetch_board_details(board_id)
            .await
            .with_context(|| format!("Failed to load board {}", board_id))
    }

    /// Ask before something destructive. `--yes` answers for the user.
    pub fn confirm(&self, prompt: &str) -> bool {
        if self.yes {
            return true;
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

pub fn is_session_expired(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<StoreError>()
            .is_some_and(StoreError::is_session_expired)
            || matches!(
                cause.downcast_ref::<GatewayError>(),
                Some(GatewayError::SessionExpired)
            )
    })
}
