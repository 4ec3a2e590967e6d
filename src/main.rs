use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Kanban boards from the terminal")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmation prompts
    #[arg(long, global = true)]
    pub yes: bool,

    /// Config file (defaults to ~/.config/taskboard/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the board API. Overrides TASKBOARD_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token. Overrides TASKBOARD_TOKEN.
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List your boards
    Boards,
    /// Show and manage one board
    Board {
        #[command(subcommand)]
        command: BoardCommands,
    },
    /// Manage the columns of a board
    Column {
        #[command(subcommand)]
        command: ColumnCommands,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Board invitations you received
    Invitations {
        #[command(subcommand)]
        command: Option<InvitationCommands>,
    },
    /// Your notifications
    Notifications {
        #[command(subcommand)]
        command: Option<NotificationCommands>,
    },
    /// View configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum BoardCommands {
    /// Show a board with its columns and tasks
    Show { board: String },
    /// Create a board
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Rename a board or change its description
    Rename {
        board: String,
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a board and everything on it
    Delete { board: String },
    /// Leave a board you are a member of
    Leave { board: String },
    /// Invite someone by email
    AddMember { board: String, email: String },
    /// Remove a member
    RemoveMember { board: String, member: String },
}

#[derive(Subcommand, Clone)]
pub enum ColumnCommands {
    /// Append a column
    Add {
        board: String,
        name: String,
        /// todo, in-progress, done or custom
        #[arg(long, default_value = "custom")]
        kind: String,
        /// Hex color like #E2E8F0
        #[arg(long)]
        color: Option<String>,
        /// Work-in-progress limit
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Rename a column or change its color or limit
    Rename {
        board: String,
        column: String,
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Delete a column and its tasks
    Delete { board: String, column: String },
    /// Move a column to a zero-based position
    Move {
        board: String,
        column: String,
        index: usize,
    },
}

#[derive(Subcommand, Clone)]
pub enum TaskCommands {
    /// Add a task to the end of a column
    Create {
        board: String,
        column: String,
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium, high or urgent
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long = "label")]
        labels: Vec<String>,
    },
    /// Show a task with its comments
    Show { board: String, task: String },
    /// Change task fields
    Update {
        board: String,
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<String>,
        /// todo, in_progress, completed or blocked
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete a task
    Delete { board: String, task: String },
    /// Move a task to a column at a zero-based position
    Move {
        board: String,
        task: String,
        column: String,
        /// Position in the target column; appends when omitted
        index: Option<usize>,
    },
    /// Comment on a task
    Comment {
        board: String,
        task: String,
        content: String,
    },
    /// Assign a user
    Assign {
        board: String,
        task: String,
        user: String,
    },
    /// Unassign a user
    Unassign {
        board: String,
        task: String,
        user: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum InvitationCommands {
    /// List pending invitations
    List,
    /// Accept an invitation
    Accept { id: String },
    /// Decline an invitation
    Reject { id: String },
}

#[derive(Subcommand, Clone)]
pub enum NotificationCommands {
    /// List notifications, newest first
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        /// Filter by type, e.g. member_added
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Print the unread count
    Unread,
    /// Mark one notification as read
    Read { id: String },
    /// Mark everything as read
    ReadAll,
    /// Delete a notification
    Delete { id: String },
    /// Poll and print the unread count and invitations until Ctrl+C
    Watch,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    taskboard::logging::init(cli.verbose);

    let result = run(&cli).await;
    if let Err(e) = &result {
        if cmd::is_session_expired(e) {
            eprintln!(
                "{} set a fresh token with --token or TASKBOARD_TOKEN",
                console::style("Session expired:").red().bold()
            );
        }
    }
    result
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Config { command } => cmd::cmd_config(cli, command.clone())?,
        Commands::Boards => cmd::cmd_boards(&cmd::Context::load(cli)?).await?,
        Commands::Board { command } => {
            cmd::cmd_board(&cmd::Context::load(cli)?, command.clone()).await?
        }
        Commands::Column { command } => {
            cmd::cmd_column(&cmd::Context::load(cli)?, command.clone()).await?
        }
        Commands::Task { command } => {
            cmd::cmd_task(&cmd::Context::load(cli)?, command.clone()).await?
        }
        Commands::Invitations { command } => {
            cmd::cmd_invitations(&cmd::Context::load(cli)?, command.clone()).await?
        }
        Commands::Notifications { command } => {
            cmd::cmd_notifications(&cmd::Context::load(cli)?, command.clone()).await?
        }
    }

    Ok(())
}
