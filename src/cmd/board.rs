//! Board commands: `taskboard boards` and `taskboard board ...`.

use anyhow::{Context as _, Result, bail};
use console::style;
use taskboard::kanban::models::{Board, CreateBoardInput, Priority, Task, UpdateBoardInput};

use super::super::BoardCommands;
use super::Context;

pub async fn cmd_boards(ctx: &Context) -> Result<()> {
    let boards = ctx.boards();
    boards.fetch_boards().await.context("Failed to load boards")?;
    let state = boards.state();

    println!();
    println!("{}", style("Boards").bold().cyan());
    println!();
    if state.boards.is_empty() {
        println!("No boards yet.");
        println!();
        println!("Create one with:");
        println!("  taskboard board create <name>");
        println!();
        return Ok(());
    }
    for board in &state.boards {
        println!(
            "  {}  {}  {}",
            style(&board.id).dim(),
            style(&board.name).bold(),
            style(format!(
                "({} columns, {} tasks)",
                board.columns.len(),
                board.task_count()
            ))
            .dim()
        );
    }
    println!();
    println!("{} board(s)", state.boards.len());
    Ok(())
}

pub async fn cmd_board(ctx: &Context, command: BoardCommands) -> Result<()> {
    let boards = ctx.boards();
    match command {
        BoardCommands::Show { board } => {
            let board = ctx.open_board(&board).await?;
            print_board(&board);
        }
        BoardCommands::Create { name, description } => {
            let board = boards
                .create_board(CreateBoardInput { name, description })
                .await
                .context("Failed to create board")?;
            println!("Created board '{}' ({})", board.name, style(&board.id).dim());
        }
        BoardCommands::Rename {
            board,
            name,
            description,
        } => {
            if name.is_none() && description.is_none() {
                bail!("Nothing to change: pass a new name or --description");
            }
            let updated = boards
                .update_board(&board, UpdateBoardInput { name, description })
                .await
                .context("Failed to update board")?;
            println!("Updated board '{}'", updated.name);
        }
        BoardCommands::Delete { board } => {
            if !ctx.confirm(&format!("Delete board {} and all of its tasks?", board)) {
                println!("Deletion cancelled.");
                return Ok(());
            }
            boards
                .delete_board(&board)
                .await
                .context("Failed to delete board")?;
            println!("Deleted board {}", board);
        }
        BoardCommands::Leave { board } => {
            if !ctx.confirm(&format!("Leave board {}?", board)) {
                println!("Cancelled.");
                return Ok(());
            }
            boards
                .leave_board(&board)
                .await
                .context("Failed to leave board")?;
            println!("Left board {}", board);
        }
        BoardCommands::AddMember { board, email } => {
            let updated = boards
                .add_member(&board, &email)
                .await
                .context("Failed to add member")?;
            println!(
                "Added {} to '{}' ({} members)",
                email,
                updated.name,
                updated.members.len()
            );
        }
        BoardCommands::RemoveMember { board, member } => {
            if !ctx.confirm(&format!("Remove {} from board {}?", member, board)) {
                println!("Cancelled.");
                return Ok(());
            }
            boards
                .remove_member(&board, &member)
                .await
                .context("Failed to remove member")?;
            println!("Removed {} from board {}", member, board);
        }
    }
    Ok(())
}

pub fn print_board(board: &Board) {
    println!();
    println!("{}", style(&board.name).bold().cyan());
    if let Some(description) = &board.description {
        println!("{}", style(description).dim());
    }
    if let Some(owner) = &board.owner {
        println!("Owner: {}  Members: {}", owner.display_name(), board.members.len());
    }
    for column in &board.columns {
        println!();
        let count = match column.limit {
            Some(limit) => format!("{}/{}", column.tasks.len(), limit),
            None => column.tasks.len().to_string(),
        };
        let count = if column.is_over_limit() {
            style(count).red().bold()
        } else {
            style(count).dim()
        };
        println!(
            "{} {} {}",
            style(format!("[{}]", column.order)).dim(),
            style(&column.name).bold(),
            count
        );
        println!("    {}", style(&column.id).dim());
        if column.tasks.is_empty() {
            println!("    {}", style("(empty)").dim());
        }
        for task in &column.tasks {
            println!("  {}", task_line(task));
        }
    }
    println!();
}

pub fn task_line(task: &Task) -> String {
    let mut line = format!(
        "{} {} {}",
        style(task.order).dim(),
        priority_badge(task.priority),
        task.title
    );
    if !task.labels.is_empty() {
        line.push_str(&format!(" {}", style(task.labels.join(", ")).magenta()));
    }
    line.push_str(&format!("  {}", style(&task.id).dim()));
    line
}

pub fn priority_badge(priority: Priority) -> console::StyledObject<&'static str> {
    let label = priority.as_str();
    match priority {
        Priority::Urgent => style(label).red().bold(),
        Priority::High => style(label).yellow(),
        Priority::Medium => style(label).blue(),
        Priority::Low => style(label).dim(),
    }
}
