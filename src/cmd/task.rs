//! Task commands: `taskboard task ...`.

use std::str::FromStr;

use anyhow::{Context as _, Result, anyhow};
use console::style;
use taskboard::kanban::models::{
    CreateTaskInput, MoveTaskInput, Priority, Task, TaskStatus, UpdateTaskInput,
};
use taskboard::kanban::reorder::{self, DropTarget};

use super::super::TaskCommands;
use super::Context;
use super::board::priority_badge;

fn parse_priority(raw: Option<String>) -> Result<Option<Priority>> {
    raw.map(|p| Priority::from_str(&p.to_lowercase()).map_err(anyhow::Error::msg))
        .transpose()
}

fn parse_status(raw: Option<String>) -> Result<Option<TaskStatus>> {
    raw.map(|s| TaskStatus::from_str(&s.to_lowercase()).map_err(anyhow::Error::msg))
        .transpose()
}

pub async fn cmd_task(ctx: &Context, command: TaskCommands) -> Result<()> {
    let tasks = ctx.tasks();
    match command {
        TaskCommands::Create {
            board,
            column,
            title,
            description,
            priority,
            labels,
        } => {
            let input = CreateTaskInput {
                title,
                description,
                priority: parse_priority(priority)?,
                labels,
                ..Default::default()
            };
            ctx.open_board(&board).await?;
            let task = tasks
                .create_task(&column, input)
                .await
                .context("Failed to create task")?;
            println!("Created task '{}' ({})", task.title, style(&task.id).dim());
        }
        TaskCommands::Show { board, task } => {
            ctx.open_board(&board).await?;
            let task = tasks
                .fetch_task_details(&task)
                .await
                .context("Failed to load task")?;
            print_task(&task);
        }
        TaskCommands::Update {
            board,
            task,
            title,
            description,
            priority,
            status,
        } => {
            let input = UpdateTaskInput {
                title,
                description,
                priority: parse_priority(priority)?,
                status: parse_status(status)?,
                ..Default::default()
            };
            ctx.open_board(&board).await?;
            let updated = tasks
                .update_task(&task, input)
                .await
                .context("Failed to update task")?;
            println!("Updated task '{}'", updated.title);
        }
        TaskCommands::Delete { board, task } => {
            if !ctx.confirm(&format!("Delete task {}?", task)) {
                println!("Deletion cancelled.");
                return Ok(());
            }
            ctx.open_board(&board).await?;
            tasks
                .delete_task(&task)
                .await
                .context("Failed to delete task")?;
            println!("Deleted task {}", task);
        }
        TaskCommands::Move {
            board,
            task,
            column,
            index,
        } => {
            let loaded = ctx.open_board(&board).await?;
            let target = loaded
                .column(&column)
                .ok_or_else(|| anyhow!("Column {} is not on board {}", column, board))?;
            let order = index.unwrap_or_else(|| {
                reorder::resolve_task_target_index(target, DropTarget::Column(&column))
            });
            let moved = tasks
                .move_task(
                    &task,
                    MoveTaskInput {
                        target_column_id: column.clone(),
                        order,
                    },
                )
                .await
                .context("Failed to move task")?;
            match moved {
                Some(_) => println!("Moved task {} to {} at position {}", task, target.name, order),
                None => println!("Task {} is already there", task),
            }
        }
        TaskCommands::Comment {
            board,
            task,
            content,
        } => {
            ctx.open_board(&board).await?;
            let updated = tasks
                .add_comment(&task, &content)
                .await
                .context("Failed to add comment")?;
            println!("Commented on '{}' ({} comments)", updated.title, updated.comments.len());
        }
        TaskCommands::Assign { board, task, user } => {
            ctx.open_board(&board).await?;
            tasks
                .assign_user(&task, &user)
                .await
                .context("Failed to assign user")?;
            println!("Assigned {} to {}", user, task);
        }
        TaskCommands::Unassign { board, task, user } => {
            ctx.open_board(&board).await?;
            tasks
                .unassign_user(&task, &user)
                .await
                .context("Failed to unassign user")?;
            println!("Unassigned {} from {}", user, task);
        }
    }
    Ok(())
}

fn print_task(task: &Task) {
    println!();
    println!("{} {}", style(&task.title).bold(), priority_badge(task.priority));
    println!("{}", style(&task.id).dim());
    if let Some(status) = task.status {
        println!("Status:    {:?}", status);
    }
    if let Some(due) = task.due_date {
        println!("Due:       {}", due.format("%Y-%m-%d"));
    }
    if !task.labels.is_empty() {
        println!("Labels:    {}", task.labels.join(", "));
    }
    if !task.assignees.is_empty() {
        let names: Vec<_> = task.assignees.iter().map(|a| a.name.as_str()).collect();
        println!("Assignees: {}", names.join(", "));
    }
    if let Some(description) = &task.description {
        println!();
        println!("{}", description);
    }
    if !task.comments.is_empty() {
        println!();
        println!("{}", style("Comments").bold());
        for comment in &task.comments {
            println!(
                "  {} {}",
                style(comment.created_at.format("%Y-%m-%d %H:%M")).dim(),
                comment.content
            );
        }
    }
    println!();
}
