//! Column commands: `taskboard column ...`.

use std::str::FromStr;

use anyhow::{Context as _, Result, bail};
use taskboard::kanban::models::{ColumnType, CreateColumnInput, UpdateColumnInput};

use super::super::ColumnCommands;
use super::Context;

pub async fn cmd_column(ctx: &Context, command: ColumnCommands) -> Result<()> {
    let columns = ctx.columns();
    match command {
        ColumnCommands::Add {
            board,
            name,
            kind,
            color,
            limit,
        } => {
            let kind = ColumnType::from_str(&kind).map_err(anyhow::Error::msg)?;
            ctx.open_board(&board).await?;
            let column = columns
                .add_column(CreateColumnInput {
                    name,
                    kind,
                    color,
                    limit,
                })
                .await
                .context("Failed to add column")?;
            println!("Added column '{}' ({})", column.name, column.id);
        }
        ColumnCommands::Rename {
            board,
            column,
            name,
            color,
            limit,
        } => {
            if name.is_none() && color.is_none() && limit.is_none() {
                bail!("Nothing to change: pass a new name, --color or --limit");
            }
            ctx.open_board(&board).await?;
            let updated = columns
                .update_column(
                    &column,
                    UpdateColumnInput {
                        name,
                        kind: None,
                        color,
                        limit,
                    },
                )
                .await
                .context("Failed to update column")?;
            println!("Updated column '{}'", updated.name);
        }
        ColumnCommands::Delete { board, column } => {
            if !ctx.confirm(&format!("Delete column {} and every task in it?", column)) {
                println!("Deletion cancelled.");
                return Ok(());
            }
            ctx.open_board(&board).await?;
            columns
                .delete_column(&column)
                .await
                .context("Failed to delete column")?;
            println!("Deleted column {}", column);
        }
        ColumnCommands::Move {
            board,
            column,
            index,
        } => {
            ctx.open_board(&board).await?;
            match columns
                .reorder_column(&column, index)
                .await
                .context("Failed to move column")?
            {
                Some(_) => println!("Moved column {} to position {}", column, index),
                None => println!("Column {} is already at position {}", column, index),
            }
        }
    }
    Ok(())
}
