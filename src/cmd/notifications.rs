//! Notification commands: `taskboard notifications ...`.

use std::str::FromStr;

use anyhow::{Context as _, Result};
use console::style;
use taskboard::errors::GatewayError;
use taskboard::gateway::SessionEvent;
use taskboard::kanban::models::{Notification, NotificationFilters, NotificationType};
use taskboard::poller;
use tokio::sync::broadcast;

use super::super::NotificationCommands;
use super::Context;

pub async fn cmd_notifications(ctx: &Context, command: Option<NotificationCommands>) -> Result<()> {
    let notifications = ctx.notifications();
    match command {
        None => list(ctx, NotificationFilters::default()).await?,
        Some(NotificationCommands::List { unread, kind, page }) => {
            let kind = kind
                .map(|k| NotificationType::from_str(&k).map_err(anyhow::Error::msg))
                .transpose()?;
            let filters = NotificationFilters {
                kind,
                is_read: unread.then_some(false),
                page: Some(page),
                limit: None,
            };
            list(ctx, filters).await?;
        }
        Some(NotificationCommands::Unread) => {
            let count = notifications
                .fetch_unread_count()
                .await
                .context("Failed to load unread count")?;
            println!("{}", count);
        }
        Some(NotificationCommands::Read { id }) => {
            notifications
                .mark_as_read(&id)
                .await
                .context("Failed to mark notification as read")?;
            println!("Marked {} as read", id);
        }
        Some(NotificationCommands::ReadAll) => {
            notifications
                .mark_all_as_read()
                .await
                .context("Failed to mark notifications as read")?;
            println!("All notifications marked as read");
        }
        Some(NotificationCommands::Delete { id }) => {
            if !ctx.confirm(&format!("Delete notification {}?", id)) {
                println!("Deletion cancelled.");
                return Ok(());
            }
            notifications
                .delete_notification(&id)
                .await
                .context("Failed to delete notification")?;
            println!("Deleted notification {}", id);
        }
        Some(NotificationCommands::Watch) => watch(ctx).await?,
    }
    Ok(())
}

async fn list(ctx: &Context, filters: NotificationFilters) -> Result<()> {
    let notifications = ctx.notifications();
    notifications
        .fetch_notifications(filters)
        .await
        .context("Failed to load notifications")?;
    let state = notifications.state();

    println!();
    println!("{}", style("Notifications").bold().cyan());
    println!();
    if state.notifications.is_empty() {
        println!("Nothing here.");
        println!();
        return Ok(());
    }
    for notification in &state.notifications {
        println!("{}", notification_line(notification));
    }
    println!();
    if state.has_more {
        println!(
            "More on page {}: taskboard notifications list --page {}",
            state.current_page + 1,
            state.current_page + 1
        );
    }
    Ok(())
}

fn notification_line(n: &Notification) -> String {
    let marker = if n.is_read {
        style("  ").dim()
    } else {
        style("● ").cyan().bold()
    };
    format!(
        "{}{}  {}  {}\n    {}",
        marker,
        style(n.created_at.format("%Y-%m-%d %H:%M")).dim(),
        style(&n.title).bold(),
        style(&n.id).dim(),
        n.message
    )
}

/// Poll until Ctrl+C or until the session expires, printing changes.
async fn watch(ctx: &Context) -> Result<()> {
    let notifications = ctx.notifications();
    let invitations = ctx.invitations();
    let mut unread_rx = notifications.subscribe();
    let mut invitations_rx = invitations.subscribe();
    let mut session = ctx.gateway.subscribe();

    println!(
        "Watching every {}s. Press Ctrl+C to stop.",
        ctx.config.poll_interval.as_secs()
    );
    let handle = poller::spawn(notifications, invitations, ctx.config.poll_interval);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last_unread = None;
    let mut last_pending = None;
    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            event = session.recv() => match event {
                Ok(SessionEvent::Expired) => {
                    break Err(anyhow::Error::new(GatewayError::SessionExpired));
                }
                Err(broadcast::error::RecvError::Closed) => break Ok(()),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
            },
            changed = unread_rx.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let count = unread_rx.borrow_and_update().unread_count;
                if last_unread != Some(count) {
                    println!("{} unread notification(s)", style(count).bold());
                    last_unread = Some(count);
                }
            }
            changed = invitations_rx.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = invitations_rx.borrow_and_update().clone();
                if state.loading {
                    continue;
                }
                let pending = state.pending_count();
                if last_pending != Some(pending) {
                    println!("{} pending invitation(s)", style(pending).bold());
                    last_pending = Some(pending);
                }
            }
        }
    };
    handle.shutdown().await;
    outcome
}
