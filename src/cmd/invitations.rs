//! Invitation commands: `taskboard invitations ...`.

use anyhow::{Context as _, Result};
use console::style;

use super::super::InvitationCommands;
use super::Context;

pub async fn cmd_invitations(ctx: &Context, command: Option<InvitationCommands>) -> Result<()> {
    let invitations = ctx.invitations();
    match command {
        None | Some(InvitationCommands::List) => {
            invitations
                .fetch_invitations()
                .await
                .context("Failed to load invitations")?;
            let state = invitations.state();
            println!();
            println!("{}", style("Invitations").bold().cyan());
            println!();
            if state.pending_count() == 0 {
                println!("No pending invitations.");
                println!();
                return Ok(());
            }
            for invitation in state.pending() {
                println!(
                    "  {}  {} invited you to {}",
                    style(&invitation.id).dim(),
                    invitation.invited_by.name,
                    style(&invitation.board.name).bold()
                );
            }
            println!();
            println!("Accept with 'taskboard invitations accept <id>'.");
        }
        Some(InvitationCommands::Accept { id }) => {
            let response = invitations
                .accept(&id)
                .await
                .context("Failed to accept invitation")?;
            println!("{}", response.message);
        }
        Some(InvitationCommands::Reject { id }) => {
            if !ctx.confirm(&format!("Decline invitation {}?", id)) {
                println!("Cancelled.");
                return Ok(());
            }
            let response = invitations
                .reject(&id)
                .await
                .context("Failed to decline invitation")?;
            println!("{}", response.message);
        }
    }
    Ok(())
}
