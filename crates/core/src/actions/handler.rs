//! Runs an action command.
//!
//! Each invocation is checked in order: the caller must be a player, must hold
//! the action's permission, and must name a target. The target is then either
//! `all` (for actions that allow it) or another online player.

use super::ActionDefinition;
use crate::chat::Chat;
use crate::commands::{CommandResult, CommandSender, InternalError, RuntimeError};
use crate::host::{PlayerId, Server};
use tracing::debug;

/// Keyword that sends an action to everyone when the action does not require a target.
pub const ALL_TARGET: &str = "all";

pub fn invoke<S: Server + ?Sized>(
    action: &ActionDefinition,
    chat: &Chat,
    server: &mut S,
    sender: CommandSender,
    args: &[&str],
) -> CommandResult<()> {
    let CommandSender::Player(player) = sender else {
        return Err(RuntimeError::PlayerOnly.into());
    };

    if !action.can_use(|node| server.has_permission(player, node)) {
        return Err(RuntimeError::PermissionDenied {
            message: action.permission_message().to_string(),
        }
        .into());
    }

    let Some(&argument) = args.first() else {
        return Err(RuntimeError::Usage {
            message: action.usage_message().to_string(),
        }
        .into());
    };

    let sender_name = name_of(server, player)?;

    if !action.requires_target() && argument.eq_ignore_ascii_case(ALL_TARGET) {
        let message = action.render_no_target_message(&sender_name);
        if !message.is_empty() {
            chat.broadcast(server, &message, &[]);
        }
        debug!("{} used {} on everyone", sender_name, action.name());
        return Ok(());
    }

    let target = server
        .find_player(argument)
        .ok_or(RuntimeError::PlayerNotOnline)?;
    if target == player {
        return Err(RuntimeError::CannotTargetSelf.into());
    }
    let target_name = name_of(server, target)?;

    let message = action.render_sender_message(&sender_name, &target_name);
    if !message.is_empty() {
        chat.send(server, player, &message);
    }
    let message = action.render_target_message(&sender_name, &target_name);
    if !message.is_empty() {
        chat.send(server, target, &message);
    }
    if !action.global_message().is_empty() {
        let message = action.render_global_message(&sender_name, &target_name);
        chat.broadcast(server, &message, &[player, target]);
    }

    debug!("{} used {} on {}", sender_name, action.name(), target_name);
    Ok(())
}

fn name_of<S: Server + ?Sized>(server: &S, player: PlayerId) -> CommandResult<String> {
    server
        .player_name(player)
        .map(str::to_owned)
        .ok_or_else(|| InternalError::UnnamedPlayer { player }.into())
}
