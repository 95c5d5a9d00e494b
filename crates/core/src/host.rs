//! The surface a game server exposes to the plugin.
//!
//! A server implements [`Server`] for player lookup and message delivery, and
//! [`CommandHost`] for adding commands to its live command table. Anything
//! implementing both is a [`Host`].

use crate::commands::CommandExecutor;
use chatactions_text::TextComponent;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

#[derive(Debug, Error)]
pub enum HostError {
    #[error("the server does not support dynamic command registration")]
    Unavailable,
    #[error("the server rejected command '{label}': {reason}")]
    Rejected { label: String, reason: String },
}

pub trait Server {
    /// All players currently connected, in join order.
    fn online_players(&self) -> Vec<PlayerId>;

    /// Resolves a name typed by a player to an online player.
    fn find_player(&self, name: &str) -> Option<PlayerId>;

    /// The display name of an online player.
    fn player_name(&self, player: PlayerId) -> Option<&str>;

    fn has_permission(&self, player: PlayerId, node: &str) -> bool;

    /// Delivers a chat message. Sending to a player who already left is a no-op.
    fn send_message(&mut self, player: PlayerId, message: TextComponent);

    fn send_console_message(&mut self, message: TextComponent);

    fn start_metrics(&mut self, _service_id: u32) -> Result<(), HostError> {
        Ok(())
    }
}

pub trait CommandHost {
    /// Adds a command to the live command table.
    ///
    /// `namespace:name` is always bound. The plain name and each alias are only
    /// bound if free. Returns the labels that were bound.
    fn register_command(
        &mut self,
        namespace: &str,
        name: &str,
        aliases: &[String],
        executor: CommandExecutor,
    ) -> Result<Vec<String>, HostError>;

    /// Removes every label owned by `namespace:name`.
    fn unregister_command(&mut self, namespace: &str, name: &str) -> Result<(), HostError>;

    /// Resends the command list to every connected client so autocomplete is current.
    fn sync_commands(&mut self) -> Result<(), HostError>;
}

pub trait Host: Server + CommandHost {}

impl<T: Server + CommandHost + ?Sized> Host for T {}
