//! A small in-process server.
//!
//! Holds a list of connected players and a command table, and records every
//! message it delivers. The binary drives it from stdin and the tests use it to
//! observe exactly who received what.

mod command_table;

pub use command_table::CommandTable;

use crate::commands::{CommandExecutor, CommandSender};
use crate::host::{CommandHost, HostError, PlayerId, Server};
use crate::permissions::PermissionSet;
use chatactions_text::{ColorCode, TextComponent, TextComponentBuilder};
use tracing::{debug, info};

pub struct LocalPlayer {
    pub id: PlayerId,
    pub name: String,
    permissions: PermissionSet,
    inbox: Vec<TextComponent>,
}

pub struct LocalServer {
    players: Vec<LocalPlayer>,
    next_id: u32,
    commands: CommandTable,
    console: Vec<TextComponent>,
    metrics_service: Option<u32>,
    command_syncs: usize,
    dynamic_commands: bool,
}

impl Default for LocalServer {
    fn default() -> Self {
        LocalServer::new()
    }
}

impl LocalServer {
    pub fn new() -> LocalServer {
        LocalServer {
            players: Vec::new(),
            next_id: 0,
            commands: CommandTable::default(),
            console: Vec::new(),
            metrics_service: None,
            command_syncs: 0,
            dynamic_commands: true,
        }
    }

    /// A server whose command table can not be changed at runtime.
    pub fn without_dynamic_commands() -> LocalServer {
        LocalServer {
            dynamic_commands: false,
            ..LocalServer::new()
        }
    }

    pub fn join(&mut self, name: &str) -> PlayerId {
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        self.players.push(LocalPlayer {
            id,
            name: name.to_string(),
            permissions: PermissionSet::default(),
            inbox: Vec::new(),
        });
        info!("{} joined the game", name);
        id
    }

    pub fn leave(&mut self, player: PlayerId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.id != player);
        self.players.len() != before
    }

    pub fn grant(&mut self, player: PlayerId, node: &str) {
        if let Some(player) = self.player_mut(player) {
            player.permissions.insert(node);
        }
    }

    pub fn player(&self, player: PlayerId) -> Option<&LocalPlayer> {
        self.players.iter().find(|p| p.id == player)
    }

    fn player_mut(&mut self, player: PlayerId) -> Option<&mut LocalPlayer> {
        self.players.iter_mut().find(|p| p.id == player)
    }

    /// Plain text of every message `player` received so far.
    pub fn messages(&self, player: PlayerId) -> Vec<String> {
        self.player(player)
            .map(|p| p.inbox.iter().map(TextComponent::plain_text).collect())
            .unwrap_or_default()
    }

    pub fn take_messages(&mut self, player: PlayerId) -> Vec<String> {
        self.player_mut(player)
            .map(|p| {
                p.inbox
                    .drain(..)
                    .map(|message| message.plain_text())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn take_console_messages(&mut self) -> Vec<String> {
        self.console
            .drain(..)
            .map(|message| message.plain_text())
            .collect()
    }

    pub fn players(&self) -> &[LocalPlayer] {
        &self.players
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// How many times the command list was resent to clients.
    pub fn command_syncs(&self) -> usize {
        self.command_syncs
    }

    pub fn metrics_service(&self) -> Option<u32> {
        self.metrics_service
    }

    /// Runs a command line such as `/hug Steve`. Returns false if no command matched.
    pub fn dispatch(&mut self, sender: CommandSender, command_line: &str) -> bool {
        let command_line = command_line.trim();
        let command_line = command_line.strip_prefix('/').unwrap_or(command_line);
        let mut parts = command_line.split_whitespace();
        let Some(label) = parts.next() else {
            return false;
        };
        let args: Vec<&str> = parts.collect();

        let Some(executor) = self.commands.resolve(label).cloned() else {
            let message = TextComponentBuilder::new("Unknown command.".to_string())
                .color_code(ColorCode::Red)
                .finish();
            match sender {
                CommandSender::Player(player) => self.send_message(player, message),
                CommandSender::Console => self.send_console_message(message),
            }
            return false;
        };

        debug!("{:?} issued /{}", sender, command_line);
        executor(self, sender, &args);
        true
    }
}

impl Server for LocalServer {
    fn online_players(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Exact (case insensitive) names win. Otherwise the shortest name starting with `name`.
    fn find_player(&self, name: &str) -> Option<PlayerId> {
        let lower = name.to_lowercase();
        if let Some(player) = self.players.iter().find(|p| p.name.to_lowercase() == lower) {
            return Some(player.id);
        }
        self.players
            .iter()
            .filter(|p| p.name.to_lowercase().starts_with(&lower))
            .min_by_key(|p| p.name.len().saturating_sub(lower.len()))
            .map(|p| p.id)
    }

    fn player_name(&self, player: PlayerId) -> Option<&str> {
        self.player(player).map(|p| p.name.as_str())
    }

    fn has_permission(&self, player: PlayerId, node: &str) -> bool {
        self.player(player).is_some_and(|p| p.permissions.has(node))
    }

    fn send_message(&mut self, player: PlayerId, message: TextComponent) {
        if let Some(player) = self.player_mut(player) {
            player.inbox.push(message);
        }
    }

    fn send_console_message(&mut self, message: TextComponent) {
        self.console.push(message);
    }

    fn start_metrics(&mut self, service_id: u32) -> Result<(), HostError> {
        info!("Metrics started for service {}", service_id);
        self.metrics_service = Some(service_id);
        Ok(())
    }
}

impl CommandHost for LocalServer {
    fn register_command(
        &mut self,
        namespace: &str,
        name: &str,
        aliases: &[String],
        executor: CommandExecutor,
    ) -> Result<Vec<String>, HostError> {
        if !self.dynamic_commands {
            return Err(HostError::Unavailable);
        }
        self.commands.register(namespace, name, aliases, executor)
    }

    fn unregister_command(&mut self, namespace: &str, name: &str) -> Result<(), HostError> {
        if !self.dynamic_commands {
            return Err(HostError::Unavailable);
        }
        self.commands.unregister(namespace, name);
        Ok(())
    }

    fn sync_commands(&mut self) -> Result<(), HostError> {
        if !self.dynamic_commands {
            return Err(HostError::Unavailable);
        }
        self.command_syncs += 1;
        debug!("Sent command list to {} player(s)", self.players.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_player_prefers_exact_then_shortest_prefix() {
        let mut server = LocalServer::new();
        let steve = server.join("Steve");
        let stevenson = server.join("Stevenson");
        let alex = server.join("Alex");

        assert_eq!(server.find_player("steve"), Some(steve));
        assert_eq!(server.find_player("STEVEN"), Some(stevenson));
        assert_eq!(server.find_player("ste"), Some(steve));
        assert_eq!(server.find_player("al"), Some(alex));
        assert_eq!(server.find_player("bob"), None);
    }

    #[test]
    fn messages_to_players_who_left_are_dropped() {
        let mut server = LocalServer::new();
        let alex = server.join("Alex");
        assert!(server.leave(alex));
        server.send_message(alex, TextComponent::from("hello"));
        assert!(server.messages(alex).is_empty());
        assert!(server.online_players().is_empty());
    }

    #[test]
    fn unknown_commands_are_reported() {
        let mut server = LocalServer::new();
        let alex = server.join("Alex");
        assert!(!server.dispatch(CommandSender::Player(alex), "/nope"));
        assert_eq!(server.take_messages(alex), ["Unknown command."]);
        assert!(!server.dispatch(CommandSender::Console, "   "));
    }
}
