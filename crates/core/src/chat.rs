use crate::commands::CommandSender;
use crate::host::{PlayerId, Server};
use chatactions_text::TextComponent;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// The messaging subsystem.
///
/// Turns markup into text components and hands them to the server. Clones share
/// the same enabled flag, so every registered command stops sending once the
/// plugin disables chat.
#[derive(Clone, Default)]
pub struct Chat {
    enabled: Rc<Cell<bool>>,
}

impl Chat {
    pub fn new() -> Chat {
        Chat::default()
    }

    pub fn enable(&self) {
        self.enabled.set(true);
    }

    pub fn disable(&self) {
        self.enabled.set(false);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn render(markup: &str) -> TextComponent {
        TextComponent::join(TextComponent::parse(markup))
    }

    pub fn send<S: Server + ?Sized>(&self, server: &mut S, player: PlayerId, markup: &str) {
        if !self.is_enabled() {
            debug!("Chat is disabled, dropping message for {:?}", player);
            return;
        }
        server.send_message(player, Chat::render(markup));
    }

    /// Sends to whoever ran a command, which may be the console.
    pub fn reply<S: Server + ?Sized>(&self, server: &mut S, sender: CommandSender, markup: &str) {
        match sender {
            CommandSender::Player(player) => self.send(server, player, markup),
            CommandSender::Console => {
                if self.is_enabled() {
                    server.send_console_message(Chat::render(markup));
                }
            }
        }
    }

    /// Sends to every online player not listed in `except`.
    pub fn broadcast<S: Server + ?Sized>(&self, server: &mut S, markup: &str, except: &[PlayerId]) {
        for viewer in server.online_players() {
            if except.contains(&viewer) {
                continue;
            }
            self.send(server, viewer, markup);
        }
    }
}
