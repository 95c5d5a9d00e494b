mod admin;
mod bridge;
mod error;

pub use admin::{register_admin_command, ADMIN_COMMAND, ADMIN_PERMISSION};
pub use bridge::CommandDispatchBridge;
pub use error::{CommandError, CommandResult, InternalError, RuntimeError};

use crate::chat::Chat;
use crate::host::{Host, PlayerId, Server};
use std::rc::Rc;
use tracing::error;

/// Fallback namespace. Every plugin command is reachable as `chatactions:<name>`.
pub const NAMESPACE: &str = "chatactions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSender {
    Player(PlayerId),
    Console,
}

/// Runs one invocation. Receives the arguments after the command label.
///
/// Executors always consume the invocation; there is no fallback handler.
pub type CommandExecutor = Rc<dyn Fn(&mut dyn Host, CommandSender, &[&str])>;

/// Shows runtime errors to the sender and logs internal ones.
pub(crate) fn report_error<S: Server + ?Sized>(
    chat: &Chat,
    server: &mut S,
    sender: CommandSender,
    err: CommandError,
) {
    match err {
        CommandError::Runtime(err) => chat.reply(server, sender, &err.to_markup()),
        CommandError::Internal(err) => {
            error!("{}", err);
            let message = RuntimeError::Message("Something went wrong.".to_string());
            chat.reply(server, sender, &message.to_markup());
        }
    }
}
