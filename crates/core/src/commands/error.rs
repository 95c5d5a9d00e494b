use crate::host::PlayerId;
use thiserror::Error;

const ERROR_PREFIX: &str = "<red><bold>Error</bold> <dark_gray>» <red>";

/// Mistakes made by whoever ran the command. These are shown to the sender and never logged as errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Only players can use that command!")]
    PlayerOnly,
    #[error("{message}")]
    PermissionDenied { message: String },
    #[error("{message}")]
    Usage { message: String },
    #[error("That player is not online!")]
    PlayerNotOnline,
    #[error("You cannot send that to yourself!")]
    CannotTargetSelf,
    #[error("{0}")]
    Message(String),
}

impl RuntimeError {
    /// The markup sent back to the sender.
    pub fn to_markup(&self) -> String {
        match self {
            RuntimeError::PlayerOnly => format!("<red>{}", self),
            // Configured messages are shown verbatim
            RuntimeError::PermissionDenied { message } | RuntimeError::Usage { message } => {
                message.clone()
            }
            RuntimeError::PlayerNotOnline
            | RuntimeError::CannotTargetSelf
            | RuntimeError::Message(_) => format!("{}{}", ERROR_PREFIX, self),
        }
    }
}

#[derive(Debug, Error)]
pub enum InternalError {
    #[error("Internal error: online player {player:?} has no name (server state bug)")]
    UnnamedPlayer { player: PlayerId },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_for_each_error() {
        assert_eq!(
            RuntimeError::PlayerOnly.to_markup(),
            "<red>Only players can use that command!"
        );
        assert_eq!(
            RuntimeError::PlayerNotOnline.to_markup(),
            "<red><bold>Error</bold> <dark_gray>» <red>That player is not online!"
        );
        assert_eq!(
            RuntimeError::CannotTargetSelf.to_markup(),
            "<red><bold>Error</bold> <dark_gray>» <red>You cannot send that to yourself!"
        );
        assert_eq!(
            RuntimeError::Usage {
                message: String::new()
            }
            .to_markup(),
            ""
        );
    }
}
