use super::{
    report_error, CommandExecutor, CommandResult, CommandSender, RuntimeError, NAMESPACE,
};
use crate::chat::Chat;
use crate::host::{CommandHost, Host, HostError};
use crate::plugin::ActionContext;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{error, info};

pub const ADMIN_COMMAND: &str = "chatactions";
pub const ADMIN_PERMISSION: &str = "chatactions.admin";

const USAGE: &str = "<red>Usage: /chatactions [help|reload]";

/// Registers `/chatactions help|reload`.
pub fn register_admin_command<H: CommandHost + ?Sized>(
    host: &mut H,
    context: Rc<RefCell<ActionContext>>,
    chat: Chat,
) -> Result<(), HostError> {
    let executor: CommandExecutor = Rc::new(
        move |server: &mut dyn Host, sender: CommandSender, args: &[&str]| {
            if let Err(err) = execute(&context, &chat, server, sender, args) {
                report_error(&chat, server, sender, err);
            }
        },
    );
    host.register_command(NAMESPACE, ADMIN_COMMAND, &["ca".to_string()], executor)?;
    Ok(())
}

fn execute(
    context: &RefCell<ActionContext>,
    chat: &Chat,
    server: &mut dyn Host,
    sender: CommandSender,
    args: &[&str],
) -> CommandResult<()> {
    if let CommandSender::Player(player) = sender {
        if !server.has_permission(player, ADMIN_PERMISSION) {
            return Err(RuntimeError::PermissionDenied {
                message: "<red>You do not have permission to do that.".to_string(),
            }
            .into());
        }
    }

    let subcommand = args.first().map(|arg| arg.to_ascii_lowercase());
    match subcommand.as_deref() {
        None | Some("help") => {
            let lines = help_lines(&context.borrow());
            for line in lines {
                chat.reply(server, sender, &line);
            }
            Ok(())
        }
        Some("reload") => {
            let result = context.borrow_mut().reload(server);
            match result {
                Ok(count) => {
                    info!("Reloaded {} action(s)", count);
                    chat.reply(
                        server,
                        sender,
                        &format!("<green>Reloaded {} action(s).", count),
                    );
                }
                Err(err) => {
                    error!("Could not reload config: {:#}", anyhow::Error::from(err));
                    chat.reply(
                        server,
                        sender,
                        "<red>Could not reload the config, see the console for details.",
                    );
                }
            }
            Ok(())
        }
        Some(_) => Err(RuntimeError::Usage {
            message: USAGE.to_string(),
        }
        .into()),
    }
}

fn help_lines(context: &ActionContext) -> Vec<String> {
    let registry = context.registry();
    if registry.is_empty() {
        return vec!["<yellow>No actions are configured.".to_string()];
    }

    let mut lines = vec!["<gold>Available actions:".to_string()];
    for action in registry.iter() {
        let mut line = format!("<yellow> /{}", action.name());
        if !action.aliases().is_empty() {
            line.push_str(&format!(" (Aliases: {})", action.aliases().join(", ")));
        }
        if !action.help_message().is_empty() {
            line.push_str(&format!(" <gray>- {}", action.help_message()));
        }
        lines.push(line);
    }
    lines
}
