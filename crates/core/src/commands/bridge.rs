use super::{report_error, CommandExecutor, CommandSender, NAMESPACE};
use crate::actions::{handler, ActionDefinition, ActionRegistry};
use crate::chat::Chat;
use crate::host::{CommandHost, Host, HostError};
use std::rc::Rc;
use tracing::{debug, error, warn};

/// Installs action commands into the server's command table.
pub struct CommandDispatchBridge {
    chat: Chat,
    registered: Vec<String>,
}

impl CommandDispatchBridge {
    pub fn new(chat: Chat) -> CommandDispatchBridge {
        CommandDispatchBridge {
            chat,
            registered: Vec::new(),
        }
    }

    /// Names of the actions whose commands are currently installed.
    pub fn registered(&self) -> &[String] {
        &self.registered
    }

    pub fn register<H: CommandHost + ?Sized>(
        &mut self,
        host: &mut H,
        action: Rc<ActionDefinition>,
    ) -> Result<(), HostError> {
        let name = action.name().to_string();
        let aliases = action.aliases().to_vec();
        let chat = self.chat.clone();
        let executor: CommandExecutor = Rc::new(
            move |server: &mut dyn Host, sender: CommandSender, args: &[&str]| {
                if let Err(err) = handler::invoke(&action, &chat, server, sender, args) {
                    report_error(&chat, server, sender, err);
                }
            },
        );

        let labels = host.register_command(NAMESPACE, &name, &aliases, executor)?;
        debug!("Registered /{} as {}", name, labels.join(", "));
        self.registered.push(name);
        Ok(())
    }

    /// Registers a command for every action and returns how many were installed.
    ///
    /// If the server can not register commands at all, nothing stays registered.
    pub fn register_all<H: CommandHost + ?Sized>(
        &mut self,
        host: &mut H,
        registry: &ActionRegistry,
    ) -> usize {
        for action in registry.iter() {
            match self.register(host, Rc::clone(action)) {
                Ok(()) => {}
                Err(HostError::Unavailable) => {
                    error!(
                        "Could not register action commands: {}. No actions will be usable.",
                        HostError::Unavailable
                    );
                    self.unregister_all(host);
                    return 0;
                }
                Err(err) => warn!("Could not register /{}: {}", action.name(), err),
            }
        }
        self.registered.len()
    }

    pub fn unregister_all<H: CommandHost + ?Sized>(&mut self, host: &mut H) {
        for name in self.registered.drain(..) {
            if let Err(err) = host.unregister_command(NAMESPACE, &name) {
                warn!("Could not unregister /{}: {}", name, err);
            }
        }
    }

    /// Refreshes the command list clients use for autocomplete.
    pub fn sync<H: CommandHost + ?Sized>(&self, host: &mut H) {
        if let Err(err) = host.sync_commands() {
            warn!("Could not resend the command list to players: {}", err);
        }
    }
}
