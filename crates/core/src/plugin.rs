use crate::actions::ActionRegistry;
use crate::chat::Chat;
use crate::commands::{register_admin_command, CommandDispatchBridge};
use crate::config::{ConfigError, ConfigStore};
use crate::host::Host;
use std::cell::{Ref, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{error, info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "plugins/ChatActions/config.yml";

/// Service id reported to the server's metrics collector.
pub const METRICS_SERVICE_ID: u32 = 21818;

/// State shared between the plugin and its admin command.
pub struct ActionContext {
    config: ConfigStore,
    registry: ActionRegistry,
    bridge: CommandDispatchBridge,
}

impl ActionContext {
    fn new(config: ConfigStore, bridge: CommandDispatchBridge) -> ActionContext {
        ActionContext {
            config,
            registry: ActionRegistry::default(),
            bridge,
        }
    }

    /// Builds the registry from the current config, registers its commands and resyncs clients.
    fn install<H: Host + ?Sized>(&mut self, host: &mut H) -> usize {
        self.registry = ActionRegistry::load_all(&self.config.root());
        let count = self.bridge.register_all(host, &self.registry);
        self.bridge.sync(host);
        count
    }

    /// Re-reads the config and replaces every action command.
    ///
    /// If the file can not be read the current actions stay registered.
    pub fn reload<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<usize, ConfigError> {
        self.config.reload()?;
        self.bridge.unregister_all(host);
        Ok(self.install(host))
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn bridge(&self) -> &CommandDispatchBridge {
        &self.bridge
    }
}

pub struct ChatActionsPlugin {
    config_path: PathBuf,
    chat: Chat,
    context: Option<Rc<RefCell<ActionContext>>>,
}

impl ChatActionsPlugin {
    pub fn new(config_path: impl Into<PathBuf>) -> ChatActionsPlugin {
        ChatActionsPlugin {
            config_path: config_path.into(),
            chat: Chat::new(),
            context: None,
        }
    }

    pub fn on_enable<H: Host + ?Sized>(&mut self, host: &mut H) {
        let bridge = CommandDispatchBridge::new(self.chat.clone());

        if let Err(err) = host.start_metrics(METRICS_SERVICE_ID) {
            warn!("Could not start metrics: {}", err);
        }

        let config = match ConfigStore::load(&self.config_path) {
            Ok(config) => config,
            Err(err) => {
                error!(
                    "Could not load config, continuing without actions: {:#}",
                    anyhow::Error::from(err)
                );
                ConfigStore::empty(&self.config_path)
            }
        };

        let context = Rc::new(RefCell::new(ActionContext::new(config, bridge)));
        if let Err(err) = register_admin_command(host, Rc::clone(&context), self.chat.clone()) {
            warn!("Could not register /chatactions: {}", err);
        }
        let count = context.borrow_mut().install(host);
        self.context = Some(context);

        self.chat.enable();
        info!("ChatActions enabled with {} action command(s)", count);
    }

    pub fn on_disable(&mut self) {
        self.chat.disable();
        info!("ChatActions disabled");
    }

    /// See [`ActionContext::reload`].
    pub fn reload<H: Host + ?Sized>(&self, host: &mut H) -> Result<usize, ConfigError> {
        match &self.context {
            Some(context) => context.borrow_mut().reload(host),
            None => Ok(0),
        }
    }

    pub fn context(&self) -> Option<Ref<'_, ActionContext>> {
        self.context.as_ref().map(|context| context.borrow())
    }

    pub fn chat(&self) -> &Chat {
        &self.chat
    }
}
