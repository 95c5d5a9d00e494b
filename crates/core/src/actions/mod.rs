mod definition;
pub mod handler;

pub use definition::{ActionDefinition, ActionError};

use crate::config::Section;
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::{info, warn};

/// Top level config key holding one section per action.
pub const ROOT_KEY: &str = "actions";

/// Every action from one config load, in config order.
///
/// There is no way to change a single entry. Reloading builds a new registry.
#[derive(Default)]
pub struct ActionRegistry {
    actions: IndexMap<String, Rc<ActionDefinition>>,
}

impl ActionRegistry {
    /// Parses every entry under [`ROOT_KEY`]. Broken entries are logged and skipped.
    pub fn load_all(root: &Section<'_>) -> ActionRegistry {
        let Some(actions) = root.section(ROOT_KEY) else {
            info!("No actions are configured");
            return ActionRegistry::default();
        };

        let mut registry = ActionRegistry::default();
        for (name, section) in actions.children() {
            let parsed = match section {
                Some(section) => ActionDefinition::from_section(&name, &section),
                None => Err(ActionError::NotASection { name }),
            };
            match parsed {
                Ok(action) => registry.insert(action),
                Err(err) => warn!("Skipping action: {:#}", anyhow::Error::from(err)),
            }
        }
        info!("Loaded {} action(s)", registry.len());
        registry
    }

    /// Keys such as `1` and `"1"` name the same action, the later one wins.
    fn insert(&mut self, action: ActionDefinition) {
        let name = action.name().to_string();
        if self.actions.insert(name.clone(), Rc::new(action)).is_some() {
            warn!("Action '{}' is defined more than once, keeping the last one", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rc<ActionDefinition>> {
        self.actions.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<ActionDefinition>> {
        self.actions.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
