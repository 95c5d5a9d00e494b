use crate::commands::CommandExecutor;
use crate::host::HostError;
use indexmap::IndexMap;
use tracing::warn;

struct CommandEntry {
    /// `namespace:name` of the command this label belongs to.
    owner: String,
    executor: CommandExecutor,
}

/// Maps lowercase labels to executors.
#[derive(Default)]
pub struct CommandTable {
    labels: IndexMap<String, CommandEntry>,
}

impl CommandTable {
    pub fn register(
        &mut self,
        namespace: &str,
        name: &str,
        aliases: &[String],
        executor: CommandExecutor,
    ) -> Result<Vec<String>, HostError> {
        let owner = format!("{}:{}", namespace, name).to_lowercase();
        if self.labels.contains_key(&owner) {
            return Err(HostError::Rejected {
                label: owner,
                reason: "already registered".to_string(),
            });
        }

        let mut bound = vec![owner.clone()];
        self.labels.insert(
            owner.clone(),
            CommandEntry {
                owner: owner.clone(),
                executor: executor.clone(),
            },
        );
        for label in std::iter::once(name).chain(aliases.iter().map(String::as_str)) {
            let label = label.to_lowercase();
            if let Some(existing) = self.labels.get(&label) {
                if existing.owner != owner {
                    warn!(
                        "/{} is already taken by {}, use /{} instead",
                        label, existing.owner, owner
                    );
                }
                continue;
            }
            self.labels.insert(
                label.clone(),
                CommandEntry {
                    owner: owner.clone(),
                    executor: executor.clone(),
                },
            );
            bound.push(label);
        }
        Ok(bound)
    }

    /// Returns false if nothing was registered under `namespace:name`.
    pub fn unregister(&mut self, namespace: &str, name: &str) -> bool {
        let owner = format!("{}:{}", namespace, name).to_lowercase();
        let before = self.labels.len();
        self.labels.retain(|_, entry| entry.owner != owner);
        self.labels.len() != before
    }

    pub fn resolve(&self, label: &str) -> Option<&CommandExecutor> {
        self.labels
            .get(&label.to_lowercase())
            .map(|entry| &entry.executor)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandSender;
    use crate::host::Host;
    use std::rc::Rc;

    fn noop() -> CommandExecutor {
        Rc::new(|_: &mut dyn Host, _: CommandSender, _: &[&str]| {})
    }

    #[test]
    fn namespaced_label_is_always_bound() {
        let mut table = CommandTable::default();
        let bound = table
            .register("chatactions", "hug", &["Cuddle".to_string()], noop())
            .unwrap();
        assert_eq!(bound, ["chatactions:hug", "hug", "cuddle"]);

        let bound = table.register("other", "hug", &[], noop()).unwrap();
        assert_eq!(bound, ["other:hug"]);
        assert!(table.resolve("HUG").is_some());
        assert!(table.resolve("other:hug").is_some());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut table = CommandTable::default();
        table.register("chatactions", "hug", &[], noop()).unwrap();
        let err = table.register("chatactions", "HUG", &[], noop()).unwrap_err();
        assert!(matches!(err, HostError::Rejected { .. }));
    }

    #[test]
    fn unregister_removes_every_label() {
        let mut table = CommandTable::default();
        table
            .register("chatactions", "hug", &["cuddle".to_string()], noop())
            .unwrap();
        table.register("chatactions", "wave", &[], noop()).unwrap();
        assert!(table.unregister("chatactions", "hug"));
        assert!(!table.unregister("chatactions", "hug"));
        assert_eq!(
            table.labels().collect::<Vec<_>>(),
            ["chatactions:wave", "wave"]
        );
    }
}
