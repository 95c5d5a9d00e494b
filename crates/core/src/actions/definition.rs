use crate::config::{ConfigError, Section};
use thiserror::Error;
use tracing::warn;

const SENDER_PLACEHOLDER: &str = "%sender%";
const TARGET_PLACEHOLDER: &str = "%target%";

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action '{name}' is not a configuration section")]
    NotASection { name: String },
    #[error("'{name}' can not be used as a command name")]
    InvalidName { name: String },
    #[error("action '{name}' is misconfigured")]
    Config {
        name: String,
        #[source]
        source: ConfigError,
    },
}

/// One configured action. Never changes after it is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDefinition {
    name: String,
    aliases: Vec<String>,
    sender_message: String,
    target_message: String,
    global_message: String,
    no_target_message: String,
    permission_message: String,
    help_message: String,
    usage_message: String,
    range: i32,
    require_target: bool,
    required_permission: String,
}

impl ActionDefinition {
    /// Parses an action from its section. Unset keys take their defaults: empty
    /// messages, no aliases, a range of `-1`, and a required target.
    pub fn from_section(name: &str, config: &Section<'_>) -> Result<ActionDefinition, ActionError> {
        if !is_valid_command_name(name) {
            return Err(ActionError::InvalidName {
                name: name.to_string(),
            });
        }
        let wrap = |source| ActionError::Config {
            name: name.to_string(),
            source,
        };
        let message = |key: &str| config.get_string_or(&format!("messages.{key}"), "");

        let mut aliases: Vec<String> = Vec::new();
        for alias in config.get_string_list("aliases").map_err(wrap)?.unwrap_or_default() {
            let alias = alias.trim();
            if alias.is_empty() || alias == name || aliases.iter().any(|a| a == alias) {
                continue;
            }
            if !is_valid_command_name(alias) {
                warn!(
                    "Ignoring alias '{}' of action '{}', it can not be a command name",
                    alias, name
                );
                continue;
            }
            aliases.push(alias.to_string());
        }

        Ok(ActionDefinition {
            name: name.to_string(),
            aliases,
            sender_message: message("sender-message").map_err(wrap)?,
            target_message: message("target-message").map_err(wrap)?,
            global_message: message("global-message").map_err(wrap)?,
            no_target_message: message("no-target-message").map_err(wrap)?,
            permission_message: message("permission-message").map_err(wrap)?,
            help_message: message("help-message").map_err(wrap)?,
            usage_message: message("usage-message").map_err(wrap)?,
            range: config.get_int_or("range", -1).map_err(wrap)?,
            require_target: config.get_bool_or("require-target", true).map_err(wrap)?,
            required_permission: config
                .get_string_or("required-permission", "")
                .map_err(wrap)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn sender_message(&self) -> &str {
        &self.sender_message
    }

    pub fn target_message(&self) -> &str {
        &self.target_message
    }

    pub fn global_message(&self) -> &str {
        &self.global_message
    }

    pub fn no_target_message(&self) -> &str {
        &self.no_target_message
    }

    pub fn permission_message(&self) -> &str {
        &self.permission_message
    }

    pub fn help_message(&self) -> &str {
        &self.help_message
    }

    pub fn usage_message(&self) -> &str {
        &self.usage_message
    }

    /// Range in blocks, `-1` if global. Not enforced yet.
    pub fn range(&self) -> i32 {
        self.range
    }

    /// When false the action can also be sent to `all`.
    pub fn requires_target(&self) -> bool {
        self.require_target
    }

    pub fn required_permission(&self) -> &str {
        &self.required_permission
    }

    /// Actions without a required permission can be used by everyone.
    pub fn can_use(&self, has_permission: impl FnOnce(&str) -> bool) -> bool {
        self.required_permission.is_empty() || has_permission(&self.required_permission)
    }

    pub fn render_sender_message(&self, sender: &str, target: &str) -> String {
        render(&self.sender_message, sender, Some(target))
    }

    pub fn render_target_message(&self, sender: &str, target: &str) -> String {
        render(&self.target_message, sender, Some(target))
    }

    pub fn render_global_message(&self, sender: &str, target: &str) -> String {
        render(&self.global_message, sender, Some(target))
    }

    /// Only `%sender%` is replaced, there is no target.
    pub fn render_no_target_message(&self, sender: &str) -> String {
        render(&self.no_target_message, sender, None)
    }
}

fn is_valid_command_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c.is_whitespace() || c == ':' || c == '/')
}

/// Replaces placeholders in a single pass. Substituted names are never scanned again.
fn render(template: &str, sender: &str, target: Option<&str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix(SENDER_PLACEHOLDER) {
            out.push_str(sender);
            rest = after;
        } else if let (Some(target), Some(after)) = (target, tail.strip_prefix(TARGET_PLACEHOLDER))
        {
            out.push_str(target);
            rest = after;
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;

    fn parse(yaml: &str) -> Result<ActionDefinition, ActionError> {
        let config = ConfigStore::parse("config.yml", yaml).unwrap();
        let root = config.root();
        let section = root.section("actions.test").unwrap();
        ActionDefinition::from_section("test", &section)
    }

    #[test]
    fn empty_section_uses_defaults() {
        let action = parse("actions:\n  test: {}\n").unwrap();
        assert_eq!(action.name(), "test");
        assert!(action.aliases().is_empty());
        assert_eq!(action.sender_message(), "");
        assert_eq!(action.target_message(), "");
        assert_eq!(action.global_message(), "");
        assert_eq!(action.no_target_message(), "");
        assert_eq!(action.permission_message(), "");
        assert_eq!(action.help_message(), "");
        assert_eq!(action.usage_message(), "");
        assert_eq!(action.range(), -1);
        assert!(action.requires_target());
        assert_eq!(action.required_permission(), "");
        assert!(action.can_use(|_| false));
    }

    #[test]
    fn every_field_is_read() {
        let action = parse(
            r#"
actions:
  test:
    aliases: [t, tst, t, test]
    range: 12
    require-target: false
    required-permission: chatactions.test
    messages:
      sender-message: s
      target-message: t
      global-message: g
      no-target-message: n
      permission-message: p
      help-message: h
      usage-message: u
"#,
        )
        .unwrap();
        assert_eq!(action.aliases(), ["t", "tst"]);
        assert_eq!(action.range(), 12);
        assert!(!action.requires_target());
        assert_eq!(action.required_permission(), "chatactions.test");
        assert_eq!(
            [
                action.sender_message(),
                action.target_message(),
                action.global_message(),
                action.no_target_message(),
                action.permission_message(),
                action.help_message(),
                action.usage_message(),
            ],
            ["s", "t", "g", "n", "p", "h", "u"]
        );
        assert!(!action.can_use(|_| false));
        assert!(action.can_use(|node| node == "chatactions.test"));
    }

    #[test]
    fn wrong_types_are_errors() {
        let err = parse("actions:\n  test:\n    require-target: maybe\n").unwrap_err();
        assert!(matches!(err, ActionError::Config { .. }));

    }

    #[test]
    fn invalid_aliases_are_dropped() {
        let action =
            parse("actions:\n  test:\n    aliases: [\"two words\", ok, \"a:b\"]\n").unwrap();
        assert_eq!(action.aliases(), ["ok"]);
    }

    #[test]
    fn render_replaces_every_placeholder() {
        assert_eq!(
            render("%target% <- %sender% -> %target% %sender%", "A", Some("B")),
            "B <- A -> B A"
        );
        assert_eq!(render("no placeholders 100%", "A", Some("B")), "no placeholders 100%");
        assert_eq!(render("", "A", Some("B")), "");
    }

    #[test]
    fn render_is_not_recursive() {
        assert_eq!(render("%sender% hi", "%target%", Some("B")), "%target% hi");
        assert_eq!(render("%sender% and %target%", "A", None), "A and %target%");
    }
}
