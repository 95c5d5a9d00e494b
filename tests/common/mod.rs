use chatactions_core::host::PlayerId;
use chatactions_core::local::LocalServer;
use chatactions_core::plugin::ChatActionsPlugin;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const HUG_CONFIG: &str = r#"
actions:
  hug:
    aliases: [cuddle]
    require-target: true
    messages:
      sender-message: "You hugged %target%"
      target-message: "%sender% hugged you"
      usage-message: "<red>Usage: /hug <player>"
  wave:
    require-target: false
    required-permission: chatactions.wave
    messages:
      sender-message: "You waved at %target%"
      target-message: "%sender% waved at you"
      global-message: "%sender% waved at %target%"
      no-target-message: "%sender% waves at everyone"
      permission-message: "<red>No waving for you."
"#;

/// A local server with the plugin enabled on a config written to a temporary directory.
pub struct TestServer {
    pub server: LocalServer,
    pub plugin: ChatActionsPlugin,
    config_path: PathBuf,
    _dir: TempDir,
}

impl TestServer {
    pub fn new(config: &str, players: &[&str]) -> TestServer {
        TestServer::with_server(LocalServer::new(), config, players)
    }

    pub fn with_server(mut server: LocalServer, config: &str, players: &[&str]) -> TestServer {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("ChatActions").join("config.yml");
        fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        fs::write(&config_path, config).unwrap();

        for name in players {
            server.join(name);
        }
        let mut plugin = ChatActionsPlugin::new(&config_path);
        plugin.on_enable(&mut server);

        TestServer {
            server,
            plugin,
            config_path,
            _dir: dir,
        }
    }

    pub fn player(&self, name: &str) -> PlayerId {
        self.server
            .players()
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id)
            .unwrap_or_else(|| panic!("{} is not online", name))
    }

    pub fn rewrite_config(&self, config: &str) {
        fs::write(&self.config_path, config).unwrap();
    }

    /// Drains and returns the messages `name` received.
    pub fn take(&mut self, name: &str) -> Vec<String> {
        let player = self.player(name);
        self.server.take_messages(player)
    }
}
