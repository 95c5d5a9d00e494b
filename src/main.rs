use anyhow::{Context, Result};
use chatactions_core::commands::CommandSender;
use chatactions_core::local::LocalServer;
use chatactions_core::plugin::{ChatActionsPlugin, DEFAULT_CONFIG_PATH};
use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Runs ChatActions on a local console server.
///
/// Each line on stdin is `<player> <command>`, for example `Steve /hug Alex`.
/// Use `console` as the player to run a command from the console.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Actions config, created with example actions if missing
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Adds an online player (repeatable)
    #[arg(long = "player", value_name = "NAME")]
    players: Vec<String>,
    /// Grants a permission node to a player (repeatable)
    #[arg(long = "grant", value_name = "NAME=NODE", value_parser = parse_grant)]
    grants: Vec<(String, String)>,
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn parse_grant(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, node)) if !name.is_empty() && !node.is_empty() => {
            Ok((name.to_string(), node.to_string()))
        }
        _ => Err(format!("expected NAME=NODE, got '{}'", arg)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let logfile = tracing_appender::rolling::daily(&args.log_dir, "chatactions.log");
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("CHATACTIONS_LOG")
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_writer(logfile.and(std::io::stdout))
        .with_env_filter(env_filter)
        .init();

    let mut server = LocalServer::new();
    for name in &args.players {
        server.join(name);
    }
    for (name, node) in &args.grants {
        match player_named(&server, name) {
            Some(player) => server.grant(player, node),
            None => warn!("Can not grant {} to {}, no such player", node, name),
        }
    }

    let mut plugin = ChatActionsPlugin::new(&args.config);
    plugin.on_enable(&mut server);

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        let Some((sender, command)) = line.split_once(char::is_whitespace) else {
            warn!("Expected `<player> <command>`");
            continue;
        };
        let sender = if sender.eq_ignore_ascii_case("console") {
            CommandSender::Console
        } else {
            match player_named(&server, sender) {
                Some(player) => CommandSender::Player(player),
                None => {
                    warn!("{} is not online", sender);
                    continue;
                }
            }
        };

        server.dispatch(sender, command);
        print_messages(&mut server);
    }

    plugin.on_disable();
    Ok(())
}

fn player_named(
    server: &LocalServer,
    name: &str,
) -> Option<chatactions_core::host::PlayerId> {
    server
        .players()
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .map(|p| p.id)
}

fn print_messages(server: &mut LocalServer) {
    let players: Vec<_> = server
        .players()
        .iter()
        .map(|p| (p.id, p.name.clone()))
        .collect();
    for (player, name) in players {
        for message in server.take_messages(player) {
            println!("[to {}] {}", name, message);
        }
    }
    for message in server.take_console_messages() {
        println!("[console] {}", message);
    }
}
