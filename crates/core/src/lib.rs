#![deny(rust_2018_idioms)]

pub mod actions;
pub mod chat;
pub mod commands;
pub mod config;
pub mod host;
pub mod local;
mod permissions;
pub mod plugin;
