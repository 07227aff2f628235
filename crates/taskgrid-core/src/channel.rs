//! Channel bindings between tasks.
//!
//! A class exposes inbound channels; every realized task gets a port per
//! inbound channel. At configuration time the bound endpoints of all tasks in
//! an environment are gathered into a [`BindMap`] so that outbound channels
//! can be pointed at them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Configuration key/value pairs pushed to a task.
pub type PropertyMap = BTreeMap<String, String>;

/// `"<role path>:<channel name>"` → reachable endpoint.
pub type BindMap = BTreeMap<String, Endpoint>;

/// Build the [`BindMap`] key for a channel exposed by the task at `role_path`.
pub fn bind_key(role_path: &str, channel: &str) -> String {
    format!("{role_path}:{channel}")
}

/// Messaging pattern of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    #[default]
    Push,
    Pull,
    Pub,
    Sub,
    Req,
    Rep,
    Pair,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Push => "push",
            ChannelType::Pull => "pull",
            ChannelType::Pub => "pub",
            ChannelType::Sub => "sub",
            ChannelType::Req => "req",
            ChannelType::Rep => "rep",
            ChannelType::Pair => "pair",
        }
    }
}

/// Message transport used by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Default,
    Zeromq,
    Shmem,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Default => "default",
            Transport::Zeromq => "zeromq",
            Transport::Shmem => "shmem",
        }
    }
}

/// A channel a task listens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbound {
    pub name: String,
    #[serde(rename = "type", default)]
    pub channel_type: ChannelType,
    #[serde(default)]
    pub transport: Transport,
}

/// A channel a task connects out of.
///
/// `target` is either a literal `tcp://host:port` address or a [`BindMap`]
/// key naming another task's inbound channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    pub name: String,
    #[serde(rename = "type", default)]
    pub channel_type: ChannelType,
    pub target: String,
}

/// A reachable network endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u64,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tcp://{}:{}", self.host, self.port)
    }
}
