//! Runtime command generators
//!
//! Each runtime turns a [`CommandContext`] into Build / Start / Stop / Restart
//! definitions. Node.js and Python run under pm2; Go binaries run under a
//! generated supervisord program.

use crate::command::CommandDefinition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application record fields the runtime generators read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandContext {
    pub app_name: String,
    pub app_location: String,
    #[serde(default)]
    pub preferred_ports: Vec<u16>,
    #[serde(default)]
    pub entry_file: Option<String>,
}

impl CommandContext {
    pub fn new(app_name: impl Into<String>, app_location: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_location: app_location.into(),
            ..Default::default()
        }
    }

    pub fn with_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.preferred_ports = ports.into_iter().collect();
        self
    }

    pub fn with_entry_file(mut self, entry_file: impl Into<String>) -> Self {
        self.entry_file = Some(entry_file.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeId {
    Node,
    Python,
    Go,
}

impl RuntimeId {
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeId::Node => "Node.js",
            RuntimeId::Python => "Python",
            RuntimeId::Go => "Go",
        }
    }

    pub fn all_variants() -> &'static [RuntimeId] {
        &[RuntimeId::Node, RuntimeId::Python, RuntimeId::Go]
    }
}

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle action a runtime generator can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Build,
    Start,
    Stop,
    Restart,
}

impl Action {
    pub fn all_variants() -> &'static [Action] {
        &[Action::Build, Action::Start, Action::Stop, Action::Restart]
    }
}

/// Manifest file that identifies a runtime
#[derive(Debug, Clone)]
pub struct ManifestPattern {
    pub filename: &'static str,
    pub priority: u8,
}

/// Command generator for one runtime
pub trait RuntimeCommands: Send + Sync {
    fn id(&self) -> RuntimeId;

    /// Manifest file names (e.g., "package.json", "go.mod")
    fn manifest_patterns(&self) -> &[ManifestPattern];

    fn build(&self, ctx: &CommandContext) -> CommandDefinition;

    fn start(&self, ctx: &CommandContext) -> CommandDefinition;

    fn stop(&self, ctx: &CommandContext) -> CommandDefinition;

    fn restart(&self, ctx: &CommandContext) -> CommandDefinition;

    fn generate(&self, action: Action, ctx: &CommandContext) -> CommandDefinition {
        match action {
            Action::Build => self.build(ctx),
            Action::Start => self.start(ctx),
            Action::Stop => self.stop(ctx),
            Action::Restart => self.restart(ctx),
        }
    }

    /// Build, Start, Stop and Restart, in that order
    fn all(&self, ctx: &CommandContext) -> Vec<CommandDefinition> {
        Action::all_variants()
            .iter()
            .map(|action| self.generate(*action, ctx))
            .collect()
    }
}

pub mod go;
pub mod node;
pub mod pm2;
pub mod port_finder;
pub mod python;
pub mod registry;

pub use go::GoRuntime;
pub use node::NodeRuntime;
pub use python::PythonRuntime;
pub use registry::RuntimeRegistry;
