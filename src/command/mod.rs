//! Command definitions
//!
//! A [`CommandDefinition`] is one user-triggerable action: display metadata
//! plus a three-phase script. Definitions are built by the runtime, git and
//! other generators at request time and are never mutated afterwards.

pub mod script;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use script::{Arg, Invocation, Script, Step};

/// Publish state of a command in the dashboard catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    #[default]
    Published,
    Unpublished,
}

/// How the dashboard should treat a command before running it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    #[default]
    Normal,
    /// Discards state on the server; the UI asks for confirmation
    Destructive,
    Success,
}

impl CommandKind {
    pub fn is_destructive(&self) -> bool {
        matches!(self, CommandKind::Destructive)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Normal => "normal",
            CommandKind::Destructive => "destructive",
            CommandKind::Success => "success",
        };
        f.write_str(name)
    }
}

/// Closed set of icons a generated command can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    Hammer,
    Play,
    Square,
    RotateCw,
    GitBranch,
    Download,
    GitPullRequest,
    AlertTriangle,
    History,
    Server,
}

impl Icon {
    pub fn name(&self) -> &'static str {
        match self {
            Icon::Hammer => "hammer",
            Icon::Play => "play",
            Icon::Square => "square",
            Icon::RotateCw => "rotate-cw",
            Icon::GitBranch => "git-branch",
            Icon::Download => "download",
            Icon::GitPullRequest => "git-pull-request",
            Icon::AlertTriangle => "alert-triangle",
            Icon::History => "history",
            Icon::Server => "server",
        }
    }

    pub fn all_variants() -> &'static [Icon] {
        &[
            Icon::Hammer,
            Icon::Play,
            Icon::Square,
            Icon::RotateCw,
            Icon::GitBranch,
            Icon::Download,
            Icon::GitPullRequest,
            Icon::AlertTriangle,
            Icon::History,
            Icon::Server,
        ]
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Icon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Icon::all_variants()
            .iter()
            .copied()
            .find(|icon| icon.name() == s)
            .ok_or_else(|| format!("Unknown icon: {}", s))
    }
}

/// The pre/main/post scripts of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandScripts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_command: Option<String>,
    pub main_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_command: Option<String>,
}

impl CommandScripts {
    pub fn main(script: &Script) -> Self {
        Self {
            pre_command: None,
            main_command: script.render(),
            post_command: None,
        }
    }

    pub fn with_pre(mut self, script: &Script) -> Self {
        self.pre_command = Some(script.render()).filter(|s| !s.is_empty());
        self
    }

    pub fn with_post(mut self, script: &Script) -> Self {
        self.post_command = Some(script.render()).filter(|s| !s.is_empty());
        self
    }

    /// Phases in execution order, skipping absent ones
    pub fn phases(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("pre", self.pre_command.as_deref()),
            ("main", Some(self.main_command.as_str())),
            ("post", self.post_command.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, script)| script.map(|s| (name, s)))
    }
}

/// A named action and the script that performs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    title: String,
    description: String,
    icon: Icon,
    status: CommandStatus,
    #[serde(rename = "type")]
    kind: CommandKind,
    command: CommandScripts,
}

impl CommandDefinition {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        icon: Icon,
        kind: CommandKind,
        command: CommandScripts,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            icon,
            status: CommandStatus::Published,
            kind,
            command,
        }
    }

    pub fn unpublished(mut self) -> Self {
        self.status = CommandStatus::Unpublished;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn icon(&self) -> Icon {
        self.icon
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn command(&self) -> &CommandScripts {
        &self.command
    }

    pub fn main_command(&self) -> &str {
        &self.command.main_command
    }

    /// All phases joined into one script, in execution order
    pub fn full_script(&self) -> String {
        self.command
            .phases()
            .map(|(_, script)| script)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CommandDefinition {
        let scripts = CommandScripts::main(&Script::new().run(Invocation::new("pm2").arg("list")))
            .with_post(&Script::new().run(Invocation::new("pm2").arg("save")));
        CommandDefinition::new(
            "List",
            "List processes",
            Icon::Server,
            CommandKind::Normal,
            scripts,
        )
    }

    #[test]
    fn test_serializes_with_dashboard_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["type"], "normal");
        assert_eq!(value["status"], "published");
        assert_eq!(value["icon"], "server");
        assert_eq!(value["command"]["mainCommand"], "pm2 list");
        assert_eq!(value["command"]["postCommand"], "pm2 save");
        assert!(value["command"].get("preCommand").is_none());
    }

    #[test]
    fn test_deserializes_stored_record() {
        let json = r#"{
            "title": "Reset",
            "description": "Hard reset",
            "icon": "history",
            "status": "unpublished",
            "type": "destructive",
            "command": { "mainCommand": "git reset --hard" }
        }"#;
        let def: CommandDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.icon(), Icon::History);
        assert_eq!(def.status(), CommandStatus::Unpublished);
        assert!(def.kind().is_destructive());
        assert!(def.command().pre_command.is_none());
    }

    #[test]
    fn test_icon_names_round_trip_through_from_str() {
        for icon in Icon::all_variants() {
            assert_eq!(icon.name().parse::<Icon>().unwrap(), *icon);
            let serialized = serde_json::to_string(icon).unwrap();
            assert_eq!(serialized, format!("\"{}\"", icon.name()));
        }
        assert!("spaceship".parse::<Icon>().is_err());
    }

    #[test]
    fn test_full_script_orders_phases() {
        let def = sample();
        assert_eq!(def.full_script(), "pm2 list\npm2 save");
        let phases: Vec<_> = def.command().phases().map(|(name, _)| name).collect();
        assert_eq!(phases, vec!["main", "post"]);
    }

    #[test]
    fn test_empty_phase_scripts_are_dropped() {
        let scripts = CommandScripts::main(&Script::new().run(Invocation::new("true")))
            .with_pre(&Script::new());
        assert!(scripts.pre_command.is_none());
    }

    #[test]
    fn test_unpublished() {
        assert_eq!(sample().unpublished().status(), CommandStatus::Unpublished);
    }
}
