//! Output formatting for multiple formats
//!
//! Command definitions render as JSON or YAML in the camelCase shape stored
//! with an application, as human-readable text, or as a single bash script
//! ready to pipe into `ssh`.
//!
//! # Example
//!
//! ```
//! use neupcloud::cli::output::{OutputFormat, OutputFormatter};
//! use neupcloud::runtime::{CommandContext, NodeRuntime, RuntimeCommands};
//!
//! let ctx = CommandContext::new("shop", "/var/www/shop");
//! let definition = NodeRuntime::default().build(&ctx);
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_definitions(&[definition]).unwrap();
//! assert!(output.contains("\"mainCommand\""));
//! ```

use anyhow::{Context, Result};
use serde::Serialize;

use crate::command::{CommandDefinition, CommandStatus};
use crate::config::NeupConfig;
use crate::runtime::RuntimeId;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
    /// Phases concatenated into one bash script
    Script,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NginxOutput<'a> {
    domain: &'a str,
    config: &'a str,
    install_command: &'a CommandDefinition,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectionOutput<'a> {
    manifest: &'a str,
    runtime: RuntimeId,
    runtime_name: &'static str,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// One definition serializes as an object, several as an array
    pub fn format_definitions(&self, definitions: &[CommandDefinition]) -> Result<String> {
        match self.format {
            OutputFormat::Json => match definitions {
                [single] => serde_json::to_string_pretty(single),
                many => serde_json::to_string_pretty(many),
            }
            .context("Failed to serialize command definitions to JSON"),
            OutputFormat::Yaml => match definitions {
                [single] => serde_yaml::to_string(single),
                many => serde_yaml::to_string(many),
            }
            .context("Failed to serialize command definitions to YAML"),
            OutputFormat::Human => Ok(definitions
                .iter()
                .map(format_definition_human)
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Script => Ok(format_script(definitions)),
        }
    }

    /// Human and script formats print the bare server block
    pub fn format_nginx(
        &self,
        domain: &str,
        config: &str,
        install: &CommandDefinition,
    ) -> Result<String> {
        let output = NginxOutput {
            domain,
            config,
            install_command: install,
        };
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&output)
                .context("Failed to serialize nginx config to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(&output).context("Failed to serialize nginx config to YAML")
            }
            OutputFormat::Human | OutputFormat::Script => Ok(config.to_string()),
        }
    }

    pub fn format_detection(&self, manifest: &str, runtime: RuntimeId) -> Result<String> {
        let output = DetectionOutput {
            manifest,
            runtime,
            runtime_name: runtime.name(),
        };
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&output)
                .context("Failed to serialize detection to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(&output).context("Failed to serialize detection to YAML")
            }
            OutputFormat::Human => Ok(format!("{}: {}\n", manifest, runtime.name())),
            OutputFormat::Script => Ok(format!("{}\n", runtime_slug(runtime))),
        }
    }

    pub fn format_config(&self, config: &NeupConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let config_map = config.to_display_map();
                serde_json::to_string_pretty(&config_map)
                    .context("Failed to serialize config to JSON")
            }
            OutputFormat::Yaml => {
                let config_map = config.to_display_map();
                serde_yaml::to_string(&config_map).context("Failed to serialize config to YAML")
            }
            OutputFormat::Human | OutputFormat::Script => Ok(config.to_string()),
        }
    }
}

fn runtime_slug(runtime: RuntimeId) -> &'static str {
    match runtime {
        RuntimeId::Node => "node",
        RuntimeId::Python => "python",
        RuntimeId::Go => "go",
    }
}

fn format_definition_human(definition: &CommandDefinition) -> String {
    let mut output = String::new();

    if definition.kind().is_destructive() {
        output.push_str(&format!("\u{26A0} {}\n", definition.title()));
    } else {
        output.push_str(&format!("\u{2713} {}\n", definition.title()));
    }
    output.push_str(RULE);
    output.push_str("\n\n");

    output.push_str(&format!("{}\n\n", definition.description()));
    output.push_str(&format!("Type:    {}\n", definition.kind()));
    output.push_str(&format!(
        "Status:  {}\n",
        match definition.status() {
            CommandStatus::Published => "published",
            CommandStatus::Unpublished => "unpublished",
        }
    ));
    output.push_str(&format!("Icon:    {}\n", definition.icon()));

    for (phase, script) in definition.command().phases() {
        output.push_str(&format!("\n{}:\n", phase_label(phase)));
        for line in script.lines() {
            output.push_str(&format!("  {}\n", line));
        }
    }

    output
}

fn phase_label(phase: &str) -> &'static str {
    match phase {
        "pre" => "Pre-command",
        "post" => "Post-command",
        _ => "Command",
    }
}

fn format_script(definitions: &[CommandDefinition]) -> String {
    let mut output = String::from("#!/usr/bin/env bash\n");
    for definition in definitions {
        output.push_str(&format!("\n# {}\n", definition.title()));
        output.push_str(&definition.full_script());
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandKind, CommandScripts, Icon, Invocation, Script};

    fn sample() -> CommandDefinition {
        CommandDefinition::new(
            "Restart Application",
            "Restart the shop process",
            Icon::RotateCw,
            CommandKind::Normal,
            CommandScripts::main(
                &Script::strict().run(Invocation::new("pm2").args(["restart", "shop"])),
            )
            .with_post(&Script::new().run(Invocation::new("pm2").arg("save"))),
        )
    }

    #[test]
    fn test_json_single_definition_is_object() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_definitions(&[sample()])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["title"], "Restart Application");
        assert_eq!(value["type"], "normal");
        assert_eq!(value["icon"], "rotate-cw");
        assert_eq!(value["status"], "published");
        assert_eq!(value["command"]["postCommand"], "pm2 save");
        assert!(value["command"].get("preCommand").is_none());
    }

    #[test]
    fn test_json_many_definitions_is_array() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_definitions(&[sample(), sample()])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_yaml_definition() {
        let output = OutputFormatter::new(OutputFormat::Yaml)
            .format_definitions(&[sample()])
            .unwrap();
        assert!(output.contains("title: Restart Application"));
        assert!(output.contains("mainCommand:"));
    }

    #[test]
    fn test_human_definition() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_definitions(&[sample()])
            .unwrap();
        assert!(output.starts_with("\u{2713} Restart Application"));
        assert!(output.contains("Type:    normal"));
        assert!(output.contains("Icon:    rotate-cw"));
        assert!(output.contains("Command:\n  set -e\n  pm2 restart shop\n"));
        assert!(output.contains("Post-command:\n  pm2 save\n"));
    }

    #[test]
    fn test_script_has_shebang_and_phases_in_order() {
        let output = OutputFormatter::new(OutputFormat::Script)
            .format_definitions(&[sample()])
            .unwrap();
        assert!(output.starts_with("#!/usr/bin/env bash\n"));
        assert!(output.contains("# Restart Application\n"));
        assert!(output.find("pm2 restart shop").unwrap() < output.find("pm2 save").unwrap());
    }

    #[test]
    fn test_nginx_human_is_raw_config() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_nginx("example.com", "server {\n}\n", &sample())
            .unwrap();
        assert_eq!(output, "server {\n}\n");
    }

    #[test]
    fn test_nginx_json_shape() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_nginx("example.com", "server {\n}\n", &sample())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["domain"], "example.com");
        assert_eq!(value["installCommand"]["title"], "Restart Application");
    }

    #[test]
    fn test_detection_formats() {
        let human = OutputFormatter::new(OutputFormat::Human)
            .format_detection("go.mod", RuntimeId::Go)
            .unwrap();
        assert_eq!(human, "go.mod: Go\n");

        let json = OutputFormatter::new(OutputFormat::Json)
            .format_detection("package.json", RuntimeId::Node)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["runtime"], "node");
        assert_eq!(value["runtimeName"], "Node.js");
    }

    #[test]
    fn test_config_json() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_config(&NeupConfig::default())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(value.is_object());
    }
}
