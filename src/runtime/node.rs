//! Node.js runtime (npm + pm2)

use super::{pm2, CommandContext, ManifestPattern, RuntimeCommands, RuntimeId};
use crate::command::{CommandDefinition, CommandKind, CommandScripts, Icon, Invocation, Script, Step};
use crate::config::ScriptSettings;
use tracing::debug;

const MANIFESTS: &[ManifestPattern] = &[
    ManifestPattern {
        filename: "package.json",
        priority: 10,
    },
    ManifestPattern {
        filename: "package-lock.json",
        priority: 12,
    },
];

#[derive(Debug, Clone, Default)]
pub struct NodeRuntime {
    settings: ScriptSettings,
}

impl NodeRuntime {
    pub fn new(settings: ScriptSettings) -> Self {
        Self { settings }
    }
}

impl RuntimeCommands for NodeRuntime {
    fn id(&self) -> RuntimeId {
        RuntimeId::Node
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        MANIFESTS
    }

    fn build(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, "Generating Node.js build command");

        // Matches `"build":` inside the scripts table of package.json.
        let has_build_script = Invocation::new("grep")
            .args(["-Eq", "\"build\"[[:space:]]*:", "package.json"])
            .silenced();

        let main = Script::strict()
            .step(Step::cd(ctx.app_location.as_str()))
            .run(Invocation::new("npm").arg("install"))
            .step(Step::when(
                has_build_script,
                vec![Invocation::new("npm").args(["run", "build"])],
            ));

        CommandDefinition::new(
            "Build",
            "Install dependencies and run the build script if package.json declares one",
            Icon::Hammer,
            CommandKind::Normal,
            CommandScripts::main(&main),
        )
    }

    fn start(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, ports = ?ctx.preferred_ports, "Generating Node.js start command");

        let launch = match ctx.entry_file.as_deref() {
            Some(entry) => pm2::start_invocation(ctx, entry),
            None => pm2::start_invocation(ctx, "npm").args(["--", "start"]),
        };
        let main = pm2::start_script(ctx, &self.settings, vec![], launch);

        CommandDefinition::new(
            "Start",
            "Start the Node.js application with pm2",
            Icon::Play,
            CommandKind::Success,
            CommandScripts::main(&main)
                .with_pre(&pm2::ensure_pm2())
                .with_post(&pm2::save()),
        )
    }

    fn stop(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, "Generating Node.js stop command");
        pm2::stop_definition(ctx, RuntimeId::Node.name())
    }

    fn restart(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, "Generating Node.js restart command");
        pm2::restart_definition(ctx, RuntimeId::Node.name())
    }
}
