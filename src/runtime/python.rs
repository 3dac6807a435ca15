//! Python runtime (venv + pip + pm2)

use super::{pm2, CommandContext, ManifestPattern, RuntimeCommands, RuntimeId};
use crate::command::{
    Arg, CommandDefinition, CommandKind, CommandScripts, Icon, Invocation, Script, Step,
};
use crate::config::ScriptSettings;
use tracing::debug;

const MANIFESTS: &[ManifestPattern] = &[
    ManifestPattern {
        filename: "requirements.txt",
        priority: 10,
    },
    ManifestPattern {
        filename: "pyproject.toml",
        priority: 12,
    },
    ManifestPattern {
        filename: "Pipfile",
        priority: 14,
    },
];

const DEFAULT_ENTRY_FILE: &str = "main.py";
const VENV_DIR: &str = "venv";

#[derive(Debug, Clone, Default)]
pub struct PythonRuntime {
    settings: ScriptSettings,
}

impl PythonRuntime {
    pub fn new(settings: ScriptSettings) -> Self {
        Self { settings }
    }
}

fn venv_python(ctx: &CommandContext) -> String {
    format!(
        "{}/{}/bin/python",
        ctx.app_location.trim_end_matches('/'),
        VENV_DIR
    )
}

impl RuntimeCommands for PythonRuntime {
    fn id(&self) -> RuntimeId {
        RuntimeId::Python
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        MANIFESTS
    }

    fn build(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, "Generating Python build command");

        let pip = format!("{}/bin/pip", VENV_DIR);
        let main = Script::strict()
            .step(Step::cd(ctx.app_location.as_str()))
            .step(Step::when(
                Invocation::new("test").args(["-d", VENV_DIR]).negated(),
                vec![Invocation::new("python3").args(["-m", "venv", VENV_DIR])],
            ))
            .run(Invocation::new(pip.as_str()).args(["install", "--upgrade", "pip"]))
            .step(Step::when(
                Invocation::new("test").args(["-f", "requirements.txt"]),
                vec![Invocation::new(pip.as_str()).args(["install", "-r", "requirements.txt"])],
            ));

        CommandDefinition::new(
            "Build",
            "Create the virtualenv and install requirements",
            Icon::Hammer,
            CommandKind::Normal,
            CommandScripts::main(&main),
        )
    }

    fn start(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, ports = ?ctx.preferred_ports, "Generating Python start command");

        let entry = ctx.entry_file.as_deref().unwrap_or(DEFAULT_ENTRY_FILE);
        let venv = venv_python(ctx);
        // Interpreter falls back to the system python3 when the venv was never built.
        let pick_interpreter = Step::when_else(
            Invocation::new("test").args(["-x", venv.as_str()]),
            vec![Invocation::new("export").arg(Arg::Concat(vec![
                Arg::lit("PY_INTERPRETER="),
                Arg::lit(venv.as_str()),
            ]))],
            vec![Invocation::new("export").arg("PY_INTERPRETER=python3")],
        );
        let launch = pm2::start_invocation(ctx, entry)
            .arg("--interpreter")
            .arg(Arg::var("PY_INTERPRETER"));
        let main = pm2::start_script(ctx, &self.settings, vec![pick_interpreter], launch);

        CommandDefinition::new(
            "Start",
            "Start the Python application with pm2",
            Icon::Play,
            CommandKind::Success,
            CommandScripts::main(&main)
                .with_pre(&pm2::ensure_pm2())
                .with_post(&pm2::save()),
        )
    }

    fn stop(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, "Generating Python stop command");
        pm2::stop_definition(ctx, RuntimeId::Python.name())
    }

    fn restart(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, "Generating Python restart command");
        pm2::restart_definition(ctx, RuntimeId::Python.name())
    }
}
