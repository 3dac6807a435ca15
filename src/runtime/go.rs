//! Go runtime (go modules + supervisord)

use super::port_finder::{port_finder_step, PORT_VAR};
use super::{CommandContext, ManifestPattern, RuntimeCommands, RuntimeId};
use crate::command::{
    Arg, CommandDefinition, CommandKind, CommandScripts, Icon, Invocation, Script, Step,
};
use crate::config::ScriptSettings;
use tracing::debug;

const MANIFESTS: &[ManifestPattern] = &[ManifestPattern {
    filename: "go.mod",
    priority: 10,
}];

const LOG_DIR: &str = "/var/log";

#[derive(Debug, Clone, Default)]
pub struct GoRuntime {
    settings: ScriptSettings,
}

impl GoRuntime {
    pub fn new(settings: ScriptSettings) -> Self {
        Self { settings }
    }

    /// Path of the supervisord program file for an app
    pub fn program_file(&self, ctx: &CommandContext) -> String {
        format!(
            "{}/{}.conf",
            self.settings.supervisor_conf_dir.trim_end_matches('/'),
            ctx.app_name
        )
    }
}

fn supervisorctl() -> Invocation {
    Invocation::new("sudo").arg("supervisorctl")
}

fn binary_path(ctx: &CommandContext) -> String {
    format!("{}/{}", ctx.app_location.trim_end_matches('/'), ctx.app_name)
}

fn line(key: &str, value: &str) -> Arg {
    Arg::Concat(vec![Arg::lit(format!("{}=", key)), Arg::lit(value)])
}

/// Lines of the `[program:<appName>]` section
fn program_lines(ctx: &CommandContext, with_port: bool) -> Vec<Arg> {
    let mut lines = vec![
        Arg::Concat(vec![
            Arg::lit("[program:"),
            Arg::lit(ctx.app_name.as_str()),
            Arg::lit("]"),
        ]),
        line("command", &binary_path(ctx)),
        line("directory", &ctx.app_location),
    ];
    if with_port {
        lines.push(Arg::Concat(vec![
            Arg::lit("environment=PORT=\""),
            Arg::var(PORT_VAR),
            Arg::lit("\""),
        ]));
    }
    lines.extend([
        line("autostart", "true"),
        line("autorestart", "true"),
        line(
            "stderr_logfile",
            &format!("{}/{}.err.log", LOG_DIR, ctx.app_name),
        ),
        line(
            "stdout_logfile",
            &format!("{}/{}.out.log", LOG_DIR, ctx.app_name),
        ),
    ]);
    lines
}

impl RuntimeCommands for GoRuntime {
    fn id(&self) -> RuntimeId {
        RuntimeId::Go
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        MANIFESTS
    }

    fn build(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, "Generating Go build command");

        let package = ctx.entry_file.as_deref().unwrap_or(".");
        let main = Script::strict()
            .step(Step::cd(ctx.app_location.as_str()))
            .run(Invocation::new("go").args(["mod", "download"]))
            .step(Step::when_else(
                Invocation::new("grep").args(["-Eqs", "^build:", "Makefile"]),
                vec![Invocation::new("make").arg("build")],
                vec![Invocation::new("go")
                    .args(["build", "-o"])
                    .arg(ctx.app_name.as_str())
                    .arg(package)],
            ));

        CommandDefinition::new(
            "Build",
            "Download modules and build the binary (make build when the Makefile has a build target)",
            Icon::Hammer,
            CommandKind::Normal,
            CommandScripts::main(&main),
        )
    }

    fn start(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, ports = ?ctx.preferred_ports, "Generating Go start command");

        let mut main = Script::strict().step(Step::cd(ctx.app_location.as_str()));
        let port_step = port_finder_step(&ctx.preferred_ports, &self.settings);
        let with_port = port_step.is_some();
        if let Some(step) = port_step {
            main = main.step(step);
        }
        let main = main
            .step(Step::WriteFile {
                path: self.program_file(ctx),
                lines: program_lines(ctx, with_port),
                sudo: true,
            })
            .run(supervisorctl().arg("reread"))
            .run(supervisorctl().arg("update").arg(ctx.app_name.as_str()))
            .step(Step::Snippet(format!(
                "{} || {}",
                supervisorctl().arg("start").arg(ctx.app_name.as_str()).render(),
                supervisorctl().arg("status").arg(ctx.app_name.as_str()).render()
            )));

        let pre = Script::new().step(Step::when(
            Invocation::new("command")
                .args(["-v", "supervisorctl"])
                .silenced()
                .negated(),
            vec![
                Invocation::new("sudo").args(["apt-get", "update"]),
                Invocation::new("sudo").args(["apt-get", "install", "-y", "supervisor"]),
            ],
        ));

        CommandDefinition::new(
            "Start",
            "Register the Go binary with supervisord and start it",
            Icon::Play,
            CommandKind::Success,
            CommandScripts::main(&main).with_pre(&pre),
        )
    }

    fn stop(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, "Generating Go stop command");

        let main = Script::strict()
            .run(supervisorctl().arg("stop").arg(ctx.app_name.as_str()).or_true())
            .run(
                Invocation::new("sudo")
                    .args(["rm", "-f"])
                    .arg(self.program_file(ctx)),
            )
            .run(supervisorctl().arg("reread"))
            .run(supervisorctl().arg("update"));

        CommandDefinition::new(
            "Stop",
            "Stop the Go application and remove its supervisord program",
            Icon::Square,
            CommandKind::Normal,
            CommandScripts::main(&main),
        )
    }

    fn restart(&self, ctx: &CommandContext) -> CommandDefinition {
        debug!(app = %ctx.app_name, "Generating Go restart command");

        let main = Script::new().run(supervisorctl().arg("restart").arg(ctx.app_name.as_str()));

        CommandDefinition::new(
            "Restart",
            "Restart the Go application through supervisord",
            Icon::RotateCw,
            CommandKind::Normal,
            CommandScripts::main(&main),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CommandContext {
        CommandContext::new("gateway", "/srv/gateway")
    }

    #[test]
    fn test_build_prefers_makefile_target() {
        let main = GoRuntime::default().build(&ctx()).main_command().to_string();
        assert!(main.contains("go mod download"));
        assert!(main.contains("then\n  make build\nelse\n  go build -o gateway .\nfi"));
    }

    #[test]
    fn test_build_uses_entry_package() {
        let def = GoRuntime::default().build(&ctx().with_entry_file("./cmd/gateway"));
        assert!(def.main_command().contains("go build -o gateway ./cmd/gateway"));
    }

    #[test]
    fn test_start_writes_program_file() {
        let def = GoRuntime::default().start(&ctx());
        let main = def.main_command();
        assert!(main.contains("sudo tee /etc/supervisor/conf.d/gateway.conf >/dev/null"));
        assert!(main.contains("/srv/gateway/gateway"));
        assert!(main.contains("sudo supervisorctl update gateway"));
        assert!(!main.contains("environment=PORT"));
    }

    #[test]
    fn test_start_starts_program_after_update() {
        let main = GoRuntime::default().start(&ctx()).main_command().to_string();
        let reread = main.find("sudo supervisorctl reread").unwrap();
        let update = main.find("sudo supervisorctl update gateway").unwrap();
        let start = main.find("sudo supervisorctl start gateway").unwrap();
        assert!(reread < update);
        assert!(update < start);
        // Already running counts as started; anything else fails the script.
        assert!(main.ends_with("sudo supervisorctl start gateway || sudo supervisorctl status gateway"));
    }

    #[test]
    fn test_start_with_ports_sets_environment() {
        let def = GoRuntime::default().start(&ctx().with_ports([9000]));
        let main = def.main_command();
        let snippet = main.find("for candidate in 9000").unwrap();
        let config = main.find("environment=PORT=").unwrap();
        assert!(snippet < config);
        assert!(main.contains("\"$PORT\""));
    }

    #[test]
    fn test_program_file_honours_conf_dir() {
        let runtime = GoRuntime::new(ScriptSettings {
            supervisor_conf_dir: "/etc/supervisord.d/".to_string(),
            ..Default::default()
        });
        assert_eq!(runtime.program_file(&ctx()), "/etc/supervisord.d/gateway.conf");
    }

    #[test]
    fn test_stop_removes_program() {
        let main = GoRuntime::default().stop(&ctx()).main_command().to_string();
        assert!(main.contains("sudo supervisorctl stop gateway || true"));
        assert!(main.contains("sudo rm -f /etc/supervisor/conf.d/gateway.conf"));
        assert!(main.ends_with("sudo supervisorctl update"));
    }

    #[test]
    fn test_restart() {
        assert_eq!(
            GoRuntime::default().restart(&ctx()).main_command(),
            "sudo supervisorctl restart gateway"
        );
    }
}
