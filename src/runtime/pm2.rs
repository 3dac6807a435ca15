//! pm2 helpers shared by the Node.js and Python runtimes

use super::port_finder::{port_finder_step, PORT_VAR};
use super::CommandContext;
use crate::command::{
    Arg, CommandDefinition, CommandKind, CommandScripts, Icon, Invocation, Script, Step,
};
use crate::config::ScriptSettings;

fn pm2() -> Invocation {
    Invocation::new("pm2")
}

/// Installs pm2 globally when it is not on PATH
pub(super) fn ensure_pm2() -> Script {
    Script::new().step(Step::when(
        Invocation::new("command")
            .args(["-v", "pm2"])
            .silenced()
            .negated(),
        vec![Invocation::new("npm").args(["install", "-g", "pm2"])],
    ))
}

pub(super) fn save() -> Script {
    Script::new().run(pm2().arg("save"))
}

/// Start script: `cd`, optional port selection, `setup`, then `launch`
///
/// `PORT` is passed to the launched process only when a port was selected.
pub(super) fn start_script(
    ctx: &CommandContext,
    settings: &ScriptSettings,
    setup: Vec<Step>,
    launch: Invocation,
) -> Script {
    let mut script = Script::strict().step(Step::cd(ctx.app_location.as_str()));
    let launch = match port_finder_step(&ctx.preferred_ports, settings) {
        Some(step) => {
            script = script.step(step);
            launch.env(PORT_VAR, Arg::var(PORT_VAR))
        }
        None => launch,
    };
    for step in setup {
        script = script.step(step);
    }
    script.run(launch)
}

/// `pm2 start <target> --name <appName>`
pub(super) fn start_invocation(ctx: &CommandContext, target: impl Into<Arg>) -> Invocation {
    pm2()
        .arg("start")
        .arg(target)
        .arg("--name")
        .arg(ctx.app_name.as_str())
}

pub(super) fn stop_definition(ctx: &CommandContext, runtime: &str) -> CommandDefinition {
    let main = Script::strict()
        .run(pm2().arg("stop").arg(ctx.app_name.as_str()).silenced().or_true())
        .run(pm2().arg("delete").arg(ctx.app_name.as_str()).silenced().or_true());

    CommandDefinition::new(
        "Stop",
        format!("Stop the {} application and remove it from pm2", runtime),
        Icon::Square,
        CommandKind::Normal,
        CommandScripts::main(&main).with_post(&save()),
    )
}

pub(super) fn restart_definition(ctx: &CommandContext, runtime: &str) -> CommandDefinition {
    let main = Script::new().run(
        pm2()
            .arg("restart")
            .arg(ctx.app_name.as_str())
            .arg("--update-env"),
    );

    CommandDefinition::new(
        "Restart",
        format!("Restart the {} application through pm2", runtime),
        Icon::RotateCw,
        CommandKind::Normal,
        CommandScripts::main(&main).with_post(&save()),
    )
}
