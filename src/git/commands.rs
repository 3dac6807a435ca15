//! Clone / Pull / Force-Pull / Reset script generation

use super::github::{is_ssh_url, to_ssh_url};
use super::{GitAccess, GitCommandContext};
use crate::command::{
    Arg, CommandDefinition, CommandKind, CommandScripts, Icon, Invocation, Script, Step,
};
use crate::config::ScriptSettings;
use tracing::debug;

/// Value of `GIT_SSH_COMMAND` for a deploy key
pub fn ssh_command(key_path: &str) -> String {
    format!(
        "ssh -i {} -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null",
        shell_words::quote(key_path)
    )
}

fn git(access: &GitAccess) -> Invocation {
    match access {
        GitAccess::Public => Invocation::new("git"),
        GitAccess::Private { key_path } => {
            Invocation::new("git").env("GIT_SSH_COMMAND", ssh_command(key_path))
        }
    }
}

fn branch<'a>(ctx: &'a GitCommandContext, settings: &'a ScriptSettings) -> &'a str {
    ctx.branch
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .unwrap_or(&settings.default_branch)
}

fn remote_url(ctx: &GitCommandContext, access: &GitAccess) -> String {
    let url = ctx.repo_url.as_deref().unwrap_or_default();
    match access {
        GitAccess::Public => url.to_string(),
        GitAccess::Private { .. } if is_ssh_url(url) => url.to_string(),
        GitAccess::Private { .. } => to_ssh_url(url),
    }
}

fn titled(base: &str, access: &GitAccess) -> String {
    match access {
        GitAccess::Public => base.to_string(),
        GitAccess::Private { .. } => format!("{} (SSH key)", base),
    }
}

/// Prints the commit the working tree ended up on
fn show_head(ctx: &GitCommandContext) -> Script {
    Script::new().run(
        Invocation::new("git")
            .arg("-C")
            .arg(ctx.app_location.as_str())
            .args(["log", "-1", "--oneline"]),
    )
}

/// Clones through a temporary subdirectory so a non-empty target works
pub fn clone(
    ctx: &GitCommandContext,
    access: &GitAccess,
    settings: &ScriptSettings,
) -> CommandDefinition {
    debug!(location = %ctx.app_location, private = access.is_private(), "Generating git clone command");

    let tmp = settings.clone_tmp_dir.as_str();
    let mut clone = git(access).arg("clone");
    if let Some(b) = ctx.branch.as_deref().filter(|b| !b.trim().is_empty()) {
        clone = clone.arg("--branch").arg(b);
    }
    let clone = clone.arg(remote_url(ctx, access)).arg(tmp);

    let main = Script::strict()
        .run(Invocation::new("mkdir").arg("-p").arg(ctx.app_location.as_str()))
        .step(Step::cd(ctx.app_location.as_str()))
        .run(Invocation::new("rm").arg("-rf").arg(tmp))
        .run(clone)
        .run(Invocation::new("shopt").args(["-s", "dotglob"]))
        .run(
            Invocation::new("mv")
                .arg("-f")
                .arg(Arg::DirEntries(tmp.to_string()))
                .arg("."),
        )
        .run(Invocation::new("shopt").args(["-u", "dotglob"]))
        .run(Invocation::new("rm").arg("-rf").arg(tmp));

    CommandDefinition::new(
        titled("Clone Repository", access),
        "Clone the repository into the application directory, keeping existing files",
        Icon::Download,
        CommandKind::Normal,
        CommandScripts::main(&main).with_post(&show_head(ctx)),
    )
}

pub fn pull(
    ctx: &GitCommandContext,
    access: &GitAccess,
    settings: &ScriptSettings,
) -> CommandDefinition {
    debug!(location = %ctx.app_location, private = access.is_private(), "Generating git pull command");

    let main = Script::strict()
        .step(Step::cd(ctx.app_location.as_str()))
        .run(git(access).args(["pull", "origin"]).arg(branch(ctx, settings)));

    CommandDefinition::new(
        titled("Pull Latest Changes", access),
        "Pull the latest commits from the remote branch",
        Icon::GitPullRequest,
        CommandKind::Normal,
        CommandScripts::main(&main).with_post(&show_head(ctx)),
    )
}

/// Fetches and hard-resets to `origin/<branch>`, discarding local changes
pub fn pull_force(
    ctx: &GitCommandContext,
    access: &GitAccess,
    settings: &ScriptSettings,
) -> CommandDefinition {
    debug!(location = %ctx.app_location, private = access.is_private(), "Generating git force-pull command");

    let target = format!("origin/{}", branch(ctx, settings));
    let main = fetch_and_reset(ctx, access, &target);

    CommandDefinition::new(
        titled("Force Pull", access),
        "Fetch the remote and hard-reset to it, discarding local changes",
        Icon::AlertTriangle,
        CommandKind::Destructive,
        CommandScripts::main(&main).with_post(&show_head(ctx)),
    )
}

/// Fetches and hard-resets to `targetRef` (default `origin/<branch>`)
pub fn reset(
    ctx: &GitCommandContext,
    access: &GitAccess,
    settings: &ScriptSettings,
) -> CommandDefinition {
    debug!(location = %ctx.app_location, private = access.is_private(), "Generating git reset command");

    let target = match ctx.target_ref.as_deref().filter(|r| !r.trim().is_empty()) {
        Some(target) => target.to_string(),
        None => format!("origin/{}", branch(ctx, settings)),
    };
    let main = fetch_and_reset(ctx, access, &target);

    CommandDefinition::new(
        titled("Reset to Ref", access),
        format!("Hard-reset the working tree to {}, discarding local changes", target),
        Icon::History,
        CommandKind::Destructive,
        CommandScripts::main(&main).with_post(&show_head(ctx)),
    )
}

fn fetch_and_reset(ctx: &GitCommandContext, access: &GitAccess, target: &str) -> Script {
    Script::strict()
        .step(Step::cd(ctx.app_location.as_str()))
        .run(git(access).args(["fetch", "--all"]))
        .run(git(access).args(["reset", "--hard"]).arg(target))
}
