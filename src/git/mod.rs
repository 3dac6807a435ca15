//! Git/GitHub command generators
//!
//! Clone, Pull, Force-Pull and Reset, each available over HTTPS (public) or
//! with a deploy key (private). Private variants pass the key through a
//! per-command `GIT_SSH_COMMAND` with host-key checking turned off, so a
//! fresh server can pull without an interactive `known_hosts` prompt.

pub mod commands;
pub mod github;

use crate::command::CommandDefinition;
use crate::config::ScriptSettings;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Git fields of an application record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommandContext {
    pub app_location: String,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub target_ref: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
}

impl GitCommandContext {
    pub fn new(app_location: impl Into<String>) -> Self {
        Self {
            app_location: app_location.into(),
            ..Default::default()
        }
    }

    pub fn with_repo(mut self, repo_url: impl Into<String>) -> Self {
        self.repo_url = Some(repo_url.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_target_ref(mut self, target_ref: impl Into<String>) -> Self {
        self.target_ref = Some(target_ref.into());
        self
    }

    pub fn private(mut self, key_path: impl Into<String>) -> Self {
        self.key_path = Some(key_path.into());
        self.is_private = Some(true);
        self
    }
}

/// How git authenticates against the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitAccess {
    Public,
    Private { key_path: String },
}

impl GitAccess {
    pub fn is_private(&self) -> bool {
        matches!(self, GitAccess::Private { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitAction {
    Clone,
    Pull,
    PullForce,
    Reset,
}

impl GitAction {
    /// Force-pull and reset discard local changes
    pub fn is_destructive(&self) -> bool {
        matches!(self, GitAction::PullForce | GitAction::Reset)
    }

    pub fn all_variants() -> &'static [GitAction] {
        &[
            GitAction::Clone,
            GitAction::Pull,
            GitAction::PullForce,
            GitAction::Reset,
        ]
    }
}

/// Picks the public or private variant from the context
#[derive(Debug, Clone, Default)]
pub struct GitCommands {
    settings: ScriptSettings,
}

impl GitCommands {
    pub fn new(settings: ScriptSettings) -> Self {
        Self { settings }
    }

    /// Private access needs both `isPrivate` and a key path
    pub fn access(ctx: &GitCommandContext) -> GitAccess {
        match (ctx.is_private.unwrap_or(false), ctx.key_path.as_deref()) {
            (true, Some(key)) if !key.trim().is_empty() => GitAccess::Private {
                key_path: key.to_string(),
            },
            (true, _) => {
                warn!(
                    location = %ctx.app_location,
                    "Repository marked private but no key path given, using public access"
                );
                GitAccess::Public
            }
            (false, _) => GitAccess::Public,
        }
    }

    pub fn generate(&self, action: GitAction, ctx: &GitCommandContext) -> CommandDefinition {
        let access = Self::access(ctx);
        match action {
            GitAction::Clone => commands::clone(ctx, &access, &self.settings),
            GitAction::Pull => commands::pull(ctx, &access, &self.settings),
            GitAction::PullForce => commands::pull_force(ctx, &access, &self.settings),
            GitAction::Reset => commands::reset(ctx, &access, &self.settings),
        }
    }

    pub fn all(&self, ctx: &GitCommandContext) -> Vec<CommandDefinition> {
        GitAction::all_variants()
            .iter()
            .map(|action| self.generate(*action, ctx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_private_with_key() {
        let ctx = GitCommandContext::new("/srv/app").private("/home/deploy/.ssh/app_key");
        assert_eq!(
            GitCommands::access(&ctx),
            GitAccess::Private {
                key_path: "/home/deploy/.ssh/app_key".to_string()
            }
        );
    }

    #[test]
    fn test_access_private_without_key_falls_back() {
        let ctx = GitCommandContext {
            is_private: Some(true),
            ..GitCommandContext::new("/srv/app")
        };
        assert_eq!(GitCommands::access(&ctx), GitAccess::Public);
    }

    #[test]
    fn test_access_key_without_private_flag_is_public() {
        let ctx = GitCommandContext {
            key_path: Some("/k".to_string()),
            ..GitCommandContext::new("/srv/app")
        };
        assert!(!GitCommands::access(&ctx).is_private());
    }

    #[test]
    fn test_all_in_order() {
        let ctx = GitCommandContext::new("/srv/app").with_repo("https://github.com/o/r");
        let kinds: Vec<_> = GitCommands::default()
            .all(&ctx)
            .iter()
            .map(|d| d.kind().is_destructive())
            .collect();
        assert_eq!(kinds, vec![false, false, true, true]);
    }

    #[test]
    fn test_context_deserializes_camel_case() {
        let json = r#"{"appLocation":"/srv/a","repoUrl":"https://github.com/o/r","isPrivate":true,"keyPath":"/k"}"#;
        let ctx: GitCommandContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.repo_url.as_deref(), Some("https://github.com/o/r"));
        assert!(GitCommands::access(&ctx).is_private());
    }
}
