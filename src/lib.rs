//! neupcloud - command and configuration generation for Neup.Cloud servers
//!
//! This library turns an application record into the shell scripts a
//! Neup.Cloud dashboard runs on its servers: Build / Start / Stop / Restart for
//! Node.js, Python and Go applications, Clone / Pull / Force-Pull / Reset for
//! their git repositories, and the nginx server block that fronts them.
//! Nothing here executes a script; every generator is a pure function of its
//! inputs.
//!
//! # Core Concepts
//!
//! - **Command definitions**: a title, description, icon, publish status, type
//!   and a pre/main/post script triple ([`CommandDefinition`])
//! - **Scripts**: built from argument vectors, so every value taken from an
//!   application record is shell-quoted ([`command::script`])
//! - **Settings**: environment-derived values threaded explicitly into the
//!   generators ([`ScriptSettings`])
//!
//! # Example Usage
//!
//! ```
//! use neupcloud::runtime::{CommandContext, RuntimeCommands, RuntimeId, RuntimeRegistry};
//!
//! let registry = RuntimeRegistry::default();
//! let node = registry.get(RuntimeId::Node).unwrap();
//!
//! let ctx = CommandContext::new("shop", "/var/www/shop").with_ports([3000, 3001]);
//! let start = node.start(&ctx);
//!
//! assert!(start.main_command().contains("pm2 start"));
//! assert!(start.main_command().contains("/var/www/shop"));
//! ```
//!
//! # Project Structure
//!
//! - [`command`]: definitions and the script model
//! - [`runtime`]: Node.js, Python and Go generators plus the port finder
//! - [`git`]: repository commands, public and deploy-key variants
//! - [`nginx`]: reverse-proxy config generation
//! - [`config`]: environment configuration

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod git;
pub mod nginx;
pub mod runtime;
pub mod util;

pub use command::{CommandDefinition, CommandKind, CommandScripts, CommandStatus, Icon};
pub use config::{ConfigError, NeupConfig, ScriptSettings};
pub use error::InputError;
pub use git::{GitAction, GitCommandContext, GitCommands};
pub use nginx::{generate_nginx_config, NginxConfigInput, NginxLocation};
pub use runtime::{Action, CommandContext, RuntimeCommands, RuntimeId, RuntimeRegistry};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_neupcloud() {
        assert_eq!(NAME, "neupcloud");
    }
}
