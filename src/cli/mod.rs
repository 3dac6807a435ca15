pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, ConfigArgs, DetectArgs, GitArgs, NginxArgs, RuntimeArgs};
pub use output::{OutputFormat, OutputFormatter};
