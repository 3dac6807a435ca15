use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::git::GitAction;
use crate::runtime::{Action, RuntimeId};

/// Command and configuration generator for Neup.Cloud servers
#[derive(Parser, Debug)]
#[command(
    name = "neupcloud",
    about = "Generate deployment commands and nginx configs for Neup.Cloud servers",
    version,
    author,
    long_about = "neupcloud turns an application record into the shell scripts that build, \
                  start, stop and restart it (Node.js, Python, Go), the git commands that \
                  clone and update its repository, and the nginx server block that fronts it. \
                  Scripts are printed, never executed."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Generate runtime lifecycle commands",
        long_about = "Generates Build, Start, Stop and Restart commands for an application.\n\n\
                      Examples:\n  \
                      neupcloud runtime node start --name shop --location /var/www/shop --port 3000\n  \
                      neupcloud runtime python all --name api --location /srv/api --entry-file app.py\n  \
                      neupcloud runtime go build --name svc --location /srv/svc --format script"
    )]
    Runtime(RuntimeArgs),

    #[command(
        about = "Generate git commands",
        long_about = "Generates Clone, Pull, Force-Pull and Reset commands. Passing --private \
                      with --key-path produces the deploy-key variant.\n\n\
                      Examples:\n  \
                      neupcloud git clone --location /var/www/site --repo-url https://github.com/acme/site.git\n  \
                      neupcloud git reset --location /var/www/site --target-ref v1.2.0\n  \
                      neupcloud git pull --location /srv/api --private --key-path ~/.ssh/deploy"
    )]
    Git(GitArgs),

    #[command(
        about = "Generate an nginx server block",
        long_about = "Renders an nginx config from an input file (JSON or YAML) or from flags.\n\n\
                      Examples:\n  \
                      neupcloud nginx --input site.yaml\n  \
                      neupcloud nginx --domain example.com --location /api=localhost:5000 --static /assets"
    )]
    Nginx(NginxArgs),

    #[command(
        about = "Name the runtime for a manifest file",
        long_about = "Prints the runtime that owns a manifest file name.\n\n\
                      Examples:\n  \
                      neupcloud detect package.json\n  \
                      neupcloud detect ./services/api/go.mod"
    )]
    Detect(DetectArgs),

    #[command(about = "Show effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RuntimeArgs {
    #[arg(value_enum, help = "Application runtime")]
    pub runtime: RuntimeArg,

    #[arg(value_enum, help = "Lifecycle action, or 'all' for every action")]
    pub action: ActionArg,

    #[arg(short = 'n', long, value_name = "NAME", help = "Application name")]
    pub name: String,

    #[arg(
        short = 'l',
        long,
        value_name = "PATH",
        help = "Application directory on the server"
    )]
    pub location: String,

    #[arg(
        short = 'p',
        long = "port",
        value_name = "PORT",
        help = "Preferred port, probed in the order given (repeatable)"
    )]
    pub ports: Vec<u16>,

    #[arg(long, value_name = "FILE", help = "Entry file to launch")]
    pub entry_file: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct GitArgs {
    #[arg(value_enum, help = "Git action")]
    pub action: GitActionArg,

    #[arg(
        short = 'l',
        long,
        value_name = "PATH",
        help = "Application directory on the server"
    )]
    pub location: String,

    #[arg(long, value_name = "URL", help = "Repository URL")]
    pub repo_url: Option<String>,

    #[arg(short = 'b', long, value_name = "BRANCH", help = "Branch to track")]
    pub branch: Option<String>,

    #[arg(
        long,
        value_name = "REF",
        help = "Commit, tag or ref to reset to (reset only)"
    )]
    pub target_ref: Option<String>,

    #[arg(long, value_name = "PATH", help = "Deploy key path on the server")]
    pub key_path: Option<String>,

    #[arg(long, help = "Use the deploy key variant")]
    pub private: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct NginxArgs {
    #[arg(
        short = 'i',
        long,
        value_name = "FILE",
        conflicts_with_all = ["domain", "locations", "static_paths"],
        required_unless_present = "domain",
        help = "Read input from a JSON or YAML file"
    )]
    pub input: Option<PathBuf>,

    #[arg(short = 'd', long, value_name = "DOMAIN", help = "server_name")]
    pub domain: Option<String>,

    #[arg(
        long = "location",
        value_name = "PATH=TARGET",
        help = "Proxy location, e.g. /api=localhost:5000 (repeatable)"
    )]
    pub locations: Vec<String>,

    #[arg(
        long = "static",
        value_name = "PATH",
        help = "Static location served by the main app (repeatable)"
    )]
    pub static_paths: Vec<String>,

    #[arg(long, value_name = "PORT", help = "Listen port [default: 80]")]
    pub listen_port: Option<u16>,

    #[arg(long, value_name = "PORT", help = "Main application port")]
    pub main_app_port: Option<u16>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(value_name = "MANIFEST", help = "Manifest file name or path")]
    pub manifest: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeArg {
    Node,
    Python,
    Go,
}

impl From<RuntimeArg> for RuntimeId {
    fn from(arg: RuntimeArg) -> Self {
        match arg {
            RuntimeArg::Node => RuntimeId::Node,
            RuntimeArg::Python => RuntimeId::Python,
            RuntimeArg::Go => RuntimeId::Go,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionArg {
    Build,
    Start,
    Stop,
    Restart,
    All,
}

impl ActionArg {
    /// `None` means every action
    pub fn action(self) -> Option<Action> {
        match self {
            ActionArg::Build => Some(Action::Build),
            ActionArg::Start => Some(Action::Start),
            ActionArg::Stop => Some(Action::Stop),
            ActionArg::Restart => Some(Action::Restart),
            ActionArg::All => None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitActionArg {
    Clone,
    Pull,
    PullForce,
    Reset,
}

impl From<GitActionArg> for GitAction {
    fn from(arg: GitActionArg) -> Self {
        match arg {
            GitActionArg::Clone => GitAction::Clone,
            GitActionArg::Pull => GitAction::Pull,
            GitActionArg::PullForce => GitAction::PullForce,
            GitActionArg::Reset => GitAction::Reset,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
    Script,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
            OutputFormatArg::Script => super::output::OutputFormat::Script,
        }
    }
}
