use neupcloud::cli::commands::{CliArgs, Commands};
use neupcloud::cli::handlers::{
    handle_config, handle_detect, handle_git, handle_nginx, handle_runtime,
};
use neupcloud::util::logging::{init_with_level, parse_level};
use neupcloud::VERSION;

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("neupcloud v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Runtime(runtime_args) => handle_runtime(runtime_args),
        Commands::Git(git_args) => handle_git(git_args),
        Commands::Nginx(nginx_args) => handle_nginx(nginx_args),
        Commands::Detect(detect_args) => handle_detect(detect_args),
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

/// `--log-level`, then `-v`/`-q`, then the environment
fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        Some(parse_level(level_str))
    } else if args.verbose {
        Some(Level::DEBUG)
    } else if args.quiet {
        Some(Level::ERROR)
    } else {
        None
    };

    init_with_level(level);
}
