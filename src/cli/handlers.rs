//! Subcommand handlers
//!
//! Each handler returns the process exit code: 0 on success, 1 after logging
//! the error chain.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use super::commands::{ConfigArgs, DetectArgs, GitArgs, NginxArgs, OutputArgs, RuntimeArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::config::NeupConfig;
use crate::error::InputError;
use crate::git::{GitAction, GitCommandContext, GitCommands};
use crate::nginx::{generate_nginx_config, install_command, NginxConfigInput, NginxLocation};
use crate::runtime::{CommandContext, RuntimeCommands, RuntimeId, RuntimeRegistry};

fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

fn load_config() -> Result<NeupConfig> {
    let config = NeupConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn emit(output: &str, args: &OutputArgs) -> Result<()> {
    match &args.output {
        Some(path) => write_output(output, path),
        None => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

fn write_output(output: &str, path: &Path) -> Result<()> {
    fs::write(path, output)
        .with_context(|| format!("Failed to write output to {}", path.display()))?;
    info!("Output written to {}", path.display());
    Ok(())
}

fn formatter(args: &OutputArgs) -> OutputFormatter {
    OutputFormatter::new(OutputFormat::from(args.format))
}

pub fn handle_runtime(args: &RuntimeArgs) -> i32 {
    exit_code(run_runtime(args))
}

fn run_runtime(args: &RuntimeArgs) -> Result<()> {
    let config = load_config()?;
    let registry = RuntimeRegistry::with_settings(config.settings());
    let id = RuntimeId::from(args.runtime);
    let runtime = registry
        .get(id)
        .ok_or_else(|| anyhow!("Runtime {} is not registered", id))?;

    let mut ctx =
        CommandContext::new(args.name.as_str(), args.location.as_str()).with_ports(args.ports.clone());
    if let Some(entry) = &args.entry_file {
        ctx = ctx.with_entry_file(entry.as_str());
    }

    let definitions = match args.action.action() {
        Some(action) => vec![runtime.generate(action, &ctx)],
        None => runtime.all(&ctx),
    };
    info!(
        runtime = %id,
        app = %ctx.app_name,
        count = definitions.len(),
        "Generated runtime commands"
    );

    let output = formatter(&args.output).format_definitions(&definitions)?;
    emit(&output, &args.output)
}

pub fn handle_git(args: &GitArgs) -> i32 {
    exit_code(run_git(args))
}

fn run_git(args: &GitArgs) -> Result<()> {
    let action = GitAction::from(args.action);
    if action == GitAction::Clone && args.repo_url.is_none() {
        return Err(anyhow!("--repo-url is required for clone"));
    }

    let config = load_config()?;
    let generator = GitCommands::new(config.settings().clone());

    let mut ctx = GitCommandContext::new(args.location.as_str());
    ctx.repo_url = args.repo_url.clone();
    ctx.branch = args.branch.clone();
    ctx.target_ref = args.target_ref.clone();
    ctx.key_path = args.key_path.clone();
    ctx.is_private = Some(args.private);

    let definition = generator.generate(action, &ctx);
    info!(
        action = ?action,
        location = %ctx.app_location,
        destructive = definition.kind().is_destructive(),
        "Generated git command"
    );

    let output = formatter(&args.output).format_definitions(&[definition])?;
    emit(&output, &args.output)
}

pub fn handle_nginx(args: &NginxArgs) -> i32 {
    exit_code(run_nginx(args))
}

fn nginx_input(args: &NginxArgs) -> Result<NginxConfigInput, InputError> {
    let mut input = match (&args.input, &args.domain) {
        (Some(path), _) => NginxConfigInput::from_file(path)?,
        (None, domain) => {
            let mut locations = args
                .locations
                .iter()
                .map(|rule| NginxLocation::from_rule(rule))
                .collect::<Result<Vec<_>, _>>()?;
            locations.extend(
                args.static_paths
                    .iter()
                    .map(|path| NginxLocation::static_path(path.as_str())),
            );
            NginxConfigInput {
                domain: domain.clone().unwrap_or_default(),
                locations,
                ..Default::default()
            }
        }
    };

    if args.listen_port.is_some() {
        input.port = args.listen_port;
    }
    if args.main_app_port.is_some() {
        input.main_app_port = args.main_app_port;
    }
    Ok(input)
}

fn run_nginx(args: &NginxArgs) -> Result<()> {
    let config = load_config()?;
    let input = nginx_input(args).context("Failed to read nginx input")?;
    debug!(?input, "Nginx input");

    let server_block = generate_nginx_config(&input, config.settings().default_app_port);
    let install = install_command(&input.domain, &server_block);
    info!(domain = %input.domain, locations = input.locations.len(), "Generated nginx config");

    let output = formatter(&args.output).format_nginx(&input.domain, &server_block, &install)?;
    emit(&output, &args.output)
}

pub fn handle_detect(args: &DetectArgs) -> i32 {
    exit_code(run_detect(args))
}

fn run_detect(args: &DetectArgs) -> Result<()> {
    let config = load_config()?;
    let registry = RuntimeRegistry::with_settings(config.settings());

    let runtime = registry.detect(&args.manifest).ok_or_else(|| {
        let known = RuntimeId::all_variants()
            .iter()
            .filter_map(|id| registry.get(*id))
            .flat_map(|r| r.manifest_patterns().iter().map(|p| p.filename))
            .collect::<Vec<_>>()
            .join(", ");
        InputError::UnknownManifest(args.manifest.clone(), known)
    })?;

    let output = formatter(&args.output).format_detection(&args.manifest, runtime.id())?;
    emit(&output, &args.output)
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    exit_code(run_config(args))
}

fn run_config(args: &ConfigArgs) -> Result<()> {
    let config = load_config()?;
    let output = formatter(&args.output).format_config(&config)?;
    emit(&output, &args.output)
}
