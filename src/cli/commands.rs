//! Command dispatch

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::VisitOutcome;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::CliResult;
use crate::cli::output;
use crate::config::{expand_path, global_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if let Some(Commands::Completion { shell }) = &cli.command {
        return _completion(*shell);
    }

    let container = ServiceContainer::new(load_settings(cli)?);
    match &cli.command {
        None => _visit(&container, false),
        Some(Commands::Visit { dry_run }) => _visit(&container, *dry_run),
        Some(Commands::Show) => _show(&container),
        Some(Commands::Config { command }) => _config(&container.settings, command),
        Some(Commands::Completion { .. }) => Ok(()),
    }
}

/// Config layers first, then command line flags.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(path) = &cli.tree_file {
        settings.tree_file = expand_path(path);
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    debug!(?settings, "effective settings");
    Ok(settings)
}

#[instrument(skip(container))]
fn _visit(container: &ServiceContainer, dry_run: bool) -> CliResult<()> {
    let path = &container.settings.tree_file;
    let store = container.tree_store();
    let mut session = container.session()?;
    let mut tree = store.load_or_init(path)?;

    let result = session.visit(&mut tree);

    output::header("Final tree:");
    output::info(&tree.to_termtree());
    if dry_run {
        output::detail("dry run, tree not saved");
    } else {
        store.save(path, &tree)?;
        output::action("Saved", &path.display());
    }

    let report = result?;
    match report.outcome {
        VisitOutcome::LeafAdded { name } => {
            output::success(&format!("{} > {}", report.path.join(" > "), name));
        }
        VisitOutcome::Exhausted => {
            output::warning(&format!(
                "stopped at '{}' without a decision",
                report.path.last().map(String::as_str).unwrap_or_default()
            ));
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn _show(container: &ServiceContainer) -> CliResult<()> {
    let path = &container.settings.tree_file;
    match container.tree_store().load(path)? {
        Some(tree) => output::info(&tree.to_termtree()),
        None => output::warning(&format!("no tree yet at {}", path.display())),
    }
    Ok(())
}

fn _config(settings: &Settings, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => output::action("Global config", &p.display()),
                None => output::action("Global config", "<unavailable>"),
            }
            output::action("Tree file", &settings.tree_file.display());
        }
    }
    Ok(())
}

fn _completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
