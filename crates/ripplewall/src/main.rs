mod cli;
mod paths;
mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use cli::{Command, ConfigAction};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(config_cmd)) => handle_config_command(config_cmd.action),
        None => run::run(cli.run),
    }
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    let paths = AppPaths::discover()?;
    match action {
        ConfigAction::Where => run_config_where(&paths),
        ConfigAction::Check { file } => run_config_check(&paths, file),
    }
}

fn run_config_where(paths: &AppPaths) -> Result<()> {
    let file = paths.config_file();
    println!("Configuration:");
    println!("  dir:   {}", paths.config_dir().display());
    println!(
        "  file:  {} ({})",
        file.display(),
        if file.exists() { "present" } else { "missing" }
    );
    Ok(())
}

fn run_config_check(paths: &AppPaths, file: Option<PathBuf>) -> Result<()> {
    let (path, required) = match file {
        Some(path) => (path, true),
        None => (paths.config_file(), false),
    };
    let config = run::load_config(&path, required)?;
    if path.exists() {
        println!("{} is valid.", path.display());
    } else {
        println!("No config file at {}; using defaults.", path.display());
    }
    let rendered = config
        .to_toml_string()
        .context("failed to render effective configuration")?;
    println!("Effective settings:");
    print!("{rendered}");
    Ok(())
}
