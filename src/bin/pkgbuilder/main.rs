//! pkgbuilder CLI - Builds CSDMS models and tools into RPMs

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use packagebuilder::core::errors::{exit_code_for, find_packager_error};
use packagebuilder::util::diagnostic::{emit, Diagnostic};
use packagebuilder::util::shell::{ColorChoice, Shell};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins over the flags
    let default_filter = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "packagebuilder=debug"
    } else {
        "packagebuilder=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        cli.color
    };
    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, color));

    if let Err(e) = run(cli, Arc::clone(&shell)) {
        let diagnostic = match find_packager_error(&e) {
            Some(err) => err.to_diagnostic(),
            None => Diagnostic::error(format!("{:#}", e)),
        };
        emit(&diagnostic, shell.use_color());
        std::process::exit(exit_code_for(&e));
    }
}

fn run(cli: Cli, shell: Arc<Shell>) -> Result<()> {
    let config = cli.config.as_deref();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Rpm(args) => commands::rpm::execute(args, config, quiet, shell),
        Commands::Fetch(args) => commands::fetch::execute(args, config, shell),
        Commands::Locate(args) => commands::locate::execute(args, config, shell),
        Commands::Deps(args) => commands::deps::execute(args, config, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
