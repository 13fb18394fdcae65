//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use packagebuilder::util::shell::ColorChoice;

/// pkgbuilder - Builds CSDMS models and tools into RPMs
#[derive(Parser)]
#[command(name = "pkgbuilder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Provide less detailed output (also passed to rpmbuild)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// When to color output: auto, always or never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Disable colored output (same as `--color never`)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file to load on top of the global one
    #[arg(long, global = true, env = "PKGBUILDER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build binary and source RPMs for a module
    Rpm(RpmArgs),

    /// Download a module's source as <name>-<version>.tar.gz
    Fetch(FetchArgs),

    /// Show where a module's packaging files are found
    Locate(ModuleArgs),

    /// Print a module's build requirements
    Deps(ModuleArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ModuleArgs {
    /// Name of the model or tool
    pub module: String,

    /// Use the module files in LOCAL instead of the repositories
    #[arg(long, value_name = "LOCAL")]
    pub local: Option<String>,
}

#[derive(Args)]
pub struct RpmArgs {
    #[command(flatten)]
    pub target: ModuleArgs,

    /// Build TAG version of the module [default: head]
    #[arg(long)]
    pub tag: Option<String>,

    /// Install prefix for the RPM [default: /usr/local]
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub target: ModuleArgs,

    /// Fetch TAG version of the module [default: head]
    #[arg(long)]
    pub tag: Option<String>,

    /// Directory to write the tarball to [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
