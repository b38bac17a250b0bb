mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::deploy::TargetArgs;
use dbdeploy_core::types::ActionType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dbdeploy",
    about = "Publish dacpacs and run SQL scripts against a target database via sqlpackage / sqlcmd",
    version,
    propagate_version = true
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a compiled package (.dacpac) with sqlpackage
    Package {
        /// Package file
        path: PathBuf,

        /// sqlpackage action (only publish is supported)
        #[arg(long, default_value = "publish")]
        action: String,

        /// Path to sqlpackage (default: DBDEPLOY_SQLPACKAGE, PATH, install dirs)
        #[arg(long)]
        sqlpackage: Option<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run a single .sql file with sqlcmd
    Script {
        /// Script file
        path: PathBuf,

        /// Path to sqlcmd (default: DBDEPLOY_SQLCMD, PATH, install dirs)
        #[arg(long)]
        sqlcmd: Option<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run every .sql file in a folder (non-recursive) with sqlcmd
    Folder {
        /// Folder containing the scripts
        path: PathBuf,

        /// Path to sqlcmd (default: DBDEPLOY_SQLCMD, PATH, install dirs)
        #[arg(long)]
        sqlcmd: Option<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Execute the action described in a deployment config file
    Run {
        /// YAML config file
        config: PathBuf,
    },

    /// Check a deployment config file without running anything
    Validate {
        /// YAML config file
        config: PathBuf,

        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Show where sqlpackage and sqlcmd resolve
    Tools {
        #[arg(long)]
        sqlpackage: Option<PathBuf>,

        #[arg(long)]
        sqlcmd: Option<PathBuf>,

        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        match &cli.command {
            Commands::Validate { .. } | Commands::Tools { .. } => tracing::Level::WARN,
            _ => tracing::Level::INFO,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Package {
            path,
            action,
            sqlpackage,
            target,
        } => cmd::deploy::run(ActionType::Package, path, Some(&action), target, sqlpackage),
        Commands::Script {
            path,
            sqlcmd,
            target,
        } => cmd::deploy::run(ActionType::SingleScript, path, None, target, sqlcmd),
        Commands::Folder {
            path,
            sqlcmd,
            target,
        } => cmd::deploy::run(ActionType::FolderOfScripts, path, None, target, sqlcmd),
        Commands::Run { config } => cmd::run::run(&config),
        Commands::Validate { config, json } => cmd::validate::run(&config, json),
        Commands::Tools {
            sqlpackage,
            sqlcmd,
            json,
        } => cmd::tools::run(sqlpackage, sqlcmd, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
