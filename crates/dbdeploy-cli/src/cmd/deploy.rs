use anyhow::Context;
use dbdeploy_core::connection::ConnectionString;
use dbdeploy_core::inputs::{ActionBase, ActionInputs};
use dbdeploy_core::tools::{SystemToolLocator, Tool, ToolLocator};
use dbdeploy_core::types::{ActionType, PackageAction};
use dbdeploy_core::Dispatcher;
use dbdeploy_process::TokioRunner;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Shared flags
// ---------------------------------------------------------------------------

#[derive(clap::Args)]
pub struct TargetArgs {
    /// Connection string for the target database
    #[arg(
        long,
        env = "DBDEPLOY_CONNECTION_STRING",
        hide_env_values = true,
        value_name = "CONNECTION_STRING"
    )]
    pub connection_string: String,

    /// Server for sqlcmd -S (default: Server= from the connection string)
    #[arg(long)]
    pub server: Option<String>,

    /// Extra arguments appended verbatim to the tool command line
    #[arg(long = "args", value_name = "ARGS", allow_hyphen_values = true)]
    pub additional_arguments: Option<String>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run an action assembled from command-line flags.
pub fn run(
    action_type: ActionType,
    path: PathBuf,
    package_action: Option<&str>,
    target: TargetArgs,
    tool_override: Option<PathBuf>,
) -> anyhow::Result<()> {
    let package_action = match package_action {
        Some(a) => a.parse::<PackageAction>()?,
        None => PackageAction::default(),
    };

    let connection =
        ConnectionString::parse(&target.connection_string).context("invalid connection string")?;
    let server_name = target
        .server
        .or_else(|| connection.server().map(str::to_string))
        .ok_or_else(|| {
            anyhow::anyhow!("no server: pass --server or include Server= in the connection string")
        })?;

    let inputs = ActionInputs::new(
        action_type,
        ActionBase {
            server_name,
            connection,
            additional_arguments: target.additional_arguments,
        },
        path,
        package_action,
    );

    let tool = match action_type {
        ActionType::Package => Tool::SqlPackage,
        ActionType::SingleScript | ActionType::FolderOfScripts => Tool::SqlCmd,
    };
    let locator = SystemToolLocator::from_env().with_override(tool, tool_override);
    execute(locator, &inputs)
}

/// Drive one action to completion on a fresh runtime and print the
/// confirmation line.
pub fn execute<L: ToolLocator>(locator: L, inputs: &ActionInputs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let dispatcher = Dispatcher::new(locator, TokioRunner);
    let done = rt
        .block_on(dispatcher.execute(inputs))
        .with_context(|| format!("{} action failed", inputs.action_type()))?;
    println!("{}", done.message);
    Ok(())
}
