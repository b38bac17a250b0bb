use std::ffi::OsStr;

use dbdeploy_process::ProcessRunner;
use tracing::{debug, info};

use crate::args;
use crate::config::DeployConfig;
use crate::error::Result;
use crate::inputs::{ActionInputs, FolderInputs, PackageInputs, ScriptInputs};
use crate::tools::{Tool, ToolLocator};
use crate::types::ActionType;

/// Suffix a folder entry needs to be run. Case-sensitive.
pub const SCRIPT_SUFFIX: &str = ".sql";

/// What a successful action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub action: ActionType,
    /// Number of tool invocations made.
    pub invocations: usize,
    /// Human-readable confirmation line.
    pub message: String,
}

/// Runs one [`ActionInputs`] against the target database.
///
/// Each branch resolves its tool, builds the command line and awaits the
/// process. Folder scripts run one after another in directory order and the
/// first failure aborts the rest.
pub struct Dispatcher<L, R> {
    locator: L,
    runner: R,
}

impl<L: ToolLocator, R: ProcessRunner> Dispatcher<L, R> {
    pub fn new(locator: L, runner: R) -> Self {
        Self { locator, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub async fn execute(&self, inputs: &ActionInputs) -> Result<Completed> {
        debug!(action = %inputs.action_type(), "begin executing action");
        let completed = match inputs {
            ActionInputs::Package(p) => self.execute_package(p).await?,
            ActionInputs::SingleScript(s) => self.execute_script(s).await?,
            ActionInputs::FolderOfScripts(f) => self.execute_folder(f).await?,
        };
        info!("{}", completed.message);
        Ok(completed)
    }

    /// Parse a config into inputs and execute it. Nothing is spawned when the
    /// config names an unknown action type or unsupported package action.
    pub async fn execute_config(
        &self,
        config: &DeployConfig,
        fallback_connection: Option<String>,
    ) -> Result<Completed> {
        let inputs = config.into_inputs(fallback_connection)?;
        self.execute(&inputs).await
    }

    async fn execute_package(&self, inputs: &PackageInputs) -> Result<Completed> {
        // Unsupported actions fail here, before the tool is even located.
        args::sqlpackage_arguments(inputs)?;

        let tool = self.locator.locate(Tool::SqlPackage)?;
        let command = args::sqlpackage_command(&tool, inputs)?;
        debug!(%command, "running sqlpackage");
        self.runner.run(&command).await?;

        Ok(Completed {
            action: ActionType::Package,
            invocations: 1,
            message: format!(
                "Successfully executed action {} on target database.",
                inputs.package_action
            ),
        })
    }

    async fn execute_script(&self, inputs: &ScriptInputs) -> Result<Completed> {
        let tool = self.locator.locate(Tool::SqlCmd)?;
        let command = args::sqlcmd_command(&tool, &inputs.base, &inputs.script_path);
        debug!(%command, "running sqlcmd");
        self.runner.run(&command).await?;

        Ok(Completed {
            action: ActionType::SingleScript,
            invocations: 1,
            message: "Successfully executed Sql file on target database.".to_string(),
        })
    }

    async fn execute_folder(&self, inputs: &FolderInputs) -> Result<Completed> {
        let tool = self.locator.locate(Tool::SqlCmd)?;
        let mut entries = tokio::fs::read_dir(&inputs.folder_path).await?;
        let mut invocations = 0;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_str().is_none() {
                // sqlcmd receives the path as text, a lossy name would not resolve.
                debug!(entry = %name.to_string_lossy(), "skipping non-UTF-8 entry");
                continue;
            }
            if !is_script(&name) {
                debug!(entry = %name.to_string_lossy(), "skipping non-script entry");
                continue;
            }
            let script = inputs.folder_path.join(&name);
            let command = args::sqlcmd_command(&tool, &inputs.base, &script);
            info!(script = %script.display(), "executing script");
            debug!(%command, "running sqlcmd");
            self.runner.run(&command).await?;
            invocations += 1;
        }

        Ok(Completed {
            action: ActionType::FolderOfScripts,
            invocations,
            message: "Successfully executed scripts in sql folder on target database.".to_string(),
        })
    }
}

/// Whether a folder entry name is run. Names that are not valid UTF-8 never are.
pub(crate) fn is_script(name: &OsStr) -> bool {
    name.to_str().is_some_and(|n| n.ends_with(SCRIPT_SUFFIX))
}
