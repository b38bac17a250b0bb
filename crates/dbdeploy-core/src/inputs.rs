use std::path::PathBuf;

use crate::connection::ConnectionString;
use crate::types::{ActionType, PackageAction};

/// Fields every action carries.
#[derive(Debug)]
pub struct ActionBase {
    /// Server passed to sqlcmd as `-S`.
    pub server_name: String,
    pub connection: ConnectionString,
    /// Appended verbatim to the tool's argument string.
    pub additional_arguments: Option<String>,
}

#[derive(Debug)]
pub struct PackageInputs {
    pub base: ActionBase,
    pub package_path: PathBuf,
    pub package_action: PackageAction,
}

#[derive(Debug)]
pub struct ScriptInputs {
    pub base: ActionBase,
    pub script_path: PathBuf,
}

#[derive(Debug)]
pub struct FolderInputs {
    pub base: ActionBase,
    pub folder_path: PathBuf,
}

/// One deployment action. Each variant owns only the payload its branch uses.
#[derive(Debug)]
pub enum ActionInputs {
    Package(PackageInputs),
    SingleScript(ScriptInputs),
    FolderOfScripts(FolderInputs),
}

impl ActionInputs {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionInputs::Package(_) => ActionType::Package,
            ActionInputs::SingleScript(_) => ActionType::SingleScript,
            ActionInputs::FolderOfScripts(_) => ActionType::FolderOfScripts,
        }
    }

    pub fn base(&self) -> &ActionBase {
        match self {
            ActionInputs::Package(p) => &p.base,
            ActionInputs::SingleScript(s) => &s.base,
            ActionInputs::FolderOfScripts(f) => &f.base,
        }
    }

    /// Build the variant selected by `action_type` around a single payload
    /// path. `package_action` is only consulted for packages.
    pub fn new(
        action_type: ActionType,
        base: ActionBase,
        path: PathBuf,
        package_action: PackageAction,
    ) -> Self {
        match action_type {
            ActionType::Package => ActionInputs::Package(PackageInputs {
                base,
                package_path: path,
                package_action,
            }),
            ActionType::SingleScript => ActionInputs::SingleScript(ScriptInputs {
                base,
                script_path: path,
            }),
            ActionType::FolderOfScripts => ActionInputs::FolderOfScripts(FolderInputs {
                base,
                folder_path: path,
            }),
        }
    }
}
