use std::path::PathBuf;

use thiserror::Error;

use crate::types::PackageAction;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Invalid action type '{0}': expected package, script, or folder")]
    InvalidActionType(String),

    #[error("Not supported SqlPackage action: '{0}'")]
    UnsupportedPackageAction(PackageAction),

    #[error("unknown SqlPackage action '{0}'")]
    UnknownPackageAction(String),

    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("{tool} not found: install it, put it on PATH, or set {env}")]
    ToolNotFound { tool: &'static str, env: &'static str },

    #[error("{tool} override does not exist: {path}")]
    ToolOverrideMissing { tool: &'static str, path: PathBuf },

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing {0}: set it in the config file or via the environment")]
    MissingSetting(&'static str),

    #[error(transparent)]
    Process(#[from] dbdeploy_process::ProcessError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, DeployError>;
