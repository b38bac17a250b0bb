use std::fmt;

use crate::error::DeployError;

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// Selects which deployment branch the dispatcher takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// Publish a compiled package with sqlpackage.
    Package,
    /// Run one script file with sqlcmd.
    SingleScript,
    /// Run every `.sql` file in a folder with sqlcmd.
    FolderOfScripts,
}

impl ActionType {
    pub fn all() -> &'static [ActionType] {
        &[
            ActionType::Package,
            ActionType::SingleScript,
            ActionType::FolderOfScripts,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Package => "package",
            ActionType::SingleScript => "script",
            ActionType::FolderOfScripts => "folder",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "package" | "dacpac" => Ok(ActionType::Package),
            "script" | "sql" => Ok(ActionType::SingleScript),
            "folder" => Ok(ActionType::FolderOfScripts),
            _ => Err(DeployError::InvalidActionType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PackageAction
// ---------------------------------------------------------------------------

/// The sqlpackage `/Action:` values. Only `Publish` is executed; the rest
/// are recognised so they can be rejected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackageAction {
    #[default]
    Publish,
    Extract,
    Export,
    Import,
    DriftReport,
    DeployReport,
    Script,
}

impl PackageAction {
    pub fn all() -> &'static [PackageAction] {
        &[
            PackageAction::Publish,
            PackageAction::Extract,
            PackageAction::Export,
            PackageAction::Import,
            PackageAction::DriftReport,
            PackageAction::DeployReport,
            PackageAction::Script,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackageAction::Publish => "Publish",
            PackageAction::Extract => "Extract",
            PackageAction::Export => "Export",
            PackageAction::Import => "Import",
            PackageAction::DriftReport => "DriftReport",
            PackageAction::DeployReport => "DeployReport",
            PackageAction::Script => "Script",
        }
    }
}

impl fmt::Display for PackageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PackageAction {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        PackageAction::all()
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| DeployError::UnknownPackageAction(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
