//! Locating the sqlpackage and sqlcmd executables.
//!
//! # Resolution order
//! 1. explicit override (CLI flag, config file, or `DBDEPLOY_SQLPACKAGE` /
//!    `DBDEPLOY_SQLCMD`), which must exist
//! 2. `PATH`
//! 3. well-known install locations; on Windows the highest-versioned
//!    `Microsoft SQL Server\<ver>` directory wins

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{DeployError, Result};

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    SqlPackage,
    SqlCmd,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[Tool::SqlPackage, Tool::SqlCmd]
    }

    /// Executable name looked up on `PATH`.
    pub fn binary_name(self) -> &'static str {
        match self {
            Tool::SqlPackage => "sqlpackage",
            Tool::SqlCmd => "sqlcmd",
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            Tool::SqlPackage => "DBDEPLOY_SQLPACKAGE",
            Tool::SqlCmd => "DBDEPLOY_SQLCMD",
        }
    }

    fn well_known_paths(self) -> Vec<PathBuf> {
        if cfg!(windows) {
            let program_files = std::env::var_os("ProgramFiles")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"));
            let sql_server = program_files.join("Microsoft SQL Server");
            match self {
                Tool::SqlPackage => {
                    versioned_candidates(&sql_server, Path::new(r"DAC\bin\SqlPackage.exe"))
                }
                Tool::SqlCmd => {
                    versioned_candidates(&sql_server, Path::new(r"Tools\Binn\SQLCMD.EXE"))
                }
            }
        } else {
            match self {
                Tool::SqlPackage => vec![PathBuf::from("/opt/sqlpackage/sqlpackage")],
                Tool::SqlCmd => vec![
                    PathBuf::from("/opt/mssql-tools18/bin/sqlcmd"),
                    PathBuf::from("/opt/mssql-tools/bin/sqlcmd"),
                ],
            }
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// `<root>/<version>/<suffix>` for every numeric version directory under
/// `root`, highest version first. Only existing files are returned.
pub fn versioned_candidates(root: &Path, suffix: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut versions: Vec<(u32, PathBuf)> = entries
        .flatten()
        .filter_map(|e| {
            let version = e.file_name().to_str()?.parse::<u32>().ok()?;
            Some((version, e.path().join(suffix)))
        })
        .filter(|(_, p)| p.is_file())
        .collect();
    versions.sort_by(|a, b| b.0.cmp(&a.0));
    versions.into_iter().map(|(_, p)| p).collect()
}

// ---------------------------------------------------------------------------
// ToolLocator
// ---------------------------------------------------------------------------

/// Resolves a tool to an executable path.
pub trait ToolLocator {
    fn locate(&self, tool: Tool) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSource {
    Override,
    Path,
    WellKnown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub tool: Tool,
    pub path: PathBuf,
    pub source: ToolSource,
}

/// Looks tools up on the local machine.
#[derive(Debug, Clone, Default)]
pub struct SystemToolLocator {
    sqlpackage: Option<PathBuf>,
    sqlcmd: Option<PathBuf>,
}

impl SystemToolLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the `DBDEPLOY_*` environment overrides.
    pub fn from_env() -> Self {
        let mut locator = Self::new();
        for tool in Tool::all() {
            let path = std::env::var_os(tool.env_var())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from);
            locator = locator.with_override(*tool, path);
        }
        locator
    }

    /// Set an explicit path for `tool`. `None` leaves any existing override.
    pub fn with_override(mut self, tool: Tool, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            match tool {
                Tool::SqlPackage => self.sqlpackage = Some(path),
                Tool::SqlCmd => self.sqlcmd = Some(path),
            }
        }
        self
    }

    fn override_for(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::SqlPackage => self.sqlpackage.as_deref(),
            Tool::SqlCmd => self.sqlcmd.as_deref(),
        }
    }

    pub fn resolve(&self, tool: Tool) -> Result<Resolution> {
        if let Some(path) = self.override_for(tool) {
            if !path.is_file() {
                return Err(DeployError::ToolOverrideMissing {
                    tool: tool.binary_name(),
                    path: path.to_path_buf(),
                });
            }
            return Ok(Resolution {
                tool,
                path: path.to_path_buf(),
                source: ToolSource::Override,
            });
        }

        if let Ok(path) = which::which(tool.binary_name()) {
            return Ok(Resolution {
                tool,
                path,
                source: ToolSource::Path,
            });
        }

        tool.well_known_paths()
            .into_iter()
            .find(|p| p.is_file())
            .map(|path| Resolution {
                tool,
                path,
                source: ToolSource::WellKnown,
            })
            .ok_or(DeployError::ToolNotFound {
                tool: tool.binary_name(),
                env: tool.env_var(),
            })
    }
}

impl ToolLocator for SystemToolLocator {
    fn locate(&self, tool: Tool) -> Result<PathBuf> {
        let resolution = self.resolve(tool)?;
        tracing::debug!(
            tool = %tool,
            path = %resolution.path.display(),
            source = ?resolution.source,
            "resolved tool"
        );
        Ok(resolution.path)
    }
}
