use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionString;
use crate::dispatcher;
use crate::error::{DeployError, Result};
use crate::inputs::{ActionBase, ActionInputs};
use crate::tools::{SystemToolLocator, Tool};
use crate::types::{ActionType, PackageAction};

/// Environment variable consulted when the config file has no
/// `connection_string`.
pub const CONNECTION_STRING_ENV: &str = "DBDEPLOY_CONNECTION_STRING";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionSpec / ToolPaths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ActionSpec {
    /// `package`, `script`, or `folder`. Kept as text so an unknown value is
    /// reported as an invalid action type rather than a YAML error.
    #[serde(rename = "type")]
    pub kind: String,
    /// Package file, script file, or script folder depending on `kind`.
    pub path: PathBuf,
    #[serde(default)]
    pub package_action: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolPaths {
    #[serde(default)]
    pub sqlpackage: Option<PathBuf>,
    #[serde(default)]
    pub sqlcmd: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// DeployConfig
// ---------------------------------------------------------------------------

/// A deployment described in YAML.
///
/// ```yaml
/// server: myserver.database.windows.net
/// connection_string: "Server=...;Database=app;User Id=deploy;Password=..."
/// action:
///   type: package
///   path: out/app.dacpac
///   package_action: publish
/// additional_arguments: "/p:DropObjectsNotInSource=false"
/// tools:
///   sqlpackage: /opt/sqlpackage/sqlpackage
/// ```
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Clone, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub connection_string: Option<String>,
    pub action: ActionSpec,
    #[serde(default)]
    pub additional_arguments: Option<String>,
    #[serde(default)]
    pub tools: ToolPaths,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("server", &self.server)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .field("action", &self.action)
            .field("additional_arguments", &self.additional_arguments)
            .field("tools", &self.tools)
            .finish()
    }
}

impl DeployConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DeployError::ConfigNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        let mut cfg = Self::from_yaml(&data)?;
        cfg.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(cfg)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn action_path(&self) -> PathBuf {
        self.resolve(&self.action.path)
    }

    pub fn action_type(&self) -> Result<ActionType> {
        self.action.kind.parse()
    }

    pub fn package_action(&self) -> Result<PackageAction> {
        match &self.action.package_action {
            Some(s) => s.parse(),
            None => Ok(PackageAction::default()),
        }
    }

    /// Tool locator seeded from the environment, then this file's `tools:`.
    pub fn locator(&self) -> SystemToolLocator {
        SystemToolLocator::from_env()
            .with_override(
                Tool::SqlPackage,
                self.tools.sqlpackage.as_deref().map(|p| self.resolve(p)),
            )
            .with_override(
                Tool::SqlCmd,
                self.tools.sqlcmd.as_deref().map(|p| self.resolve(p)),
            )
    }

    /// Build the typed inputs. `fallback_connection` is used when the file's
    /// `connection_string` is absent or blank (normally the value of
    /// [`CONNECTION_STRING_ENV`]).
    pub fn into_inputs(&self, fallback_connection: Option<String>) -> Result<ActionInputs> {
        let action_type = self.action_type()?;
        let package_action = self.package_action()?;

        let not_blank = |s: &String| !s.trim().is_empty();
        let text = self
            .connection_string
            .clone()
            .filter(not_blank)
            .or(fallback_connection.filter(not_blank))
            .ok_or(DeployError::MissingSetting("connection_string"))?;
        let connection = ConnectionString::parse(&text)?;

        let server_name = self
            .server
            .clone()
            .or_else(|| connection.server().map(str::to_string))
            .ok_or(DeployError::MissingSetting("server"))?;

        let base = ActionBase {
            server_name,
            connection,
            additional_arguments: self.additional_arguments.clone(),
        };
        Ok(ActionInputs::new(
            action_type,
            base,
            self.action_path(),
            package_action,
        ))
    }

    /// Check the file for mistakes without running anything.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let action_type = match self.action_type() {
            Ok(t) => Some(t),
            Err(e) => {
                warnings.push(ConfigWarning::error(e.to_string()));
                None
            }
        };

        match (&self.action.package_action, self.package_action(), action_type) {
            (None, _, _) => {}
            (Some(_), Err(e), _) => warnings.push(ConfigWarning::error(e.to_string())),
            (Some(_), Ok(_), Some(t)) if t != ActionType::Package => {
                warnings.push(ConfigWarning::warning(format!(
                    "package_action is ignored for '{t}' actions"
                )))
            }
            (Some(_), Ok(a), _) if a != PackageAction::Publish => warnings.push(
                ConfigWarning::error(DeployError::UnsupportedPackageAction(a).to_string()),
            ),
            _ => {}
        }

        let path = self.action_path();
        match action_type {
            Some(ActionType::Package) => {
                if !path.is_file() {
                    warnings.push(ConfigWarning::error(format!(
                        "package not found: {}",
                        path.display()
                    )));
                }
                if path.extension().and_then(|e| e.to_str()) != Some("dacpac") {
                    warnings.push(ConfigWarning::warning(format!(
                        "package '{}' does not end in .dacpac",
                        path.display()
                    )));
                }
            }
            Some(ActionType::SingleScript) => {
                if !path.is_file() {
                    warnings.push(ConfigWarning::error(format!(
                        "script not found: {}",
                        path.display()
                    )));
                }
            }
            Some(ActionType::FolderOfScripts) => {
                if !path.is_dir() {
                    warnings.push(ConfigWarning::error(format!(
                        "folder not found: {}",
                        path.display()
                    )));
                } else if !has_sql_entries(&path) {
                    warnings.push(ConfigWarning::warning(format!(
                        "folder '{}' contains no .sql files",
                        path.display()
                    )));
                }
            }
            None => {}
        }

        match self
            .connection_string
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            None => warnings.push(ConfigWarning::warning(format!(
                "no connection_string; it will be read from {CONNECTION_STRING_ENV}"
            ))),
            Some(text) => match ConnectionString::parse(text) {
                Ok(conn) => {
                    if self.server.is_none() && conn.server().is_none() {
                        warnings.push(ConfigWarning::error(
                            "no server: set 'server' or Server= in the connection string",
                        ));
                    }
                }
                Err(e) => warnings.push(ConfigWarning::error(e.to_string())),
            },
        }

        for (tool, configured) in [
            (Tool::SqlPackage, &self.tools.sqlpackage),
            (Tool::SqlCmd, &self.tools.sqlcmd),
        ] {
            if let Some(p) = configured {
                let resolved = self.resolve(p);
                if !resolved.is_file() {
                    warnings.push(ConfigWarning::error(format!(
                        "tools.{tool} does not exist: {}",
                        resolved.display()
                    )));
                }
            }
        }

        warnings
    }
}

fn has_sql_entries(folder: &Path) -> bool {
    std::fs::read_dir(folder)
        .map(|entries| {
            entries
                .flatten()
                .any(|e| dispatcher::is_script(&e.file_name()))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CS: &str = "Server=cs-server;Database=app;User Id=u;Password=p";

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = DeployConfig::load(&dir.path().join("deploy.yaml")).unwrap_err();
        assert!(matches!(err, DeployError::ConfigNotFound(_)));
    }

    #[test]
    fn load_bad_yaml_is_yaml_error() {
        let dir = TempDir::new().unwrap();
        let p = write(&dir, "deploy.yaml", "action: [unclosed");
        assert!(matches!(
            DeployConfig::load(&p).unwrap_err(),
            DeployError::Yaml(_)
        ));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let p = write(
            &dir,
            "deploy.yaml",
            "action:\n  type: script\n  path: sql/seed.sql\n",
        );
        let cfg = DeployConfig::load(&p).unwrap();
        assert_eq!(cfg.action_path(), dir.path().join("sql/seed.sql"));
    }

    #[test]
    fn into_inputs_builds_package_variant() {
        let cfg = DeployConfig::from_yaml(&format!(
            "server: explicit\nconnection_string: \"{CS}\"\naction:\n  type: package\n  path: /out/app.dacpac\nadditional_arguments: /p:x=1\n"
        ))
        .unwrap();
        let ActionInputs::Package(p) = cfg.into_inputs(None).unwrap() else {
            panic!("expected Package")
        };
        assert_eq!(p.package_action, PackageAction::Publish);
        assert_eq!(p.package_path, PathBuf::from("/out/app.dacpac"));
        assert_eq!(p.base.server_name, "explicit");
        assert_eq!(p.base.additional_arguments.as_deref(), Some("/p:x=1"));
    }

    #[test]
    fn server_falls_back_to_connection_string() {
        let cfg = DeployConfig::from_yaml("action:\n  type: folder\n  path: /sql\n").unwrap();
        let inputs = cfg.into_inputs(Some(CS.to_string())).unwrap();
        assert_eq!(inputs.action_type(), ActionType::FolderOfScripts);
        assert_eq!(inputs.base().server_name, "cs-server");
    }

    #[test]
    fn missing_connection_string_is_reported() {
        let cfg = DeployConfig::from_yaml("action:\n  type: script\n  path: a.sql\n").unwrap();
        let err = cfg.into_inputs(None).unwrap_err();
        assert!(matches!(err, DeployError::MissingSetting("connection_string")));
    }

    #[test]
    fn blank_connection_string_falls_back() {
        let cfg = DeployConfig::from_yaml(
            "connection_string: \"  \"\naction:\n  type: script\n  path: a.sql\n",
        )
        .unwrap();
        let inputs = cfg.into_inputs(Some(CS.to_string())).unwrap();
        assert_eq!(inputs.base().connection.database(), "app");

        let err = cfg.into_inputs(Some(String::new())).unwrap_err();
        assert!(matches!(err, DeployError::MissingSetting("connection_string")));

        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains(CONNECTION_STRING_ENV)));
    }

    #[test]
    fn invalid_action_type_is_reported_first() {
        let cfg = DeployConfig::from_yaml("action:\n  type: migrate\n  path: a.sql\n").unwrap();
        let err = cfg.into_inputs(None).unwrap_err();
        assert!(matches!(err, DeployError::InvalidActionType(ref t) if t == "migrate"));
    }

    #[test]
    fn debug_redacts_connection_string() {
        let cfg = DeployConfig::from_yaml(&format!(
            "connection_string: \"{CS}\"\naction:\n  type: script\n  path: a.sql\n"
        ))
        .unwrap();
        assert!(!format!("{cfg:?}").contains("Password=p"));
    }

    #[test]
    fn validate_flags_unsupported_package_action_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let p = write(
            &dir,
            "deploy.yaml",
            &format!(
                "connection_string: \"{CS}\"\naction:\n  type: package\n  path: app.zip\n  package_action: extract\n"
            ),
        );
        let warnings = DeployConfig::load(&p).unwrap().validate();
        let errors: Vec<&str> = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message.as_str())
            .collect();
        assert!(errors.iter().any(|m| m.contains("Not supported SqlPackage action: 'Extract'")));
        assert!(errors.iter().any(|m| m.contains("package not found")));
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains(".dacpac")));
    }

    #[test]
    fn validate_clean_folder_config_has_no_errors() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sql")).unwrap();
        write(&dir, "sql/001.sql", "select 1");
        let p = write(
            &dir,
            "deploy.yaml",
            &format!("connection_string: \"{CS}\"\naction:\n  type: folder\n  path: sql\n"),
        );
        let warnings = DeployConfig::load(&p).unwrap().validate();
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn validate_warns_on_folder_without_sql() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sql")).unwrap();
        write(&dir, "sql/readme.txt", "");
        write(&dir, "sql/upper.SQL", "");
        write(&dir, "sql/seed.sql.bak", "");
        let p = write(
            &dir,
            "deploy.yaml",
            &format!("connection_string: \"{CS}\"\naction:\n  type: folder\n  path: sql\n"),
        );
        let warnings = DeployConfig::load(&p).unwrap().validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("no .sql files"));
    }
}
