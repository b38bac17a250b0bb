//! Argument strings for the two external tools.
//!
//! sqlpackage:
//! `/Action:Publish /TargetConnectionString:"<cs>" /SourceFile:"<package>" [extra]`
//!
//! sqlcmd:
//! `-S <server> -d <database> -U "<user>" -P "<password>" -i "<file>" [extra]`

use std::path::Path;

use dbdeploy_process::CommandLine;
use secrecy::ExposeSecret;

use crate::error::{DeployError, Result};
use crate::inputs::{ActionBase, PackageInputs};
use crate::types::PackageAction;

pub fn sqlpackage_arguments(inputs: &PackageInputs) -> Result<String> {
    let mut args = match inputs.package_action {
        PackageAction::Publish => format!(
            "/Action:Publish /TargetConnectionString:\"{}\" /SourceFile:\"{}\"",
            inputs.base.connection.expose_connection_string(),
            inputs.package_path.display()
        ),
        other => return Err(DeployError::UnsupportedPackageAction(other)),
    };
    append_additional(&mut args, inputs.base.additional_arguments.as_deref());
    Ok(args)
}

pub fn sqlcmd_arguments(base: &ActionBase, script: &Path) -> String {
    let conn = &base.connection;
    let credentials = if conn.is_trusted() {
        "-E".to_string()
    } else {
        format!(
            "-U \"{}\" -P \"{}\"",
            conn.user_id().unwrap_or_default(),
            conn.password().map(|p| p.expose_secret()).unwrap_or_default()
        )
    };
    let mut args = format!(
        "-S {} -d {} {} -i \"{}\"",
        base.server_name,
        conn.database(),
        credentials,
        script.display()
    );
    append_additional(&mut args, base.additional_arguments.as_deref());
    args
}

pub fn sqlpackage_command(tool: &Path, inputs: &PackageInputs) -> Result<CommandLine> {
    let args = sqlpackage_arguments(inputs)?;
    Ok(masked(CommandLine::new(tool, args), &inputs.base))
}

pub fn sqlcmd_command(tool: &Path, base: &ActionBase, script: &Path) -> CommandLine {
    masked(CommandLine::new(tool, sqlcmd_arguments(base, script)), base)
}

/// Masks the password as written (sqlpackage sees the raw connection
/// string) before the unquoted value (sqlcmd sees that one).
fn masked(cmd: CommandLine, base: &ActionBase) -> CommandLine {
    let conn = &base.connection;
    match (conn.password_source(), conn.password()) {
        (Some(source), Some(p)) => cmd.mask(source.expose_secret()).mask(p.expose_secret()),
        _ => cmd,
    }
}

fn append_additional(args: &mut String, additional: Option<&str>) {
    if let Some(extra) = additional.filter(|a| !a.is_empty()) {
        args.push(' ');
        args.push_str(extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionString;
    use std::path::PathBuf;

    const CS: &str = "Server=srv;Database=appdb;User Id=deployer;Password=Pa55word";

    fn base(extra: Option<&str>) -> ActionBase {
        ActionBase {
            server_name: "srv.example.net".into(),
            connection: ConnectionString::parse(CS).unwrap(),
            additional_arguments: extra.map(str::to_string),
        }
    }

    fn package(action: PackageAction, extra: Option<&str>) -> PackageInputs {
        PackageInputs {
            base: base(extra),
            package_path: PathBuf::from("out/app.dacpac"),
            package_action: action,
        }
    }

    #[test]
    fn publish_arguments_exact() {
        let args = sqlpackage_arguments(&package(PackageAction::Publish, None)).unwrap();
        assert_eq!(
            args,
            format!(r#"/Action:Publish /TargetConnectionString:"{CS}" /SourceFile:"out/app.dacpac""#)
        );
    }

    #[test]
    fn publish_appends_additional_arguments() {
        let args = sqlpackage_arguments(&package(
            PackageAction::Publish,
            Some("/p:BlockOnPossibleDataLoss=false"),
        ))
        .unwrap();
        assert!(args.ends_with(r#"/SourceFile:"out/app.dacpac" /p:BlockOnPossibleDataLoss=false"#));
    }

    #[test]
    fn empty_additional_arguments_append_nothing() {
        let args = sqlpackage_arguments(&package(PackageAction::Publish, Some(""))).unwrap();
        assert!(args.ends_with(r#"/SourceFile:"out/app.dacpac""#));
    }

    #[test]
    fn every_other_package_action_is_rejected_by_name() {
        for action in PackageAction::all()
            .iter()
            .copied()
            .filter(|a| *a != PackageAction::Publish)
        {
            let err = sqlpackage_arguments(&package(action, None)).unwrap_err();
            assert!(matches!(err, DeployError::UnsupportedPackageAction(a) if a == action));
            assert_eq!(
                err.to_string(),
                format!("Not supported SqlPackage action: '{}'", action.as_str())
            );
        }
    }

    #[test]
    fn sqlcmd_arguments_exact() {
        let args = sqlcmd_arguments(&base(None), Path::new("scripts/seed.sql"));
        assert_eq!(
            args,
            r#"-S srv.example.net -d appdb -U "deployer" -P "Pa55word" -i "scripts/seed.sql""#
        );
    }

    #[test]
    fn sqlcmd_embeds_each_connection_field_once() {
        let args = sqlcmd_arguments(&base(Some("-b -V 16")), Path::new("x.sql"));
        for needle in ["srv.example.net", "appdb", "\"deployer\"", "\"Pa55word\""] {
            assert_eq!(args.matches(needle).count(), 1, "{needle} in {args}");
        }
        assert!(args.ends_with(r#"-i "x.sql" -b -V 16"#));
    }

    #[test]
    fn sqlcmd_trusted_connection_uses_e_flag() {
        let b = ActionBase {
            server_name: "srv".into(),
            connection: ConnectionString::parse("Server=srv;Database=d;Trusted_Connection=yes")
                .unwrap(),
            additional_arguments: None,
        };
        assert_eq!(
            sqlcmd_arguments(&b, Path::new("a.sql")),
            r#"-S srv -d d -E -i "a.sql""#
        );
    }

    #[test]
    fn commands_mask_password_when_rendered() {
        let cmd = sqlcmd_command(Path::new("/opt/sqlcmd"), &base(None), Path::new("a.sql"));
        assert!(cmd.args().contains("Pa55word"));
        assert!(!cmd.to_string().contains("Pa55word"));

        let cmd = sqlpackage_command(
            Path::new("/opt/sqlpackage"),
            &package(PackageAction::Publish, None),
        )
        .unwrap();
        assert!(!cmd.to_string().contains("Pa55word"));
    }

    #[test]
    fn quoted_password_is_masked_in_every_form() {
        let conn =
            ConnectionString::parse("Server=s;Database=d;User Id=u;Password='hun''ter2'").unwrap();
        let inputs = PackageInputs {
            base: ActionBase {
                server_name: "s".into(),
                connection: conn,
                additional_arguments: None,
            },
            package_path: PathBuf::from("app.dacpac"),
            package_action: PackageAction::Publish,
        };

        let cmd = sqlpackage_command(Path::new("/opt/sqlpackage"), &inputs).unwrap();
        assert!(cmd.args().contains("'hun''ter2'"));
        let rendered = cmd.to_string();
        assert!(!rendered.contains("ter2"), "{rendered}");

        let cmd = sqlcmd_command(Path::new("/opt/sqlcmd"), &inputs.base, Path::new("a.sql"));
        assert!(cmd.args().contains("\"hun'ter2\""));
        let rendered = cmd.to_string();
        assert!(!rendered.contains("ter2"), "{rendered}");
    }
}
