use crate::output::{print_json, print_table};
use dbdeploy_core::tools::{SystemToolLocator, Tool, ToolSource};
use std::path::PathBuf;

/// Show where sqlpackage and sqlcmd resolve on this machine.
pub fn run(
    sqlpackage: Option<PathBuf>,
    sqlcmd: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let locator = SystemToolLocator::from_env()
        .with_override(Tool::SqlPackage, sqlpackage)
        .with_override(Tool::SqlCmd, sqlcmd);

    let results: Vec<_> = Tool::all()
        .iter()
        .map(|tool| (*tool, locator.resolve(*tool)))
        .collect();

    if json {
        let items: Vec<serde_json::Value> = results
            .iter()
            .map(|(tool, r)| match r {
                Ok(res) => serde_json::json!({
                    "tool": tool,
                    "path": res.path,
                    "source": res.source,
                }),
                Err(e) => serde_json::json!({
                    "tool": tool,
                    "error": e.to_string(),
                }),
            })
            .collect();
        return print_json(&items);
    }

    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|(tool, r)| match r {
            Ok(res) => vec![
                tool.to_string(),
                source_label(res.source).to_string(),
                res.path.display().to_string(),
            ],
            Err(e) => vec![tool.to_string(), "missing".to_string(), e.to_string()],
        })
        .collect();
    print_table(&["TOOL", "SOURCE", "PATH"], &rows);
    Ok(())
}

fn source_label(source: ToolSource) -> &'static str {
    match source {
        ToolSource::Override => "override",
        ToolSource::Path => "PATH",
        ToolSource::WellKnown => "install dir",
    }
}
