//! Configuration inspection commands.

use anyhow::{Context, Result, bail};
use bqgate_config::{Config, LoadOptions, ResolvedConfig};

use crate::theme::Theme;

/// Show the resolved configuration and where each value came from.
pub(crate) fn show_config(options: &LoadOptions, format: &str) -> Result<()> {
    let resolved = Config::load(options).context("failed to load configuration")?;

    let rendered = match format {
        "json" => serde_json::to_string_pretty(&resolved.config)?,
        "toml" => toml::to_string_pretty(&resolved.config)?,
        other => bail!("unknown format '{other}'; expected toml or json"),
    };
    println!("{rendered}");

    println!("{}", Theme::header("Sources"));
    for line in source_lines(&resolved) {
        println!("  {line}");
    }
    Ok(())
}

/// Load and validate the configuration, listing the files that contributed.
pub(crate) fn validate_config(options: &LoadOptions) -> Result<()> {
    let resolved = Config::load(options).context("configuration is invalid")?;

    println!("{}", Theme::success("Configuration is valid."));
    if !resolved.loaded_files.is_empty() {
        println!("\nLoaded files:");
        for path in &resolved.loaded_files {
            println!("  - {path}");
        }
    }
    Ok(())
}

fn source_lines(resolved: &ResolvedConfig) -> Vec<String> {
    let mut fields: Vec<_> = resolved.field_sources.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    fields
        .into_iter()
        .map(|(field, layer)| format!("{field} = {}", Theme::dimmed(&layer.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_sources_name_the_layer() {
        colored::control::set_override(false);
        let home = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(workspace.path().join(".bqgate")).unwrap();
        std::fs::write(
            workspace.path().join(".bqgate/config.toml"),
            "[gateway]\napproval = \"elicitation\"\n",
        )
        .unwrap();

        let options = LoadOptions {
            workspace_root: Some(workspace.path().to_path_buf()),
            home_override: Some(home.path().to_path_buf()),
            explicit: None,
        };
        let resolved =
            bqgate_config::loader::load_with_env(&options, &HashMap::<String, String>::new())
                .unwrap();

        let lines = source_lines(&resolved);
        assert!(lines.contains(&"gateway.approval = workspace (.bqgate/config.toml)".to_owned()));
        assert!(lines.contains(&"gateway.dry_run = defaults".to_owned()));
        assert!(lines.windows(2).all(|w| w[0] <= w[1]));
    }
}
