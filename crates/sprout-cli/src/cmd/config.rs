use crate::output::print_json;
use clap::Subcommand;
use sprout_core::{ConfigSummary, Fingerprint};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Compile if needed, load the configuration and show which collaborators it provides
    Check,

    /// Show the workspace, artifact and cache state without compiling
    Path,

    /// Discard the cached build and load again
    Rebuild,

    /// Delete the project's workspace
    Clean,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Check => check(root, json),
        ConfigSubcommand::Path => path(root, json),
        ConfigSubcommand::Rebuild => rebuild(root, json),
        ConfigSubcommand::Clean => clean(root, json),
    }
}

// ---------------------------------------------------------------------------
// check / rebuild
// ---------------------------------------------------------------------------

fn check(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    print_summary(&config.summary(), json)
}

fn rebuild(root: &Path, json: bool) -> anyhow::Result<()> {
    let loader = super::loader(root)?;
    loader.invalidate()?;
    let config = super::load(&loader)?;
    print_summary(&config.summary(), json)
}

fn print_summary(summary: &ConfigSummary, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(summary);
    }

    let build = if summary.origin.recompiled {
        "compiled"
    } else {
        "cached"
    };
    println!(
        "Config {} ({build}, {})",
        summary.origin.source.display(),
        summary.origin.fingerprint
    );
    println!();

    for line in slot_lines(summary) {
        println!("{line}");
    }
    Ok(())
}

/// One line per collaborator slot: name, collaborator (or `-` when empty)
/// and a `(default)` marker for slots the host filled in.
fn slot_lines(summary: &ConfigSummary) -> Vec<String> {
    let mut slots: Vec<(String, Option<&str>)> =
        vec![("ticket_source".into(), summary.ticket_source.as_deref())];
    for purpose in sprout_sdk::PromptPurpose::all() {
        let model = summary.language_models.get(purpose.as_str());
        slots.push((format!("llm.{purpose}"), model.map(String::as_str)));
    }
    slots.push(("version_control".into(), Some(summary.version_control.as_str())));
    slots.push(("renderer".into(), Some(summary.renderer.as_str())));

    let width = slots.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    slots
        .iter()
        .map(|(name, value)| {
            let value = value.unwrap_or("-");
            if summary.defaulted.iter().any(|d| *d == name.as_str()) {
                format!("{name:<width$}  {value} (default)")
            } else {
                format!("{name:<width$}  {value}")
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// path
// ---------------------------------------------------------------------------

fn path(root: &Path, json: bool) -> anyhow::Result<()> {
    let status = super::loader(root)?.inspect()?;

    if json {
        let value = serde_json::json!({
            "status": status,
            "fresh": status.is_fresh(),
        });
        return print_json(&value);
    }

    let show = |fp: Option<Fingerprint>| fp.map_or_else(|| "-".to_string(), |f| f.to_string());
    println!("source:      {}", status.source.display());
    println!("workspace:   {}", status.workspace.display());
    println!("artifact:    {}", status.artifact.display());
    println!("fingerprint: {}", status.fingerprint_file.display());
    println!("current:     {}", show(status.current));
    println!("recorded:    {}", show(status.recorded));
    let state = if status.is_fresh() {
        "fresh"
    } else if status.current.is_none() {
        "no source"
    } else {
        "stale, next load recompiles"
    };
    println!("cache:       {state}");
    Ok(())
}

// ---------------------------------------------------------------------------
// clean
// ---------------------------------------------------------------------------

fn clean(root: &Path, json: bool) -> anyhow::Result<()> {
    let loader = super::loader(root)?;
    let status = loader.inspect()?;
    let removed = loader.clean()?;

    if json {
        let value = serde_json::json!({
            "workspace": status.workspace,
            "removed": removed,
        });
        return print_json(&value);
    }
    if removed {
        println!("Removed {}", status.workspace.display());
    } else {
        println!("Nothing to remove at {}", status.workspace.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_core::LoadOrigin;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn summary() -> ConfigSummary {
        ConfigSummary {
            origin: LoadOrigin {
                source: PathBuf::from("/p/sprout.config.rs"),
                artifact: PathBuf::from("/w/libsprout_config.so"),
                fingerprint: Fingerprint::of(b"src"),
                recompiled: false,
            },
            ticket_source: None,
            language_models: BTreeMap::from([("code".to_string(), "echo".to_string())]),
            version_control: "git".into(),
            renderer: "generic".into(),
            defaulted: vec!["version_control", "renderer"],
        }
    }

    #[test]
    fn slot_lines_align_and_mark_defaults() {
        let lines = slot_lines(&summary());
        assert_eq!(lines[0], "ticket_source    -");
        assert!(lines.contains(&"llm.code         echo".to_string()), "{lines:?}");
        assert!(lines.contains(&"version_control  git (default)".to_string()));
        assert_eq!(lines.last().unwrap(), "renderer         generic (default)");
    }
}
