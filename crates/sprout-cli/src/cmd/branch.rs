use crate::output::print_json;
use anyhow::Context;
use sprout_sdk::IssueBranch;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let vcs = config.version_control();
    let branch = vcs
        .current_branch()
        .with_context(|| format!("{} could not read the current branch", vcs.name()))?;
    let issue = IssueBranch::parse(&branch).ok();

    if json {
        let value = serde_json::json!({
            "branch": branch,
            "issue": issue.as_ref().map(|i| serde_json::json!({
                "change_type": i.change_type.as_str(),
                "issue_id": i.issue_id,
                "description": i.description,
            })),
        });
        return print_json(&value);
    }

    println!("{branch}");
    if let Some(issue) = issue {
        println!(
            "  {} ({}) for {}",
            issue.change_type,
            issue.change_type.description(),
            issue.issue_id
        );
    }
    Ok(())
}
