use crate::output::print_json;
use sprout_sdk::{Prompt, PromptPurpose};
use std::path::Path;

pub fn run(root: &Path, purpose: PromptPurpose, text: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let prompt = Prompt {
        purpose,
        text: text.to_string(),
    };
    let reply = config.run_prompt(&prompt)?;

    if json {
        let value = serde_json::json!({
            "purpose": purpose,
            "reply": reply,
        });
        return print_json(&value);
    }
    println!("{reply}");
    Ok(())
}
