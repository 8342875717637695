use crate::output::print_json;
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, query: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let source = config.ticket_source()?;
    let tasks = source
        .fetch_tasks(query)
        .with_context(|| format!("{} could not fetch tasks", source.name()))?;

    if json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("No tasks match '{query}'.");
        return Ok(());
    }
    for choice in config.renderer().render_tasks(&tasks) {
        println!("{}", choice.label);
        if let Some(url) = &choice.task.url {
            println!("   {url}");
        }
    }
    Ok(())
}
