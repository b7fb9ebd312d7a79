//! Session commands

use super::runtime::Runtime;
use anyhow::{bail, Context, Result};
use tally_core::SessionService;

pub async fn show() -> Result<()> {
    let runtime = Runtime::load().await?;
    let resolution = runtime.resolve().await?;

    let session = resolution.session();
    let output = serde_json::json!({
        "session_id": session.id,
        "created": resolution.was_created(),
        "state": session.state,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub async fn list() -> Result<()> {
    let runtime = Runtime::load().await?;
    let sessions = runtime
        .service
        .list_sessions(&runtime.config.app.name, &runtime.config.app.user_id)
        .await
        .context("Failed to list sessions")?;
    println!("{}", serde_json::to_string_pretty(&sessions)?);
    Ok(())
}

pub async fn call(tool: &str, input: &str) -> Result<()> {
    let input: serde_json::Value =
        serde_json::from_str(input).context("Tool input is not valid JSON")?;
    if !input.is_object() {
        bail!("Tool input must be a JSON object");
    }

    let runtime = Runtime::load().await?;
    let resolution = runtime.resolve().await?;
    let dispatcher = runtime.dispatcher();

    let result = dispatcher
        .call(resolution.session_id(), tool, input)
        .await
        .with_context(|| format!("Failed to run tool '{}'", tool))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
