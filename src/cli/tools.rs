use super::runtime::build_runner;
use crate::config::load_config;

pub async fn run() -> anyhow::Result<()> {
    let config = load_config()?;
    let runner = build_runner(&config);
    let specs = runner.registry().to_function_specs();
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}
