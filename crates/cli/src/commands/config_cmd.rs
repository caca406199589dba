//! `agentloop config`: Show the effective configuration.

use agentloop_config::AppConfig;
use anyhow::Context;

pub fn run(default: bool) -> anyhow::Result<()> {
    if default {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = AppConfig::load().context("failed to load configuration")?;
    let path = AppConfig::config_dir().join("config.toml");

    println!("Config file: {}", path.display());
    println!("API URL:     {}", config.api_url);
    println!("Model:       {}", config.model);
    println!("Temperature: {}", config.temperature);
    println!(
        "API key:     {}",
        if config.api_key.is_some() { "set" } else { "NOT SET" }
    );
    println!(
        "Max rounds:  {}",
        config
            .agent
            .max_rounds
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
    );
    println!("Concurrent:  {}", config.agent.concurrent_tools);
    Ok(())
}
