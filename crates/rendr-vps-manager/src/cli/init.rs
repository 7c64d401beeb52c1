/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When ManagerConfig schema changes
*/

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use std::path::PathBuf;

use rendr_vps_manager::ManagerConfig;

pub fn run_init(output: PathBuf) -> Result<()> {
    println!("{}", style("Welcome to RendR VPS Manager Init").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a manager configuration.").dim()
    );

    let theme = ColorfulTheme::default();
    let defaults = ManagerConfig::default();

    println!("\n{}", style("--- Backend ---").bold());
    let api_url: String = Input::with_theme(&theme)
        .with_prompt("Backend URL")
        .default(defaults.api_url.clone())
        .interact_text()?;

    let vps_api_key: String = Password::with_theme(&theme)
        .with_prompt("VPS API key")
        .interact()?;

    let polling_interval: u64 = Input::with_theme(&theme)
        .with_prompt("Polling interval (seconds)")
        .default(defaults.polling_interval)
        .interact_text()?;

    println!("\n{}", style("--- Terminals ---").bold());
    let mt4_path = prompt_path(&theme, "MT4 template directory", &defaults.mt4_path)?;
    let mt4_ea_path = prompt_path(&theme, "MT4 EA file", &defaults.mt4_ea_path)?;
    let mt5_path = prompt_path(&theme, "MT5 template directory", &defaults.mt5_path)?;
    let mt5_ea_path = prompt_path(&theme, "MT5 EA file", &defaults.mt5_ea_path)?;
    let terminals_base_path = prompt_path(
        &theme,
        "Instance base directory",
        &defaults.terminals_base_path,
    )?;

    let config = ManagerConfig {
        api_url,
        vps_api_key,
        polling_interval,
        mt4_path,
        mt5_path,
        mt4_ea_path,
        mt5_ea_path,
        terminals_base_path,
        ..defaults
    };
    config.validate().context("generated configuration is invalid")?;

    let yaml = serde_yaml::to_string(&config).context("failed to serialize config to YAML")?;

    std::fs::write(&output, yaml)
        .with_context(|| format!("failed to write config to {}", output.display()))?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!(
        "Configuration written to: {}",
        style(output.display()).cyan()
    );

    Ok(())
}

fn prompt_path(theme: &ColorfulTheme, prompt: &str, default: &std::path::Path) -> Result<PathBuf> {
    let value: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .default(default.display().to_string())
        .interact_text()?;
    Ok(PathBuf::from(value))
}
