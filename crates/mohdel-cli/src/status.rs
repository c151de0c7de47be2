//! `mohdel status`: show configuration and provider status.
//!
//! - Shows config path, catalog path, default model, timeout
//! - Shows credential status, budget field and API base for each provider

use anyhow::Result;
use colored::Colorize;

use mohdel_core::config::{get_config_path, Config};
use mohdel_core::utils::{expand_home, get_catalog_path};
use mohdel_core::{CredentialSource, EnvFileCredentials};
use mohdel_providers::ProviderRegistry;

/// Run the status command.
pub fn run(config: &Config) -> Result<()> {
    let config_path = get_config_path();
    let catalog_path = config
        .catalog_path
        .as_deref()
        .map(expand_home)
        .unwrap_or_else(get_catalog_path);

    println!();
    println!("{}", "Mohdel Status".cyan().bold());
    println!();

    for (label, path) in [("Config:", &config_path), ("Catalog:", &catalog_path)] {
        println!(
            "  {:<18} {} {}",
            label.bold(),
            path.display(),
            if path.exists() {
                "✓".green().to_string()
            } else {
                "(not found)".red().to_string()
            }
        );
    }

    println!(
        "  {:<18} {}",
        "Default model:".bold(),
        config.default_model.as_deref().unwrap_or("(none)")
    );
    println!(
        "  {:<18} {}",
        "Timeout:".bold(),
        format!("{}s", config.timeout_secs).dimmed()
    );

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    let registry = ProviderRegistry::from_config(config);
    let credentials = EnvFileCredentials::load_default();

    for spec in registry.iter() {
        let status = if credentials.get_credential(spec.env_key).is_some() {
            format!("{} (key set)", "✓".green())
        } else {
            format!("{}", format!("· {} not set", spec.env_key).dimmed())
        };
        let base = registry.api_base(spec.name).unwrap_or(spec.default_api_base);
        println!(
            "    {:<12} {:<10} {:<22} {:<28} {}",
            spec.display_name,
            spec.adapter.as_str(),
            spec.budget_field,
            status,
            base.dimmed()
        );
    }

    println!();

    Ok(())
}
