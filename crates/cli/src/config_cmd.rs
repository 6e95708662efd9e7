use anyhow::{Context, Result};
use replydesk_runtime_config::{
    ConsoleConfig, SERVER_URL_ENV, apply_compat_fallbacks, config_path, load_from, save_to,
};

pub fn show_config() -> Result<()> {
    let path = config_path()?;
    let config = load_from(&path)?;
    println!("Config file: {}", path.display());
    println!();
    print_config(&config);
    if let Ok(url) = std::env::var(SERVER_URL_ENV) {
        println!();
        println!("{SERVER_URL_ENV} is set and overrides the url: {url}");
    }
    Ok(())
}

fn print_config(config: &ConsoleConfig) {
    println!("[server]");
    println!("  url          = {}", config.server.url);
    println!("  timeout_secs = {}", config.server.timeout_secs);
    println!();
    println!("[lists]");
    println!("  debounce_ms          = {}", config.lists.debounce_ms);
    println!("  client_side_max_rows = {}", config.lists.client_side_max_rows);
}

/// Update config with provided values.
pub fn set_config(
    server_url: Option<String>,
    timeout_secs: Option<u64>,
    debounce_ms: Option<u64>,
) -> Result<()> {
    let path = config_path()?;
    let mut config = load_from(&path)?;

    if let Some(url) = server_url {
        config.server.url = url;
    }
    if let Some(secs) = timeout_secs {
        config.server.timeout_secs = secs;
    }
    if let Some(ms) = debounce_ms {
        config.lists.debounce_ms = ms;
    }
    apply_compat_fallbacks(&mut config);

    save_to(&config, &path)
        .with_context(|| format!("Failed to save config to {}", path.display()))?;
    println!("Configuration updated.");
    show_config()
}
