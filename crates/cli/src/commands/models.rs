//! `chathub models`: list model tiers.

use chathub_config::AppConfig;
use chathub_core::model::ModelTier;

/// One table row per tier, marking the session default.
pub fn rows(config: &AppConfig) -> Vec<String> {
    ModelTier::ALL
        .iter()
        .map(|&tier| {
            let marker = if tier == config.default_model { "*" } else { " " };
            format!("{marker} {:<6} {}", tier.label(), config.model_id(tier))
        })
        .collect()
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Model tiers (* = default)");
    println!();
    for row in rows(&config) {
        println!("  {row}");
    }
    println!();
    println!("  Images:  {}", config.image_model);
    println!("  Memory:  {}", config.memory.model);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tier_is_marked() {
        let rows = rows(&AppConfig::default());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], "* Lite   openai/gpt-3.5-turbo");
        assert_eq!(rows[2], "  Smart  openai/gpt-4o");
    }
}
