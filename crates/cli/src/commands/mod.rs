//! Subcommand implementations and the helpers they share.

pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod models;

use std::path::{Path, PathBuf};

use chathub_config::AppConfig;
use chathub_core::model::ModelTier;

/// Load the config for a session, failing early with setup help when no
/// API key is available.
pub fn load_session_config(
    model: Option<ModelTier>,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(tier) = model {
        config.default_model = tier;
    }

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    CHATHUB_API_KEY     (highest priority)");
        eprintln!("    OPENROUTER_API_KEY  (recommended)");
        eprintln!("    OPENAI_API_KEY");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    Ok(config)
}

/// File extension for an image payload, sniffed from its magic bytes.
pub fn image_extension(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "png",
        [0xFF, 0xD8, 0xFF, ..] => "jpg",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "webp",
        _ => "bin",
    }
}

/// Write a generated image into `dir` under a fresh name.
pub fn save_image(dir: &Path, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let name = format!(
        "chathub-{}.{}",
        &uuid::Uuid::new_v4().simple().to_string()[..8],
        image_extension(bytes)
    );
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}
