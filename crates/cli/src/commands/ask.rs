//! `chathub ask`: one message, one reply. A failed turn exits non-zero.

use chathub_agent::ChatEngine;
use chathub_core::model::ModelTier;
use chathub_core::session::SessionState;

pub async fn run(model: Option<ModelTier>, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_session_config(model)?;
    let engine = ChatEngine::from_config(&config);
    let mut session = SessionState::new(config.default_model);
    let image_dir = std::env::current_dir()?;

    super::chat::run_turn(&engine, &mut session, message, &image_dir).await?;
    Ok(())
}
