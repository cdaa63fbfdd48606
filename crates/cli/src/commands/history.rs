//! `zaprelay history`: Print the context window a contact would start with.

use std::sync::Arc;
use zaprelay_config::AppConfig;
use zaprelay_memory::{ConversationLog, HistoryAssembler};

pub async fn run(contact: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let log = Arc::new(ConversationLog::new(config.storage.log_dir()));
    let path = log.path_for(contact);
    let history = HistoryAssembler::new(
        log,
        config.history.seed_lines,
        config.history.surfaced_turns,
        &config.agent.persona_name,
    );

    let turns = history.retained(contact).await;
    println!("💬 History for {contact}");
    println!("   File: {}", path.display());
    println!(
        "   Turns: {} (the agent sees the last {})\n",
        turns.len(),
        config.history.surfaced_turns
    );
    for turn in &turns {
        println!("  {}", turn.context_line());
    }

    Ok(())
}
