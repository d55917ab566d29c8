//! List command handler.

use clap::Args;
use policylens_core::{config::AppConfig, AppResult};
use policylens_source::PolicyStore;

/// List saved policies
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing list command");

        let store = PolicyStore::new(config.output_dir());
        let saved = store.list()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&saved)?);
            return Ok(());
        }

        if saved.is_empty() {
            println!("No saved policies in {}", store.dir().display());
            return Ok(());
        }

        for policy in &saved {
            let saved_at = policy
                .saved_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{:<40} {:>10} bytes  {}", policy.name, policy.size_bytes, saved_at);
        }

        Ok(())
    }
}
