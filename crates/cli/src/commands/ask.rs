//! Ask command handler.

use super::{write_answer, PolicyArgs};
use clap::Args;
use policylens_core::{config::AppConfig, AppResult};
use policylens_qa::QueryEngine;
use std::io::Write;

/// Answer one question about a policy
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Also print the passages the answer was drawn from
    #[arg(long)]
    pub sources: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask options: {:?}", self);

        let document = self.policy.load(config)?;
        let engine = QueryEngine::load(config).await?;

        let result = engine.answer(&self.question, &document).await?;
        let reference = if result.is_answered() {
            None
        } else {
            engine.nearest_reference(&self.question).await?
        };

        if self.json {
            let output = serde_json::json!({
                "policy": document.name(),
                "result": result,
                "relatedQuestion": reference.as_ref().map(|r| r.question),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let mut out = std::io::stdout();
        write_answer(&mut out, &result)?;

        if let Some(reference) = reference {
            writeln!(out, "Try a related question: {}", reference.question)?;
        }

        if self.sources && !result.sources.is_empty() {
            writeln!(out, "\nSources:")?;
            for source in &result.sources {
                writeln!(
                    out,
                    "- passage {} (similarity {:.3}): {}",
                    source.passage.index, source.score, source.passage.text
                )?;
            }
        }

        Ok(())
    }
}
