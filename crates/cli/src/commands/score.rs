//! Score command handler.

use super::PolicyArgs;
use clap::Args;
use policylens_core::{config::AppConfig, AppResult};
use policylens_qa::risk::{self, RuleSet};

/// Privacy risk score of a policy
#[derive(Args, Debug)]
pub struct ScoreCommand {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ScoreCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing score command");

        let document = self.policy.load(config)?;
        let rules = RuleSet::from_settings(&config.risk);
        let report = risk::report(document.text(), &rules);

        if self.json {
            let output = serde_json::json!({
                "policy": document.name(),
                "score": report.score,
                "baseline": report.baseline,
                "fired": report.fired,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("Privacy Risk Score for {}: {}", document.name(), report.score);
        if report.fired.is_empty() {
            println!("  No rules matched (baseline {})", report.baseline);
        } else {
            for rule in &report.fired {
                println!("  {:+4}  {}", rule.weight, rule.phrase);
            }
        }

        Ok(())
    }
}
