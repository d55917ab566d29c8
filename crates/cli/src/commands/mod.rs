//! Command handlers for the PolicyLens CLI.

pub mod analyze;
pub mod ask;
pub mod list;
pub mod score;

pub use analyze::AnalyzeCommand;
pub use ask::AskCommand;
pub use list::ListCommand;
pub use score::ScoreCommand;

use clap::Args;
use policylens_core::{config::AppConfig, AppResult};
use policylens_qa::{AnswerResult, Document};
use policylens_source::store::{self, PolicyStore};
use std::io::Write;
use std::path::PathBuf;

/// Which policy a command works on.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct PolicyArgs {
    /// Policy text file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Name of a saved policy (see `policylens list`)
    #[arg(short, long)]
    pub name: Option<String>,
}

impl PolicyArgs {
    pub fn load(&self, config: &AppConfig) -> AppResult<Document> {
        match (&self.file, &self.name) {
            (Some(path), _) => load_file(path),
            (None, Some(name)) => {
                let text = PolicyStore::new(config.output_dir()).load(name)?;
                Ok(Document::new(name.clone(), text))
            }
            (None, None) => Err(policylens_core::AppError::Config(
                "Either --file or --name is required".to_string(),
            )),
        }
    }
}

/// Read a policy file; saved artifacts keep their site name.
pub fn load_file(path: &std::path::Path) -> AppResult<Document> {
    let text = store::read_text(path)?;
    let name = store::name_from_path(path).unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "policy".to_string())
    });

    tracing::debug!("Loaded '{}' from {:?} ({} bytes)", name, path, text.len());
    Ok(Document::new(name, text))
}

/// Human-readable answer block.
pub fn write_answer(out: &mut impl Write, result: &AnswerResult) -> std::io::Result<()> {
    writeln!(out, "{}", result.answer)?;
    if let Some(score) = result.score {
        writeln!(out, "   (confidence {:.2})", score)?;
    }
    Ok(())
}
