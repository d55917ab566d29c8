//! Analyze command handler.
//!
//! Full session: get the policy, answer the major questions, print the risk
//! score, then take free-text questions until `exit`.

use super::{load_file, write_answer};
use clap::Args;
use policylens_core::{config::AppConfig, AppError, AppResult};
use policylens_qa::risk::{self, RiskReport, RuleSet};
use policylens_qa::{AnswerResult, Document, QueryEngine, MAJOR_QUESTIONS};
use policylens_source::{PolicyFetcher, PolicyStore};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Typed at the question prompt to end the session (any case).
pub const EXIT_COMMAND: &str = "exit";

/// Analyze a website's privacy policy
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Website URL (prompted for when omitted)
    pub url: Option<String>,

    /// Analyze a local policy text file instead of fetching
    #[arg(short, long, conflicts_with = "url")]
    pub file: Option<PathBuf>,

    /// Skip the interactive question loop
    #[arg(long)]
    pub no_interactive: bool,

    /// Output the report as JSON (implies --no-interactive)
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing analyze command");
        tracing::debug!("Analyze options: {:?}", self);

        let mut input = BufReader::new(tokio::io::stdin());
        let (document, saved_to) = self.acquire(config, &mut input).await?;

        let engine = QueryEngine::load(config).await?;
        let answers = answer_major_questions(&engine, &document).await?;
        let report = risk::report(document.text(), &RuleSet::from_settings(&config.risk));

        if self.json {
            let output = serde_json::json!({
                "site": document.name(),
                "savedTo": saved_to,
                "analyzable": !answers.is_empty(),
                "answers": answers,
                "risk": report,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let mut out = std::io::stdout();
        write_summary(&mut out, &document, &answers, &report)?;

        if self.no_interactive || answers.is_empty() {
            return Ok(());
        }

        let asked = run_repl(&engine, &document, &mut input, &mut out).await?;
        tracing::info!("Interactive session ended after {} questions", asked);

        Ok(())
    }

    /// Load the policy from `--file`, or fetch and save it.
    async fn acquire<R: AsyncBufRead + Unpin>(
        &self,
        config: &AppConfig,
        input: &mut R,
    ) -> AppResult<(Document, Option<PathBuf>)> {
        if let Some(ref path) = self.file {
            return Ok((load_file(path)?, None));
        }

        let site = match self.url {
            Some(ref url) => url.trim().to_string(),
            None if self.no_interactive || self.json => {
                return Err(AppError::Config(
                    "A website URL or --file is required".to_string(),
                ));
            }
            None => {
                print!("Enter website URL: ");
                std::io::stdout().flush()?;
                let mut line = String::new();
                input.read_line(&mut line).await?;
                line.trim().to_string()
            }
        };

        if site.is_empty() {
            return Err(AppError::Config("No website URL given".to_string()));
        }

        let policy = PolicyFetcher::new()?.fetch(&site).await?;
        let path = PolicyStore::new(config.output_dir()).save(&policy.name, &policy.text)?;

        if !self.json {
            println!("Privacy policy saved at: {}", path.display());
        }

        Ok((Document::new(policy.name, policy.text), Some(path)))
    }
}

/// Answers to the major questions, or none when the document has no usable
/// passages.
async fn answer_major_questions(
    engine: &QueryEngine,
    document: &Document,
) -> AppResult<Vec<AnswerResult>> {
    match engine.prepare(document) {
        Ok(_) => engine.batch_answer(&MAJOR_QUESTIONS, document).await,
        Err(AppError::NoContentAvailable(reason)) => {
            tracing::warn!("Skipping questions: {}", reason);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

fn write_summary(
    out: &mut impl Write,
    document: &Document,
    answers: &[AnswerResult],
    report: &RiskReport,
) -> AppResult<()> {
    writeln!(out, "\nPolicy: {}\n", document.name())?;

    if answers.is_empty() {
        writeln!(out, "Cannot analyze this document: it has no usable passages.\n")?;
    }

    for (i, result) in answers.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, result.question)?;
        write!(out, "   ")?;
        write_answer(out, result)?;
        writeln!(out)?;
    }

    writeln!(
        out,
        "Privacy Risk Score for {}: {}",
        document.name(),
        report.score
    )?;
    for rule in &report.fired {
        writeln!(out, "  {:+4}  {}", rule.weight, rule.phrase)?;
    }

    Ok(())
}

/// Answer questions read from `input` until `exit` or end of input.
///
/// Returns how many questions were answered.
pub async fn run_repl<R, W>(
    engine: &QueryEngine,
    document: &Document,
    input: R,
    out: &mut W,
) -> AppResult<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut asked = 0;

    loop {
        write!(out, "\nAsk any question (or type '{}' to quit): ", EXIT_COMMAND)?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case(EXIT_COMMAND) {
            break;
        }

        let result = engine.answer(question, document).await?;
        asked += 1;

        write!(out, "\nAnswer: ")?;
        write_answer(out, &result)?;

        if !result.is_answered() {
            if let Some(reference) = engine.nearest_reference(question).await? {
                writeln!(out, "Try a related question: {}", reference.question)?;
            }
        }
    }

    Ok(asked)
}
