use anyhow::{bail, Context, Result};
use colored::*;
use console::{Emoji, Term};
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use reword::batch::{Batch, Decision, Entry, KeepReason, Observer};
use reword::commit::{self, CommitRecord};
use reword::config::{App, RunConfig};
use reword::git::{GitError, Repo};
use reword::history::{self, RewritePlan};
use reword::provider::{self, Provider};
use reword::BatchOutcome;
use structopt::StructOpt;
use tokio::time::Duration;

const SPARKLES: Emoji<'_, '_> = Emoji("✨ ", "");
const ROBOT: Emoji<'_, '_> = Emoji("🤖 ", "");

#[derive(StructOpt, Debug)]
#[structopt(name = "git-reword", about = "Rewrites a branch's commit messages with AI-generated conventional messages")]
struct Cli {
  #[structopt(long, help = "Provider to use: openai, ollama or claude")]
  provider: Option<String>,

  #[structopt(long, help = "Model name passed to the provider")]
  model: Option<String>,

  #[structopt(long = "api-key", help = "OpenAI API key (defaults to OPENAI_API_KEY)")]
  api_key: Option<String>,

  #[structopt(long = "ollama-url", help = "Ollama server URL")]
  ollama_url: Option<String>,

  #[structopt(long, help = "Branch to rewrite (defaults to the current branch)")]
  branch: Option<String>,

  #[structopt(long = "max-commits", help = "Only process the newest N commits")]
  max_commits: Option<usize>,

  #[structopt(long = "dry-run", help = "Show the new messages without rewriting history")]
  dry_run: bool,

  #[structopt(short = "y", long, help = "Rewrite without asking for confirmation")]
  yes: bool,

  #[structopt(long = "skip-backup", help = "Do not create a backup branch before rewriting")]
  skip_backup: bool,

  #[structopt(long, help = "Message template, e.g. \"[JIRA-123] - add feature\"")]
  template: Option<String>,

  #[structopt(long, help = "Language code for generated messages (en, es, fr, ...)")]
  language: Option<String>,

  #[structopt(long, help = "Custom instruction replacing the default prompt")]
  prompt: Option<String>,

  #[structopt(long = "min-quality-score", help = "Messages scoring at least this (0-10) are kept")]
  min_quality_score: Option<u8>,

  #[structopt(long = "no-skip-well-formed", help = "Regenerate every message, even well-formed ones")]
  no_skip_well_formed: bool,

  #[structopt(long = "delay-ms", help = "Pause between provider calls in milliseconds")]
  delay_ms: Option<u64>,

  #[structopt(long, help = "Generate a message for the staged changes and print it")]
  staged: bool,

  #[structopt(short, long, help = "Enables verbose logging")]
  verbose: bool
}

impl Cli {
  fn overrides(&self) -> App {
    App {
      provider: self.provider.clone(),
      model: self.model.clone(),
      openai_api_key: self.api_key.clone(),
      ollama_url: self.ollama_url.clone(),
      min_quality_score: self.min_quality_score,
      skip_well_formed: self.no_skip_well_formed.then_some(false),
      template: self.template.clone(),
      language: self.language.clone(),
      prompt: self.prompt.clone(),
      delay_ms: self.delay_ms,
      ..App::default()
    }
  }
}

/// Drives the spinner from batch progress. Per-commit fallbacks are only
/// reported when verbose.
struct Spinner {
  pb:      ProgressBar,
  verbose: bool
}

impl Spinner {
  /// Line printed for a commit that kept its message because generation failed.
  fn fallback_notice(&self, entry: &Entry) -> Option<String> {
    if !self.verbose || entry.decision != Decision::Keep(KeepReason::GenerationFailed) {
      return None;
    }

    Some(format!("   {} {}", short(&entry.id).yellow(), "generation failed, keeping original".dimmed()))
  }

  fn new(verbose: bool) -> Result<Self> {
    let style = ProgressStyle::default_spinner()
      .tick_strings(&["-", "\\", "|", "/"])
      .template("{spinner:.blue} {msg}")
      .context("Failed to create progress bar style")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(150));
    Ok(Self { pb, verbose })
  }
}

impl Observer for Spinner {
  fn started(&self, index: usize, total: usize, record: &CommitRecord) {
    self
      .pb
      .set_message(format!("[{}/{}] {} {}", index + 1, total, record.short_id().yellow(), record.original_message));
  }

  fn finished(&self, _index: usize, _total: usize, entry: &Entry) {
    if let Some(notice) = self.fallback_notice(entry) {
      self.pb.println(notice);
    }
  }
}

fn short(id: &str) -> &str {
  id.get(..7).unwrap_or(id)
}

fn init_logging(verbose: bool) {
  let mut builder = env_logger::Builder::from_default_env();
  if verbose {
    builder.filter_level(LevelFilter::Debug).format_target(false);
  }
  builder.init();
  log::debug!("Verbose logging enabled");
}

fn confirm(question: &str) -> Result<bool> {
  let term = Term::stderr();
  term.write_str(&format!("{} [y/N] ", question))?;
  let answer = term.read_line()?;
  Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_changes(outcome: &BatchOutcome) {
  for entry in outcome.entries.iter().filter(|entry| entry.is_replaced()) {
    println!("{}", short(&entry.id).yellow());
    println!("  {} {}", "-".red(), entry.original.red());
    println!("  {} {}", "+".green(), entry.message().green().italic());
  }

  println!(
    "\n{}{} to rewrite, {} already good, {} unchanged, {} failed",
    ROBOT,
    outcome.replaced().to_string().bold(),
    outcome.count(KeepReason::AlreadyAcceptable),
    outcome.count(KeepReason::Unchanged),
    outcome.count(KeepReason::GenerationFailed)
  );
}

async fn staged(repo: &Repo, provider: &dyn Provider, config: &RunConfig) -> Result<()> {
  let record = repo.staged()?;
  let message = commit::suggest(provider, &record, config).await?;
  println!("{}", message);
  Ok(())
}

async fn rewrite_branch(cli: &Cli, repo: &Repo, provider: &dyn Provider, config: &RunConfig) -> Result<()> {
  if !cli.dry_run && !repo.is_clean()? {
    bail!(GitError::DirtyWorkingTree);
  }

  let branch = match &cli.branch {
    Some(branch) => branch.clone(),
    None => repo.current_branch()?
  };
  let ids = repo.commits(&branch, cli.max_commits)?;
  if ids.is_empty() {
    println!("{}Nothing to rewrite", SPARKLES);
    return Ok(());
  }

  println!("{}Processing {} commits on {} with {}", ROBOT, ids.len(), branch.bold(), provider.name());

  let spinner = Spinner::new(cli.verbose)?;
  let result = Batch::new(repo, provider, config)
    .with_observer(&spinner)
    .run(&ids)
    .await;
  spinner.pb.finish_and_clear();

  let outcome = match result {
    Ok(outcome) => outcome,
    Err(aborted) => {
      eprintln!("{} processed {} of {} commits before failing, nothing was rewritten", "Aborted:".red().bold(), aborted.completed.len(), aborted.total);
      return Err(aborted.into());
    }
  };

  print_changes(&outcome);

  if cli.dry_run {
    println!("{}", "Dry run, history left untouched".dimmed());
    return Ok(());
  }

  let replacements = outcome.replacements();
  if replacements.is_empty() {
    println!("{}Nothing to rewrite", SPARKLES);
    return Ok(());
  }

  if !cli.yes && !confirm(&format!("Rewrite {} commit messages on {}?", replacements.len(), branch))? {
    println!("Cancelled");
    return Ok(());
  }

  if !cli.skip_backup {
    let backup = repo.create_backup_branch(&branch)?;
    println!("Backup branch: {}", backup.italic());
  }

  let plan = RewritePlan { branch: branch.clone(), base: repo.parent_of(&ids[0])?, replacements };
  history::rewrite(repo.workdir()?, &plan)?;

  println!("{}Rewrote {} commit messages on {}", SPARKLES, plan.replacements.len(), branch.bold());
  println!("{}", "Run `git push --force-with-lease` to update the remote branch".dimmed());
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  dotenv().ok();

  let cli = Cli::from_args();
  init_logging(cli.verbose);

  // Configuration problems are fatal before anything else happens
  let app = App::new()?.merge(cli.overrides());
  let config = app.run_config();
  let provider = provider::from_settings(&app.provider_settings())?;
  let repo = Repo::new()?;

  if cli.staged {
    return staged(&repo, provider.as_ref(), &config).await;
  }

  rewrite_branch(&cli, &repo, provider.as_ref(), &config).await
}
