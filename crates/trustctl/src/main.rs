//! TrustAgent Control - interactive answer/critic trust loop
//!
//! Reads one question per line, answers it with the fast model, has the
//! critic model score the answer, and regenerates unsafe answers.

mod output;
mod repl;

use anyhow::{Context, Result};
use clap::Parser;
use output::Output;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use trust_common::{open_sink, LogFormat, OllamaClient, RunSink, TrustConfig, TrustLoop};

// Version is embedded at build time
const VERSION: &str = env!("TRUSTAGENT_VERSION");

#[derive(Parser, Debug)]
#[command(name = "trustctl")]
#[command(about = "TrustAgent - answer, critique and regenerate untrustworthy responses", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Config file (default: $TRUSTAGENT_CONFIG or ~/.config/trustagent/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run log file
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Run log layout: text or jsonl
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Model for answers and safe regeneration
    #[arg(long)]
    answer_model: Option<String>,

    /// Model for critiques
    #[arg(long)]
    critic_model: Option<String>,

    /// Ollama endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Deadline for each generation call
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Increase diagnostic output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply_overrides(&self, config: &mut TrustConfig) {
        if let Some(path) = &self.log_path {
            config.log.path = path.clone();
        }
        if let Some(format) = self.log_format {
            config.log.format = format;
        }
        if let Some(model) = &self.answer_model {
            config.answer.model = model.clone();
        }
        if let Some(model) = &self.critic_model {
            config.critic.model = model.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.ollama.endpoint = endpoint.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.ollama.timeout_secs = secs;
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<TrustConfig> {
    let mut config = match &cli.config {
        Some(path) => TrustConfig::load_from(path)?,
        None => TrustConfig::load()?,
    };
    cli.apply_overrides(&mut config);
    Ok(config)
}

fn build_loop(config: &TrustConfig) -> Result<TrustLoop> {
    let answer = OllamaClient::new(&config.ollama, config.answer.clone())
        .context("Failed to create answer model client")?;
    let critic = OllamaClient::new(&config.ollama, config.critic.clone())
        .context("Failed to create critic model client")?;
    let sink: Arc<dyn RunSink> = Arc::from(
        open_sink(&config.log.path, config.log.format).context("Run log is not writable")?,
    );

    Ok(TrustLoop::new(Arc::new(answer), Arc::new(critic), sink))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    info!(
        "TrustAgent v{} starting (answer: {}, critic: {}, log: {})",
        VERSION,
        config.answer.model,
        config.critic.model,
        config.log.path.display()
    );

    let trust = build_loop(&config)?;
    let output = Output::new(!cli.no_color && io::stdout().is_terminal());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    repl::run(&trust, &output, stdin.lock(), &mut stdout, &mut stderr)?;

    Ok(())
}
