//! huginn: ask Gemini about news articles from the command line.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use huginn::{ArticlePrompt, Capability, Config, GenerationRequest, ModelSelector, Secrets};

/// Huginn CLI
#[derive(Parser)]
#[command(name = "huginn")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "Resilient Gemini generation with model discovery and fallback")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gemini API key (default: ~/.huginn/secrets.toml, then $GEMINI_API_KEY).
    #[arg(long, env = "HUGINN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a free-form prompt
    Ask {
        /// Prompt text (or omit to read from stdin)
        prompt: Option<String>,
    },

    /// Summarize an article
    Summarize {
        /// File holding the article text (or omit to read from stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Answer a question about an article
    Question {
        /// The question to answer
        question: String,
        /// File holding the article text (or omit to read from stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List the models each API version offers
    Models,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(version = %huginn::version_string(), "huginn starting");

    let config = Config::load(args.config.as_deref())?;
    let api_key = match args.api_key {
        Some(key) => key,
        None => Secrets::load()?.api_key().ok_or(
            "no API key: pass --api-key, set GEMINI_API_KEY, or add [gemini] api_key to ~/.huginn/secrets.toml",
        )?,
    };
    let selector = ModelSelector::from_config(&config.gemini);

    let prompt = match args.command {
        Command::Models => {
            print_catalogs(&selector, &api_key).await;
            return Ok(());
        }
        Command::Ask { prompt } => resolve_text(prompt, "ask")?,
        Command::Summarize { file } => {
            let article = read_article(file, "summarize")?;
            ArticlePrompt::summarize(&article)?.render()
        }
        Command::Question { question, file } => {
            let article = read_article(file, "question")?;
            ArticlePrompt::question(&article, &question)?.render()
        }
    };

    let request = GenerationRequest::new(api_key, prompt)?;
    let result = selector.generate(&request).await?;
    eprintln!("[{} / {}]", result.version, result.model);
    println!("{}", result.text);

    Ok(())
}

async fn print_catalogs(selector: &ModelSelector, api_key: &str) {
    for entry in selector.list_catalogs(api_key).await {
        println!("{}:", entry.version);
        match entry.catalog {
            Ok(catalog) if catalog.is_empty() => println!("  (no models)"),
            Ok(catalog) => {
                let candidates = catalog.candidates(selector.preferred());
                for model in catalog.models() {
                    let name = model.bare_name();
                    let capability = match model.capability() {
                        Capability::Capable => "generate",
                        Capability::Incapable => "-",
                        Capability::Unknown => "unknown",
                    };
                    let rank = candidates
                        .iter()
                        .position(|c| *c == name)
                        .map(|i| format!("#{}", i + 1))
                        .unwrap_or_default();
                    println!("  {name:<40} {capability:<8} {rank}");
                }
            }
            Err(e) => println!("  listing failed: {e}"),
        }
    }
}

/// Article text from a file, or stdin when no file is given.
fn read_article(
    file: Option<PathBuf>,
    command: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(&path)
            .map_err(|e| format!("{command}: cannot read {}: {e}", path.display()))?),
        None => resolve_text(None, command),
    }
}

/// Resolve text input from an optional CLI argument and/or stdin.
///
/// - arg only → arg
/// - stdin only → stdin
/// - both → `"{arg}\n\n{stdin}"`
/// - neither → error
fn resolve_text(arg: Option<String>, command: &str) -> Result<String, Box<dyn std::error::Error>> {
    let stdin_is_pipe = !io::stdin().is_terminal();
    let stdin_text = if stdin_is_pipe {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    } else {
        None
    };

    match (arg, stdin_text) {
        (Some(a), Some(s)) => Ok(format!("{a}\n\n{s}")),
        (Some(a), None) => Ok(a),
        (None, Some(s)) => Ok(s),
        (None, None) => {
            Err(format!("{command}: no input provided (pass text as argument or via stdin)").into())
        }
    }
}
