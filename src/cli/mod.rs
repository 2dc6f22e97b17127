//! CLI module — command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use papermule::config::Config;
use papermule::eval::{evaluate_sources, PREFERRED_DOMAINS};
use papermule::providers::{ChatOptions, CompletionProvider, OpenAiProvider, RetryProvider};
use papermule::report::ReportPipeline;
use papermule::tools::research_registry;
use papermule::utils::init_logging;
use papermule::LoopOutcome;

#[derive(Parser)]
#[command(name = "papermule")]
#[command(version)]
#[command(about = "Research-report assistant driven by a bounded tool-calling loop", long_about = None)]
struct Cli {
    /// Path to a config file (default: ~/.papermule/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Research a topic and write a sourced report
    Research {
        /// The research prompt
        prompt: String,
        /// Run a reflection-and-rewrite pass over the draft
        #[arg(long)]
        reflect: bool,
        /// Render the report as HTML and save it under the workspace
        #[arg(long)]
        html: bool,
        /// Score the report's cited sources against preferred domains
        #[arg(long)]
        evaluate: bool,
        /// Override the turn budget for the draft pass
        #[arg(long)]
        max_turns: Option<usize>,
        /// Override the model
        #[arg(long)]
        model: Option<String>,
    },
    /// Score a saved report's cited sources against preferred domains
    Eval {
        /// Path to the report file
        file: PathBuf,
        /// Minimum preferred ratio required to pass
        #[arg(long)]
        min_ratio: Option<f64>,
    },
    /// List the built-in tools
    Tools,
    /// Show the effective configuration, or write the default config file
    Config {
        /// Write the default config to ~/.papermule/config.json
        #[arg(long)]
        init: bool,
    },
}

/// Parse arguments, load config, and dispatch the selected command.
pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };
    init_logging(&config.logging);

    match cli.command {
        Commands::Research {
            prompt,
            reflect,
            html,
            evaluate,
            max_turns,
            model,
        } => research(&config, &prompt, reflect, html, evaluate, max_turns, model).await,
        Commands::Eval { file, min_ratio } => eval_file(&config, &file, min_ratio),
        Commands::Tools => {
            list_tools();
            Ok(())
        }
        Commands::Config { init } => show_or_init_config(&config, init),
    }
}

/// Build the configured provider stack: OpenAI-compatible client wrapped in
/// retry with the configured backoff policy.
fn build_provider(config: &Config) -> Result<Box<dyn CompletionProvider>> {
    let api_key = config.resolve_api_key()?;
    let inner = match &config.provider.api_base {
        Some(base) => OpenAiProvider::with_base_url(&api_key, base),
        None => OpenAiProvider::new(&api_key),
    };
    let retry = &config.provider.retry;
    Ok(Box::new(
        RetryProvider::new(Box::new(inner))
            .with_max_retries(retry.max_retries)
            .with_base_delay_ms(retry.base_delay_ms)
            .with_max_delay_ms(retry.max_delay_ms),
    ))
}

/// Turn a research prompt into a filesystem-safe output stem.
fn slugify(prompt: &str) -> String {
    let slug: String = prompt
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let slug = slug.trim_matches('_').to_string();
    let mut collapsed = String::with_capacity(slug.len());
    for c in slug.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }
    if collapsed.is_empty() {
        "report".to_string()
    } else {
        collapsed.chars().take(40).collect()
    }
}

async fn research(
    config: &Config,
    prompt: &str,
    reflect: bool,
    html: bool,
    evaluate: bool,
    max_turns: Option<usize>,
    model: Option<String>,
) -> Result<()> {
    let provider = build_provider(config)?;
    let registry = research_registry();

    let options = ChatOptions::new()
        .with_max_tokens(config.agent.max_tokens)
        .with_temperature(config.agent.temperature);
    let workspace = config.workspace_path();

    let pipeline = ReportPipeline::new(provider.as_ref(), &registry)
        .with_model(model.as_deref().unwrap_or(&config.agent.model))
        .with_options(options)
        .with_max_turns(max_turns.unwrap_or(config.agent.max_turns))
        .with_workspace(&workspace);

    let run = pipeline.draft(prompt).await?;
    let mut report = match run.outcome {
        LoopOutcome::Done { answer } => answer,
        LoopOutcome::Exhausted { last_content } => {
            eprintln!(
                "warning: turn budget spent after {} turns without a final answer; \
                 partial content follows and is not a finished report",
                run.turns
            );
            println!("{}", last_content);
            return Ok(());
        }
    };

    if reflect {
        let reflection = pipeline.reflect(&report).await?;
        println!("=== Reflection ===\n{}\n", reflection.reflection);
        report = reflection.revised_report;
    }

    println!("=== Report ===\n{}", report);

    if evaluate {
        let domains = all_domains(config);
        let domain_refs: Vec<&str> = domains.iter().map(String::as_str).collect();
        let eval = evaluate_sources(&domain_refs, &report, config.eval.min_ratio);
        println!("\n{}", eval.to_markdown());
    }

    if html {
        let page = pipeline.render_html(&report).await?;
        let path = pipeline.save_html(&page, &slugify(prompt)).await?;
        println!("\nHTML report written to {}", path.display());
    }

    Ok(())
}

fn eval_file(config: &Config, file: &PathBuf, min_ratio: Option<f64>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let domains = all_domains(config);
    let domain_refs: Vec<&str> = domains.iter().map(String::as_str).collect();
    let eval = evaluate_sources(
        &domain_refs,
        &text,
        min_ratio.unwrap_or(config.eval.min_ratio),
    );
    println!("{}", eval.to_markdown());

    if eval.passed {
        Ok(())
    } else {
        anyhow::bail!("source evaluation failed")
    }
}

/// The built-in preferred domains plus any configured extras.
fn all_domains(config: &Config) -> Vec<String> {
    PREFERRED_DOMAINS
        .iter()
        .map(|d| d.to_string())
        .chain(config.eval.extra_domains.iter().cloned())
        .collect()
}

fn list_tools() {
    let registry = research_registry();
    let mut specs = registry.specs();
    specs.sort_by(|a, b| a.name.cmp(&b.name));
    for spec in specs {
        println!("{:<18} {}", spec.name, spec.description);
    }
}

fn show_or_init_config(config: &Config, init: bool) -> Result<()> {
    if init {
        let path = Config::path();
        if path.exists() {
            anyhow::bail!("config already exists at {}", path.display());
        }
        Config::default().save_to_path(&path)?;
        println!("wrote default config to {}", path.display());
    } else {
        println!("{}", serde_json::to_string_pretty(config)?);
    }
    Ok(())
}
