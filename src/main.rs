//! draftsmith - streaming LLM document generator
//!
//! CLI entry point: runs the HTTP service or acts as a client against a
//! running one.

use std::io::Write;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use serde_json::{Map, Value};
use tracing::{info, warn};

use draftsmith::cli::{Cli, Command};
use draftsmith::client::ApiClient;
use draftsmith::config::Config;
use draftsmith::events::StreamEvent;
use draftsmith::llm::{self, LlmError};
use draftsmith::prompts::PromptLoader;
use draftsmith::registry::Registry;
use draftsmith::server::{self, AnalyzeRequest, AppState, GenerateRequest};

fn setup_logging(cli_level: Option<&str>, config_path: Option<&std::path::PathBuf>) -> Result<()> {
    // Level priority: CLI flag > config file > INFO. The config peek runs
    // before the full config load so load-time warnings are captured.
    let level = cli_level
        .map(str::to_string)
        .or_else(|| Config::load_log_level(config_path))
        .unwrap_or_else(|| "info".to_string());

    let level: tracing::Level = level
        .parse()
        .map_err(|_| eyre!("Invalid log level: '{}'", level))?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.log_level.as_deref(), cli.config.as_ref()).context("Failed to setup logging")?;

    match cli.command {
        Command::Serve { host, port } => serve(cli.config.as_ref(), host, port).await,
        Command::List => list(cli.config.as_ref()),
        Command::Generate {
            document,
            venture,
            context,
            section,
            server,
        } => generate(document, venture, context, section, server).await,
        Command::Analyze { agent, input, server } => analyze(agent, input, server).await,
    }
}

/// Run the HTTP service
async fn serve(config_path: Option<&std::path::PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        "draftsmith starting"
    );

    let loader = PromptLoader::new(config.prompts.dir.as_ref());
    let registry = Registry::load(&loader).context("Failed to load prompt registry")?;

    // A missing API key degrades rather than aborts: read-only routes
    // work, generation routes return an explicit "not configured" error.
    let llm_client = match llm::create_client(&config.llm) {
        Ok(client) => Some(client),
        Err(LlmError::MissingApiKey(var)) => {
            warn!(%var, "API key not set; generation routes will fail until it is");
            None
        }
        Err(e) => return Err(e).context("Failed to create LLM client"),
    };

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let state = AppState::new(&config, registry, loader, llm_client);
    server::serve(state, &host, port).await
}

/// Print the local registry
fn list(config_path: Option<&std::path::PathBuf>) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let loader = PromptLoader::new(config.prompts.dir.as_ref());
    let registry = Registry::load(&loader).context("Failed to load prompt registry")?;

    println!("{}", "Documents".bold().underline());
    for doc in registry.documents() {
        println!("  {} {}", doc.id.cyan().bold(), format!("- {}", doc.title).dimmed());
        for (index, section) in doc.sections.iter().enumerate() {
            println!(
                "    {}. {} {}",
                index,
                section.title,
                format!("[{} tokens]", section.max_tokens).dimmed()
            );
        }
    }

    println!();
    println!("{}", "Agents".bold().underline());
    for agent in registry.agents() {
        println!(
            "  {} {}",
            agent.id.cyan().bold(),
            format!("- {} [{} tokens]", agent.title, agent.max_tokens).dimmed()
        );
    }

    Ok(())
}

/// Stream a document generation to the terminal
async fn generate(
    document: String,
    venture: String,
    context: Vec<(String, String)>,
    section: Option<usize>,
    server: String,
) -> Result<()> {
    let request = GenerateRequest {
        document_id: document,
        venture_id: venture,
        context: to_map(context),
        section_index: section,
    };

    let client = ApiClient::new(server);
    let mut failure: Option<String> = None;

    client
        .generate(&request, |event| match event {
            StreamEvent::Metadata {
                title,
                section_count,
                model,
                ..
            } => {
                println!(
                    "{} {} {}",
                    "Generating".bold(),
                    title.cyan().bold(),
                    format!("({} sections, {})", section_count, model).dimmed()
                );
            }
            StreamEvent::SectionStart { title, index, total, .. } => {
                println!();
                println!("{}", format!("## {} [{}/{}]", title, index + 1, total).green().bold());
            }
            StreamEvent::Delta { text, .. } => {
                // Flush per fragment so output appears as it is generated
                print!("{}", text);
                let _ = std::io::stdout().flush();
            }
            StreamEvent::SectionComplete { .. } => {
                println!();
            }
            StreamEvent::Done {
                input_tokens,
                output_tokens,
            } => {
                println!();
                println!(
                    "{}",
                    format!("Done ({} in / {} out tokens)", input_tokens, output_tokens).dimmed()
                );
            }
            StreamEvent::Error { message } => {
                eprintln!();
                eprintln!("{} {}", "Error:".red().bold(), message);
                failure = Some(message);
            }
        })
        .await?;

    match failure {
        Some(message) => Err(eyre!("Generation failed: {}", message)),
        None => Ok(()),
    }
}

/// Run an agent analysis and print the JSON verdict
async fn analyze(agent: String, input: Vec<(String, String)>, server: String) -> Result<()> {
    let client = ApiClient::new(server);
    let response = client
        .analyze(&AnalyzeRequest {
            agent,
            input_fields: to_map(input),
        })
        .await?;

    println!("{}", format!("{}:", response.agent).cyan().bold());
    println!("{}", serde_json::to_string_pretty(&response.result)?);
    println!(
        "{}",
        format!(
            "({} in / {} out tokens)",
            response.usage.input_tokens, response.usage.output_tokens
        )
        .dimmed()
    );

    Ok(())
}

fn to_map(pairs: Vec<(String, String)>) -> Map<String, Value> {
    pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
}
