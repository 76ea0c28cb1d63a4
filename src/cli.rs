//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// draftsmith - streaming LLM document generator for startup ventures
#[derive(Parser)]
#[command(
    name = "ds",
    about = "Generate structured startup documents (pitch decks, financial models, legal packs, roadmaps) via an upstream LLM",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(long, global = true, help = "Log level: trace, debug, info, warn, error")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP service
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// List documents, sections, and agents in the local registry
    List,

    /// Generate a document against a running server, streaming output
    Generate {
        /// Document id (e.g. pitch-deck)
        document: String,

        /// Venture identifier
        #[arg(long)]
        venture: String,

        /// Context field as key=value (repeatable)
        #[arg(long = "context", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        context: Vec<(String, String)>,

        /// Regenerate only this section index
        #[arg(long)]
        section: Option<usize>,

        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:7878")]
        server: String,
    },

    /// Run an analyst agent against a running server
    Analyze {
        /// Agent id (e.g. viability)
        agent: String,

        /// Input field as key=value (repeatable)
        #[arg(long = "input", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        input: Vec<(String, String)>,

        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:7878")]
        server: String,
    },
}

/// Parse a `key=value` CLI argument
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve() {
        let cli = Cli::try_parse_from(["ds", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Command::Serve { port, .. } => assert_eq!(port, Some(9000)),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_cli_parses_generate_with_context() {
        let cli = Cli::try_parse_from([
            "ds",
            "generate",
            "pitch-deck",
            "--venture",
            "v-1",
            "--context",
            "company_name=Roboto",
            "--context",
            "industry=logistics",
        ])
        .unwrap();

        match cli.command {
            Command::Generate { document, venture, context, .. } => {
                assert_eq!(document, "pitch-deck");
                assert_eq!(venture, "v-1");
                assert_eq!(context.len(), 2);
                assert_eq!(context[0], ("company_name".to_string(), "Roboto".to_string()));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_key_val_rejects_bare_value() {
        assert!(parse_key_val("no-equals-sign").is_err());
        assert!(parse_key_val("=value-without-key").is_err());
        assert_eq!(
            parse_key_val("key=a=b").unwrap(),
            ("key".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ds", "list", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }
}
