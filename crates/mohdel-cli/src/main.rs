//! Mohdel CLI: entry point.
//!
//! # Commands
//!
//! - `mohdel answer [-m MODEL] [--budget N] [--effort E] [--json] [--image FILE]... PROMPT`
//! - `mohdel resolve ID`: expand an alias to its canonical id
//! - `mohdel models`: list curated models
//! - `mohdel status`: show configuration and credential status

mod helpers;
mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use mohdel_core::config::load_config;
use mohdel_core::{AnswerOptions, OutputEffort};
use mohdel_providers::Dispatcher;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Mohdel: one prompt, any model vendor
#[derive(Parser)]
#[command(name = "mohdel", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    /// Config file (defaults to ~/.mohdel/config.json)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single prompt and print the answer
    Answer {
        /// Model id or alias. Omit to use the configured default.
        #[arg(short, long)]
        model: Option<String>,

        /// Cap on generated tokens (clamped to the model limit)
        #[arg(long)]
        budget: Option<u32>,

        /// Reasoning effort: none, low, medium or high
        #[arg(long)]
        effort: Option<OutputEffort>,

        /// Ask for JSON output
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Output style (coding, analysis, translation, chat, creative)
        #[arg(long)]
        style: Option<String>,

        /// Attach an image file (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,

        /// Print token usage after the answer
        #[arg(long, default_value_t = false)]
        usage: bool,

        /// The prompt
        prompt: String,
    },

    /// Expand a model id or alias to its canonical provider/model id
    Resolve {
        id: String,
    },

    /// List curated models
    Models,

    /// Show configuration and provider status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    let config_path = cli.config.as_deref().map(helpers::expand_tilde);
    let config = load_config(config_path.as_deref());

    match cli.command {
        Commands::Answer {
            model,
            budget,
            effort,
            json,
            style,
            images,
            usage,
            prompt,
        } => {
            let mut options = AnswerOptions {
                output_budget: budget,
                output_effort: effort,
                output_style: style,
                ..Default::default()
            };
            if json {
                options = options.json();
            }
            for path in &images {
                options = options.with_image(helpers::load_image(path)?);
            }

            let dispatcher = Dispatcher::from_config(&config).context("failed to load catalog")?;
            info!(model = model.as_deref().unwrap_or("(default)"), "answering");
            let result = dispatcher
                .answer(model.as_deref(), &prompt, &options)
                .await
                .map_err(helpers::describe_error)?;
            helpers::print_answer(&result, usage);
            Ok(())
        }
        Commands::Resolve { id } => {
            let dispatcher = Dispatcher::from_config(&config).context("failed to load catalog")?;
            let resolved = dispatcher.resolve(&id)?;
            println!("{resolved}");
            Ok(())
        }
        Commands::Models => {
            let dispatcher = Dispatcher::from_config(&config).context("failed to load catalog")?;
            helpers::print_models(dispatcher.catalog());
            Ok(())
        }
        Commands::Status => status::run(&config),
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("mohdel=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_flags() {
        let cli = Cli::try_parse_from([
            "mohdel", "answer", "-m", "o3", "--budget", "200", "--effort", "high", "--json",
            "--image", "a.png", "--image", "b.jpg", "hello",
        ])
        .unwrap();

        match cli.command {
            Commands::Answer {
                model,
                budget,
                effort,
                json,
                images,
                prompt,
                ..
            } => {
                assert_eq!(model.as_deref(), Some("o3"));
                assert_eq!(budget, Some(200));
                assert_eq!(effort, Some(OutputEffort::High));
                assert!(json);
                assert_eq!(images.len(), 2);
                assert_eq!(prompt, "hello");
            }
            _ => panic!("expected answer command"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_effort() {
        let result = Cli::try_parse_from(["mohdel", "answer", "--effort", "max", "hi"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_logs_flag() {
        let cli = Cli::try_parse_from(["mohdel", "resolve", "claude-3-haiku", "--logs"]).unwrap();
        assert!(cli.logs);
        assert!(matches!(cli.command, Commands::Resolve { ref id } if id == "claude-3-haiku"));
    }
}
