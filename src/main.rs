use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tapscribe::config::Config;
use tapscribe::desktop::SelectionCopier;
use tapscribe::gesture::{DetectionBackend, HotkeyListener};
use tapscribe::{ImprovementClient, PipelineOrchestrator, SignalChannel};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Double-tap Ctrl to rewrite the selected text with a local LLM.
#[derive(Parser, Debug)]
#[command(name = "tapscribe", version, about)]
struct Cli {
    /// Config file (defaults to $TAPSCRIBE_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ollama base URL (overrides config and OLLAMA_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Model name (overrides config and OLLAMA_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the keyboard for a Ctrl double tap and write the trigger file
    Listen,
    /// Improve text dropped into the shared input file
    Daemon,
    /// Improve the clipboard whenever the trigger file appears
    Watch,
    /// Type text in the terminal and get the improved version on the clipboard
    Interactive,
    /// Write the trigger file once
    Trigger {
        /// Write the manual-trigger file instead (picked up by `listen`)
        #[arg(long)]
        manual: bool,
    },
    /// Probe the Ollama endpoint once
    Check,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tapscribe=debug" } else { "tapscribe=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(url) = &cli.url {
        config.ollama.url.clone_from(url);
    }
    if let Some(model) = &cli.model {
        config.ollama.model.clone_from(model);
    }
    config.validate()?;
    Ok(config)
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down");
        }
        token.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(&cli)?;
    tracing::debug!(?config, "Configuration loaded");

    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Listen => {
            cancel_on_ctrl_c(cancel.clone());
            let selection = SelectionCopier::detect(config.gesture.copy_selection);
            let listener = HotkeyListener::new(&config, selection);
            listener.run(DetectionBackend::detect(), cancel).await
        }
        Commands::Daemon => {
            cancel_on_ctrl_c(cancel.clone());
            PipelineOrchestrator::daemon(&config).run(cancel).await
        }
        Commands::Watch => {
            cancel_on_ctrl_c(cancel.clone());
            PipelineOrchestrator::watcher(&config).run(cancel).await
        }
        Commands::Interactive => {
            cancel_on_ctrl_c(cancel.clone());
            PipelineOrchestrator::interactive(&config).run(cancel).await
        }
        Commands::Trigger { manual } => {
            let path = if manual {
                &config.paths.manual_trigger
            } else {
                &config.paths.trigger
            };
            SignalChannel::new(path).signal()?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Check => {
            let client = ImprovementClient::from_config(&config.ollama);
            if client.health_check().await {
                println!("Ollama is reachable at {} (model {})", client.base_url(), client.model());
                Ok(())
            } else {
                bail!("Ollama is not reachable at {}", client.base_url())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["tapscribe", "daemon", "--model", "llama3", "-v"]).unwrap();
        assert!(matches!(cli.command, Commands::Daemon));
        assert_eq!(cli.model.as_deref(), Some("llama3"));
        assert!(cli.verbose);
    }

    #[test]
    fn trigger_manual_flag() {
        let cli = Cli::try_parse_from(["tapscribe", "trigger", "--manual"]).unwrap();
        assert!(matches!(cli.command, Commands::Trigger { manual: true }));
    }

    #[test]
    fn cli_overrides_win_over_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[ollama]\nmodel = \"from-file\"\n").unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let cli = Cli::try_parse_from([
            "tapscribe",
            "--config",
            path_arg.as_str(),
            "--model",
            "from-cli",
            "check",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.ollama.model, "from-cli");
    }

    #[test]
    fn blank_cli_model_is_rejected() {
        let cli = Cli::try_parse_from(["tapscribe", "--model", "", "check"]).unwrap();
        assert!(load_config(&cli).is_err());
    }
}
