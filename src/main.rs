//! # Plainly CLI (`plainly`)
//!
//! Command-line front end for the explanation pipeline. Builds settings,
//! the model backends, the gateway and the history store once, then runs
//! one command.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `plainly explain "<text or url>"` | Explain typed text or a link |
//! | `plainly explain --file <path>` | Explain an image, video, document or source file |
//! | `plainly history list` | List saved explanations, newest first |
//! | `plainly history show <id>` | Print a saved explanation |
//! | `plainly history remove <id>` | Delete one saved explanation |
//! | `plainly history clear` | Delete all saved explanations |
//! | `plainly set-key <key>` | Store the Gemini API key in the OS keychain |
//! | `plainly test-connection` | Send a minimal prompt to Gemini |
//! | `plainly providers` | Show both backends and whether they are configured |

use clap::{Parser, Subcommand, ValueEnum};
use plainly_lib::gateway::ExplanationGateway;
use plainly_lib::history::{HistoryStore, JsonFileHistoryStore};
use plainly_lib::input::{from_path, from_typed_text, ContentKind};
use plainly_lib::llm::provider::{all_providers, CloudModel, LocalModel, ProcessingMode};
use plainly_lib::llm::{GeminiClient, UnavailableLocalModel};
use plainly_lib::pipeline::{ExplanationState, Orchestrator};
use plainly_lib::settings::{self, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use uuid::Uuid;

/// Plainly: share anything, get a critical explanation.
#[derive(Parser)]
#[command(name = "plainly", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain text, a link, or a file.
    ///
    /// Plain text runs on device by default; everything else, and any
    /// text containing a YouTube link, goes to the cloud model.
    Explain {
        /// Text or URL to explain.
        text: Option<String>,

        /// File to explain. Takes precedence over TEXT.
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Processing mode. Only honored for plain text.
        #[arg(long, value_enum)]
        mode: Option<CliMode>,
    },

    /// Browse and manage saved explanations.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Store the Gemini API key in the OS keychain.
    SetKey { key: String },

    /// Check that the Gemini API key and model answer.
    TestConnection,

    /// Show the on-device and cloud backends and their configuration.
    Providers,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List saved explanations, newest first.
    List,
    /// Print one saved explanation.
    Show { id: Uuid },
    /// Delete one saved explanation.
    Remove { id: Uuid },
    /// Delete every saved explanation.
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliMode {
    OnDevice,
    Cloud,
}

impl From<CliMode> for ProcessingMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::OnDevice => ProcessingMode::OnDevice,
            CliMode::Cloud => ProcessingMode::Cloud,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    settings::load_env_files();
    plainly_lib::init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    if let Commands::SetKey { key } = &cli.command {
        return settings::save_api_key(key);
    }

    let settings = Settings::from_env();
    let cloud = Arc::new(GeminiClient::new(
        settings.gemini_api_key.clone(),
        settings.gemini_model.clone(),
    ));

    match cli.command {
        Commands::Explain { text, file, mode } => {
            let history = open_history(&settings)?;
            let gateway = Arc::new(ExplanationGateway::new(
                build_local_model(&settings),
                cloud,
                &settings,
            ));
            let kind = read_input(text.as_deref(), file)?;
            explain(kind, mode.map(Into::into), gateway, history).await
        }
        Commands::History { action } => {
            let history = open_history(&settings)?;
            run_history(action, history, cloud, &settings)
        }
        Commands::TestConnection => {
            log::info!("[CLI] Testing Gemini model {}", cloud.model());
            settings::test_cloud_connection(cloud.as_ref()).await?;
            println!("Gemini ({}) is reachable.", cloud.model());
            Ok(())
        }
        Commands::Providers => {
            for p in all_providers() {
                let configured = match p.mode {
                    ProcessingMode::OnDevice => settings.local_model_path.is_some(),
                    ProcessingMode::Cloud => cloud.has_api_key(),
                };
                let setting = p.env_key.as_deref().unwrap_or("PLAINLY_LOCAL_MODEL");
                println!(
                    "{:<7} {:<10} {:<48} {}={}",
                    p.id,
                    p.mode.label(),
                    p.name,
                    setting,
                    if configured { "set" } else { "unset" }
                );
            }
            Ok(())
        }
        Commands::SetKey { .. } => Ok(()),
    }
}

fn open_history(settings: &Settings) -> Result<Arc<dyn HistoryStore>, String> {
    let store = JsonFileHistoryStore::open(settings.history_path.clone()).map_err(|e| e.to_string())?;
    Ok(Arc::new(store))
}

/// On-device model, or a stand-in that makes the gateway serve the
/// offline placeholder.
fn build_local_model(settings: &Settings) -> Arc<dyn LocalModel> {
    #[cfg(feature = "local-llm")]
    {
        if let Some(path) = &settings.local_model_path {
            match plainly_lib::llm::LlamaLocalModel::load(path) {
                Ok(model) => return Arc::new(model),
                Err(e) => log::warn!("[CLI] {}", e),
            }
        }
    }
    let reason = if settings.local_model_path.is_some() {
        "on-device model could not be loaded"
    } else {
        "no on-device model configured (PLAINLY_LOCAL_MODEL)"
    };
    Arc::new(UnavailableLocalModel::new(reason))
}

/// Gateway for showing saved results. Restored orchestrators never
/// dispatch, so the on-device model is not loaded.
fn viewer_gateway(cloud: Arc<GeminiClient>, settings: &Settings) -> Arc<ExplanationGateway> {
    Arc::new(ExplanationGateway::new(
        Arc::new(UnavailableLocalModel::new("not loaded for history")),
        cloud as Arc<dyn CloudModel>,
        settings,
    ))
}

/// A file outranks the accompanying text, as on the share sheet.
fn read_input(text: Option<&str>, file: Option<PathBuf>) -> Result<Option<ContentKind>, String> {
    if let Some(path) = file {
        return from_path(&path).map(Some).map_err(|e| e.to_string());
    }
    Ok(text.and_then(from_typed_text))
}

async fn explain(
    kind: Option<ContentKind>,
    mode: Option<ProcessingMode>,
    gateway: Arc<ExplanationGateway>,
    history: Arc<dyn HistoryStore>,
) -> Result<(), String> {
    let orchestrator = Orchestrator::new(kind, gateway, history);

    let mut states = orchestrator.subscribe();
    let progress = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            if let ExplanationState::Loading { label } = &*states.borrow_and_update() {
                eprintln!("{}", label);
            }
        }
    });

    match mode {
        Some(mode) if mode != orchestrator.mode() => {
            if orchestrator.shows_mode_picker() {
                orchestrator.switch_mode(mode).await;
            } else {
                eprintln!(
                    "Mode is fixed to {} for this input.",
                    orchestrator.mode().label()
                );
                orchestrator.start().await;
            }
        }
        _ => orchestrator.start().await,
    }
    progress.abort();

    if !orchestrator.display_input().is_empty() {
        eprintln!("▸ {} ({})", orchestrator.display_input(), orchestrator.mode().label());
    }
    match orchestrator.state() {
        ExplanationState::Result(result) => {
            println!("{}", result.markdown);
            Ok(())
        }
        ExplanationState::Error { message } => Err(message),
        other => Err(format!("explanation did not finish: {:?}", other)),
    }
}

fn run_history(
    action: HistoryAction,
    history: Arc<dyn HistoryStore>,
    cloud: Arc<GeminiClient>,
    settings: &Settings,
) -> Result<(), String> {
    match action {
        HistoryAction::List => {
            let records = history.list();
            if records.is_empty() {
                println!("No saved explanations.");
            }
            for r in records {
                println!(
                    "{}  {}  {:<8}  {:<9}  {}",
                    r.id,
                    r.created_at.format("%Y-%m-%d %H:%M"),
                    r.kind.label(),
                    if r.used_cloud { "cloud" } else { "on-device" },
                    r.title
                );
            }
            Ok(())
        }
        HistoryAction::Show { id } => {
            let record = history
                .get(id)
                .ok_or_else(|| format!("no saved explanation with id {}", id))?;
            let restored = Orchestrator::from_history(&record, viewer_gateway(cloud, settings), history);
            eprintln!(
                "▸ {} ({})",
                restored.display_input(),
                restored.mode().label()
            );
            if let ExplanationState::Result(result) = restored.state() {
                println!("{}", result.markdown);
            }
            Ok(())
        }
        HistoryAction::Remove { id } => {
            if history.remove(id).map_err(|e| e.to_string())? {
                println!("Removed {}.", id);
                Ok(())
            } else {
                Err(format!("no saved explanation with id {}", id))
            }
        }
        HistoryAction::Clear => {
            history.clear().map_err(|e| e.to_string())?;
            println!("History cleared.");
            Ok(())
        }
    }
}
