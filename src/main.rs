//! Command-line entrypoint: issue, verify and inspect certificates, or run the backend.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cert_ledger::config::{AppConfig, DEFAULT_CONFIG_PATH};
use cert_ledger::insights::{self, ChainStats};
use cert_ledger::router::Overrides;
use cert_ledger::routes::{self, AppState};
use cert_ledger::settings::Preferences;
use cert_ledger::storage::{FileStore, KvStore};
use cert_ledger::{ApiResponse, Connectivity, Mode, OfflineChainStore, RequestRouter, RouterError};

#[derive(Parser)]
#[command(name = "cert-ledger")]
#[command(about = "Issue and verify certificates against a demo blockchain", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory for the offline chain and saved preferences
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Mode for this invocation only (online or offline)
    #[arg(long, global = true)]
    mode: Option<Mode>,

    /// Backend URL for this invocation only
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a certificate on the chain
    Issue { certificate: String },

    /// Check a certificate and print an assessment
    Verify { certificate: String },

    /// Show the chain and its stats
    Chain,

    /// Probe the configured backend
    TestConnection,

    /// Saved backend URL and mode
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Explain a section of the app
    Explain {
        #[arg(default_value = "overview")]
        topic: String,
    },

    /// Suggest what to try next
    NextSteps,

    /// Run the reference ledger backend
    Serve,
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    SetUrl { url: String },
    SetMode {
        #[arg(value_name = "MODE")]
        new_mode: Mode,
    },
    Reset,
}

fn print_result(title: &str, data: &impl Serialize) {
    let body = serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("<unprintable: {e}>"));
    println!("{title}\n{}\n{body}", "=".repeat(title.len()));
}

fn print_assistant(title: &str, lines: &[&str]) {
    println!("{title}\n{}\n- {}", "=".repeat(title.len()), lines.join("\n- "));
}

fn print_response(label: &str, r: &ApiResponse) {
    print_result(&format!("{label} Response (HTTP {})", r.status), &r.data);
}

async fn print_chain_stats(router: &RequestRouter) -> Result<()> {
    let chain = router.get_chain().await?;
    print_result("Chain Stats", &ChainStats::from_chain(&chain.data));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match e.downcast_ref::<RouterError>() {
            Some(RouterError::Unreachable { .. }) => {
                print_result(
                    "Request Error",
                    &json!({ "status": Connectivity::Unreachable.label(), "error": e.to_string() }),
                );
                Ok(ExitCode::from(2))
            }
            _ => Err(e),
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load_or_default(&cli.config)?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let kv: Arc<dyn KvStore> = Arc::new(FileStore::new(&data_dir));
    let prefs = Preferences::with_default_base_url(kv.clone(), &config.default_base_url);
    let router = RequestRouter::new(prefs.clone(), OfflineChainStore::new(kv)).with_overrides(Overrides {
        mode: cli.mode,
        base_url: cli.base_url,
    });

    match cli.command {
        Commands::Issue { certificate } => {
            let r = router.issue_certificate(&certificate).await?;
            print_response("Issue", &r);
            print_chain_stats(&router).await?;
        }
        Commands::Verify { certificate } => {
            let r = router.verify_certificate(&certificate).await?;
            print_response("Verify", &r);
            if r.status != 400 {
                print_result("AI Insights", &insights::assess(&r.data, &certificate));
            }
        }
        Commands::Chain => {
            let r = router.get_chain().await?;
            print_response("Chain", &r);
            print_result("Chain Stats", &ChainStats::from_chain(&r.data));
        }
        Commands::TestConnection => {
            let report = router.test_connection().await?;
            print_result("API Connection Test", &report);
        }
        Commands::Settings { action } => match action {
            SettingsCommand::Show => print_result(
                "API Settings",
                &json!({
                    "base_url": router.current_base_url()?,
                    "mode": router.current_mode()?,
                    "data_dir": data_dir,
                }),
            ),
            SettingsCommand::SetUrl { url } => {
                let url = prefs.save_base_url(&url)?;
                print_result("API Settings", &json!({ "message": "Settings saved.", "base_url": url }));
            }
            SettingsCommand::SetMode { new_mode } => {
                prefs.save_mode(new_mode)?;
                print_result("API Settings", &json!({ "message": "Settings saved.", "mode": new_mode }));
            }
            SettingsCommand::Reset => {
                prefs.reset()?;
                print_result(
                    "API Settings",
                    &json!({
                        "message": "Settings reset to default.",
                        "base_url": prefs.default_base_url(),
                        "mode": Mode::Online,
                    }),
                );
            }
        },
        Commands::Explain { topic } => {
            print_assistant(&format!("AI Help: {topic}"), &insights::explain(&topic));
        }
        Commands::NextSteps => {
            let mode = router.current_mode()?;
            // An unreachable backend just means we know nothing about the chain yet.
            let chain_len = match router.get_chain().await {
                Ok(r) => ChainStats::from_chain(&r.data).length.unwrap_or(0),
                Err(_) => 0,
            };
            print_assistant("AI Help: Recommended Next Steps", &insights::next_steps(mode, chain_len));
        }
        Commands::Serve => {
            let addr = config.server.addr()?;
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            info!("ledger backend running on http://{addr}");
            axum::serve(listener, routes::app(AppState::default()))
                .await
                .context("server error")?;
        }
    }

    Ok(())
}
