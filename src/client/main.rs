/**
 * formsync - Command-Line Entry Point
 *
 * Drives the offline-first forms client from a terminal: load forms, list
 * and upload drafts, and run the auto-sync loop.
 */
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;

use formsync::client::{
    BundleCache, Config, DraftStore, FormRepository, HttpFormsApi, HttpProbe, JsonPreferences,
    SubmissionPipeline, SyncEvent, SyncService,
};

#[derive(Parser)]
#[command(name = "formsync", version, about = "Offline-first form submission and draft sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the form bundle and list the forms
    Forms,
    /// List stored drafts
    Drafts,
    /// Upload every stored draft now
    Sync,
    /// Run the auto-sync loop until interrupted
    Watch,
    /// Turn background sync on or off
    AutoSync {
        #[arg(value_enum)]
        state: Switch,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let api = Arc::new(HttpFormsApi::from_config(&config)?);
    let drafts = Arc::new(DraftStore::new(config.drafts_dir()));
    let pipeline = SubmissionPipeline::new(api.clone(), drafts.clone());
    let sync = SyncService::new(
        pipeline,
        Arc::new(JsonPreferences::new(config.preferences_path())),
        Arc::new(HttpProbe::from_config(&config)?),
    )
    .with_interval(config.sync_interval());

    match cli.command {
        Commands::Forms => {
            let repository = FormRepository::new(BundleCache::new(config.cache_path()));
            let loaded = repository.load_or_fallback(api.as_ref()).await;
            println!("{}", loaded.origin.banner());
            for key in loaded.bundle.ordered_keys() {
                if let Some(form) = loaded.bundle.get(key) {
                    println!("  {:<20} {}", key, form.meta.name);
                }
            }
        }
        Commands::Drafts => {
            let summaries = drafts.summaries().await?;
            if summaries.is_empty() {
                println!("No drafts");
            }
            for summary in summaries {
                let saved = summary
                    .saved_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let status = match (&summary.error, summary.unreadable) {
                    (_, true) => "unreadable".to_string(),
                    (Some(reason), _) => reason.to_string(),
                    (None, _) => "saved".to_string(),
                };
                println!("  {}  {:<16} {}  {}", saved, summary.form, summary.id, status);
            }
        }
        Commands::Sync => {
            let report = sync.retry_all().await;
            println!("Sync complete: {}", report);
        }
        Commands::Watch => {
            let mut events = sync.subscribe();
            println!("Connectivity: {:?}", sync.check_connectivity().await);
            sync.start_auto_sync().await;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(SyncEvent::AutoSyncCompleted(report)) => {
                            println!("Auto-sync complete: {}", report);
                        }
                        Ok(SyncEvent::Connectivity(status)) => {
                            println!("Connectivity: {:?}", status);
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            sync.stop_auto_sync().await;
        }
        Commands::AutoSync { state } => {
            let enabled = matches!(state, Switch::On);
            sync.set_auto_sync_enabled(enabled).await?;
            println!("Auto-sync {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    Ok(())
}
