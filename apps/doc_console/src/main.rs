use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    AlwaysConfirm, ConfirmationGate, DocumentApi, DocumentController, HttpDocumentApi,
    NotificationCenter, SessionBootstrapper,
};
use shared::domain::PatientId;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod host;
mod shell;

use config::{load_settings, ClientSettings};
use host::{DirectorySink, StdinConfirmation};

#[derive(Parser, Debug)]
#[command(about = "Interactive console for a patient's documents")]
struct Args {
    /// Config file (defaults to ./doc_console.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_base: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    patient_id: Option<String>,
    #[arg(long)]
    download_dir: Option<PathBuf>,
    /// Delete without asking
    #[arg(long)]
    yes: bool,
}

impl Args {
    fn apply(&self, settings: &mut ClientSettings) {
        if let Some(v) = &self.api_base {
            settings.api_base = v.clone();
        }
        if let Some(v) = &self.username {
            settings.username = v.clone();
        }
        if let Some(v) = &self.patient_id {
            settings.patient_id = v.clone();
        }
        if let Some(v) = &self.download_dir {
            settings.download_dir = v.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    args.apply(&mut settings);
    let base_url = settings.api_base_url()?;
    info!(
        api_base = %base_url,
        username = %settings.username,
        patient_id = %settings.patient_id,
        download_dir = %settings.download_dir.display(),
        "starting document console"
    );

    let notifications = NotificationCenter::with_default_duration(settings.notification_duration());
    let printer = shell::spawn_notification_printer(&notifications);

    let api: Arc<dyn DocumentApi> = Arc::new(HttpDocumentApi::new(base_url));
    let confirmation: Arc<dyn ConfirmationGate> = if args.yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(StdinConfirmation)
    };
    let controller = DocumentController::new(
        api.clone(),
        notifications.clone(),
        Arc::new(DirectorySink::new(settings.download_dir.clone())),
        confirmation,
        PatientId::new(settings.patient_id.clone()),
    );

    let session = SessionBootstrapper::new(api, notifications.clone());
    match session.acquire_credential(&settings.username).await {
        Ok(credential) => {
            controller.attach_credential(credential).await;
        }
        Err(err) => warn!(error = %err, "continuing without a session; document actions are disabled"),
    }

    let result = shell::run(controller, notifications).await;
    printer.abort();
    result
}
