use std::{fmt::Display, io::Write as _, path::PathBuf, str::FromStr, sync::Arc};

use anyhow::Result;
use chrono::{Local, TimeZone};
use client_core::{
    ControllerSnapshot, DocumentController, InlineMessageKind, Notification, NotificationCenter,
    NotificationEvent, NotificationId, NotificationKind, OperationOutcome,
};
use shared::domain::{format_file_size, DocumentId, PatientId};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, warn};

use crate::host::{pick_file, read_line};

pub const HELP_TEXT: &str = "\
Commands:
  list                 reload documents for the current patient
  patient [id]         switch patient (empty clears the list)
  select <path>        choose a PDF file to upload
  upload               upload the selected file
  download <id>        save a document into the download directory
  delete <id>          delete a document (asks for confirmation)
  notices              show active notifications
  dismiss <id>         dismiss a notification
  help                 show this text
  quit                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Patient(String),
    Select(PathBuf),
    Upload,
    Download(DocumentId),
    Delete(DocumentId),
    Notices,
    Dismiss(NotificationId),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => Ok(Self::List),
            "patient" => Ok(Self::Patient(rest.to_string())),
            "select" if !rest.is_empty() => Ok(Self::Select(PathBuf::from(rest))),
            "select" => Err("usage: select <path>".into()),
            "upload" => Ok(Self::Upload),
            "download" => parse_document_id(rest, "download").map(Self::Download),
            "delete" | "rm" => parse_document_id(rest, "delete").map(Self::Delete),
            "notices" => Ok(Self::Notices),
            "dismiss" => rest
                .parse::<u64>()
                .map(|id| Self::Dismiss(NotificationId(id)))
                .map_err(|_| "usage: dismiss <notification id>".to_string()),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}', type 'help'")),
        }
    }
}

fn parse_document_id(raw: &str, verb: &str) -> Result<DocumentId, String> {
    raw.parse::<i64>()
        .map(DocumentId)
        .map_err(|_| format!("usage: {verb} <document id>"))
}

pub fn render_snapshot<Tz>(snapshot: &ControllerSnapshot, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    let patient = if snapshot.patient_id.is_empty() {
        "(none)"
    } else {
        snapshot.patient_id.as_str()
    };
    out.push_str(&format!("Patient: {patient}"));
    if snapshot.loading {
        out.push_str("  Loading...");
    }
    out.push('\n');

    if snapshot.documents.is_empty() {
        if !snapshot.loading {
            out.push_str("  No documents found for this patient\n");
        }
    } else {
        for doc in &snapshot.documents {
            out.push_str(&format!(
                "  [{}] {}  {} • {}\n",
                doc.id,
                doc.filename,
                format_file_size(doc.size),
                doc.uploaded_at
                    .with_timezone(tz)
                    .format("%Y-%m-%d %H:%M:%S")
            ));
        }
    }

    if let Some(selected) = &snapshot.selected_file {
        out.push_str(&format!("Selected: {selected}\n"));
    }
    if let Some(message) = &snapshot.inline_message {
        let marker = match message.kind {
            InlineMessageKind::Success => "✓",
            InlineMessageKind::Error => "✗",
        };
        out.push_str(&format!("{marker} {}\n", message.text));
    }
    out
}

pub fn format_notification(notification: &Notification) -> String {
    let label = match notification.kind {
        NotificationKind::Error => "error",
        NotificationKind::Success => "success",
        NotificationKind::Info => "info",
        NotificationKind::Warning => "warning",
    };
    format!("[{label} #{}] {}", notification.id, notification.message)
}

/// Prints notifications as they are published until the center goes away.
pub fn spawn_notification_printer(notifications: &NotificationCenter) -> JoinHandle<()> {
    let mut events = notifications.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(NotificationEvent::Published(notification)) => {
                    println!("{}", format_notification(&notification));
                }
                Ok(NotificationEvent::Dismissed(id)) => {
                    debug!(notification_id = id.0, "notification dismissed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

pub async fn run(controller: Arc<DocumentController>, notifications: NotificationCenter) -> Result<()> {
    println!("{HELP_TEXT}");
    print!("{}", render_snapshot(&controller.snapshot(), &Local));

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = read_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        if execute(&controller, &notifications, command).await {
            print!("{}", render_snapshot(&controller.snapshot(), &Local));
        }
    }
    Ok(())
}

/// Runs one command. Returns whether the document view should be redrawn.
async fn execute(
    controller: &DocumentController,
    notifications: &NotificationCenter,
    command: Command,
) -> bool {
    match command {
        Command::List => report(controller.list_documents().await),
        Command::Patient(id) => report(controller.set_patient_context(PatientId::new(id)).await),
        Command::Select(path) => match pick_file(&path).await {
            Ok(file) => controller.select_file(Some(file)),
            Err(err) => println!("{err:#}"),
        },
        Command::Upload => report(controller.upload_document().await),
        Command::Download(id) => {
            let filename = controller
                .documents()
                .into_iter()
                .find(|doc| doc.id == id)
                .map(|doc| doc.filename)
                .unwrap_or_else(|| format!("document-{id}.pdf"));
            report(controller.download_document(id, &filename).await)
        }
        Command::Delete(id) => report(controller.delete_document(id).await),
        Command::Notices => {
            let active = notifications.snapshot();
            if active.is_empty() {
                println!("No notifications");
            }
            for notification in &active {
                println!("{}", format_notification(notification));
            }
            return false;
        }
        Command::Dismiss(id) => {
            if !notifications.dismiss(id) {
                println!("No notification #{id}");
            }
            return false;
        }
        Command::Help => {
            println!("{HELP_TEXT}");
            return false;
        }
        Command::Quit => return false,
    }
    true
}

fn report(outcome: OperationOutcome) {
    match outcome {
        OperationOutcome::Skipped => println!("Nothing to do: not signed in or no patient set"),
        OperationOutcome::Declined => println!("Delete cancelled"),
        OperationOutcome::Completed | OperationOutcome::Failed(_) | OperationOutcome::Rejected => {}
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
