//! Document operations for the selected patient: list, upload, download, delete.
//!
//! Every remote failure is caught here, classified and turned into feedback:
//! the inline message slot, the notification center, or both. Nothing is
//! propagated to the caller beyond an [`OperationOutcome`] describing what
//! happened.
//!
//! The `loading` flag is advisory. Overlapping operations each raise it and
//! each lower it when they finish, so it can read idle while another request
//! is still outstanding. Requests are never serialized or cancelled, and a
//! list response that arrives after the patient context changed again still
//! replaces the document list.

use std::{
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
    time::Duration,
};

use shared::domain::{Credential, DocumentEntry, DocumentId, PatientId};
use tracing::{debug, info, warn};

use crate::{
    environment::{ConfirmationGate, DocumentSink, SelectedFile},
    error::{ClientError, Operation, NO_FILE_SELECTED_MESSAGE},
    inline_message::{InlineMessage, InlineMessageSlot},
    notifications::NotificationCenter,
    transport::DocumentApi,
};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";
pub const DELETE_SUCCESS_MESSAGE: &str = "File deleted successfully";
pub const DELETE_CONFIRMATION_PROMPT: &str = "Are you sure you want to delete this file?";

const SUCCESS_MESSAGE_TTL: Duration = Duration::from_millis(3000);
const VALIDATION_MESSAGE_TTL: Duration = Duration::from_millis(3000);
const UPLOAD_FAILURE_TTL: Duration = Duration::from_millis(5000);
const DOWNLOAD_FAILURE_TTL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Completed,
    Failed(ClientError),
    /// Rejected locally before any request was made.
    Rejected,
    /// The user declined the confirmation prompt.
    Declined,
    /// Preconditions not met (no credential, no patient); nothing was done.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub patient_id: PatientId,
    pub documents: Vec<DocumentEntry>,
    pub loading: bool,
    pub selected_file: Option<String>,
    pub inline_message: Option<InlineMessage>,
}

struct ControllerState {
    patient_id: PatientId,
    documents: Vec<DocumentEntry>,
    loading: bool,
    selected_file: Option<SelectedFile>,
}

pub struct DocumentController {
    api: Arc<dyn DocumentApi>,
    notifications: NotificationCenter,
    sink: Arc<dyn DocumentSink>,
    confirmation: Arc<dyn ConfirmationGate>,
    credential: OnceLock<Credential>,
    state: Mutex<ControllerState>,
    inline: InlineMessageSlot,
}

impl DocumentController {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        notifications: NotificationCenter,
        sink: Arc<dyn DocumentSink>,
        confirmation: Arc<dyn ConfirmationGate>,
        patient_id: PatientId,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            notifications,
            sink,
            confirmation,
            credential: OnceLock::new(),
            state: Mutex::new(ControllerState {
                patient_id,
                documents: Vec::new(),
                loading: false,
                selected_file: None,
            }),
            inline: InlineMessageSlot::new(),
        })
    }

    /// Hands over the session credential and loads the first document list.
    pub async fn attach_credential(&self, credential: Credential) -> OperationOutcome {
        if self.credential.set(credential).is_err() {
            warn!("documents: credential already attached, ignoring replacement");
            return OperationOutcome::Skipped;
        }
        info!("documents: credential attached");
        self.list_documents().await
    }

    pub fn has_credential(&self) -> bool {
        self.credential.get().is_some()
    }

    pub fn patient_id(&self) -> PatientId {
        self.state().patient_id.clone()
    }

    pub fn documents(&self) -> Vec<DocumentEntry> {
        self.state().documents.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn selected_file(&self) -> Option<SelectedFile> {
        self.state().selected_file.clone()
    }

    pub fn inline_message(&self) -> Option<InlineMessage> {
        self.inline.current()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.state();
        ControllerSnapshot {
            patient_id: state.patient_id.clone(),
            documents: state.documents.clone(),
            loading: state.loading,
            selected_file: state
                .selected_file
                .as_ref()
                .map(|file| file.filename.clone()),
            inline_message: self.inline.current(),
        }
    }

    pub fn select_file(&self, file: Option<SelectedFile>) {
        debug!(
            filename = file.as_ref().map(|f| f.filename.as_str()),
            "documents: file selection changed"
        );
        self.state().selected_file = file;
    }

    /// Switches the patient and reloads the list for it. An in-flight fetch for
    /// the previous patient is not cancelled.
    pub async fn set_patient_context(&self, patient_id: PatientId) -> OperationOutcome {
        info!(patient_id = %patient_id, "documents: patient context changed");
        self.state().patient_id = patient_id;
        if !self.has_credential() {
            return OperationOutcome::Skipped;
        }
        self.list_documents().await
    }

    pub async fn list_documents(&self) -> OperationOutcome {
        let Some(credential) = self.held_credential(Operation::List) else {
            return OperationOutcome::Skipped;
        };
        let patient_id = self.patient_id();
        if patient_id.is_empty() {
            debug!("documents: empty patient context, clearing list");
            self.state().documents.clear();
            return OperationOutcome::Skipped;
        }

        self.set_loading(true);
        let result = self.api.list_documents(&credential, &patient_id).await;
        let outcome = match result {
            Ok(documents) => {
                info!(
                    patient_id = %patient_id,
                    count = documents.len(),
                    "documents: list replaced"
                );
                self.state().documents = documents;
                OperationOutcome::Completed
            }
            Err(err) => {
                warn!(patient_id = %patient_id, error = %err, "documents: list failed");
                self.notifications.publish_error(err.user_message());
                OperationOutcome::Failed(err)
            }
        };
        self.set_loading(false);
        outcome
    }

    pub async fn upload_document(&self) -> OperationOutcome {
        let file = self.selected_file().filter(SelectedFile::is_pdf);
        let Some(file) = file else {
            debug!("documents: upload rejected, no pdf selected");
            self.inline.set(
                InlineMessage::error(NO_FILE_SELECTED_MESSAGE),
                Some(VALIDATION_MESSAGE_TTL),
            );
            return OperationOutcome::Rejected;
        };
        let Some(credential) = self.held_credential(Operation::Upload) else {
            return OperationOutcome::Skipped;
        };
        let patient_id = self.patient_id();

        self.set_loading(true);
        self.inline.clear();
        let outcome = match self
            .api
            .upload_document(&credential, &patient_id, &file)
            .await
        {
            Ok(()) => {
                info!(
                    patient_id = %patient_id,
                    filename = %file.filename,
                    "documents: upload succeeded"
                );
                // The countdown starts once the refreshed list is in.
                let generation = self
                    .inline
                    .set(InlineMessage::success(UPLOAD_SUCCESS_MESSAGE), None);
                self.state().selected_file = None;
                self.list_documents().await;
                self.inline.clear_after(generation, SUCCESS_MESSAGE_TTL);
                OperationOutcome::Completed
            }
            Err(err) => {
                warn!(patient_id = %patient_id, error = %err, "documents: upload failed");
                self.report_failure(&err, Some(UPLOAD_FAILURE_TTL));
                OperationOutcome::Failed(err)
            }
        };
        self.set_loading(false);
        outcome
    }

    /// Fetches the document and hands it to the save-as sink. Success is silent.
    pub async fn download_document(
        &self,
        document_id: DocumentId,
        filename: &str,
    ) -> OperationOutcome {
        let Some(credential) = self.held_credential(Operation::Download) else {
            return OperationOutcome::Skipped;
        };

        self.set_loading(true);
        let result = match self.api.download_document(&credential, document_id).await {
            Ok(bytes) => self
                .sink
                .save(filename, bytes)
                .await
                .map_err(|err| ClientError::unexpected(Operation::Download, format!("{err:#}"))),
            Err(err) => Err(err),
        };
        let outcome = match result {
            Ok(()) => {
                info!(document_id = document_id.0, filename, "documents: download handed off");
                OperationOutcome::Completed
            }
            Err(err) => {
                warn!(document_id = document_id.0, error = %err, "documents: download failed");
                self.report_failure(&err, Some(DOWNLOAD_FAILURE_TTL));
                OperationOutcome::Failed(err)
            }
        };
        self.set_loading(false);
        outcome
    }

    pub async fn delete_document(&self, document_id: DocumentId) -> OperationOutcome {
        if !self.confirmation.confirm(DELETE_CONFIRMATION_PROMPT).await {
            debug!(document_id = document_id.0, "documents: delete declined");
            return OperationOutcome::Declined;
        }
        let Some(credential) = self.held_credential(Operation::Delete) else {
            return OperationOutcome::Skipped;
        };

        self.set_loading(true);
        let outcome = match self.api.delete_document(&credential, document_id).await {
            Ok(()) => {
                info!(document_id = document_id.0, "documents: delete succeeded");
                let generation = self
                    .inline
                    .set(InlineMessage::success(DELETE_SUCCESS_MESSAGE), None);
                self.list_documents().await;
                self.inline.clear_after(generation, SUCCESS_MESSAGE_TTL);
                OperationOutcome::Completed
            }
            Err(err) => {
                warn!(document_id = document_id.0, error = %err, "documents: delete failed");
                // Stays visible until the next outcome overwrites it.
                self.report_failure(&err, None);
                OperationOutcome::Failed(err)
            }
        };
        self.set_loading(false);
        outcome
    }

    fn report_failure(&self, err: &ClientError, auto_clear: Option<Duration>) {
        let message = err.user_message();
        self.inline.set(InlineMessage::error(message.clone()), auto_clear);
        self.notifications.publish_error(message);
    }

    fn held_credential(&self, operation: Operation) -> Option<Credential> {
        let credential = self.credential.get().cloned();
        if credential.is_none() {
            debug!(%operation, "documents: no credential held, request not issued");
        }
        credential
    }

    fn set_loading(&self, loading: bool) {
        self.state().loading = loading;
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
