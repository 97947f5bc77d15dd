//! Scripted collaborators shared by the controller and session tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use shared::{
    domain::{Credential, DocumentEntry, DocumentId, PatientId},
    error::ErrorBody,
};
use tokio::sync::oneshot;

use crate::{
    environment::{ConfirmationGate, DocumentSink, SelectedFile},
    error::{ClientError, Operation},
    transport::DocumentApi,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApiCall {
    Login(String),
    List(PatientId),
    Upload { patient_id: PatientId, filename: String },
    Download(DocumentId),
    Delete(DocumentId),
}

pub(crate) struct ScriptedList {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<Vec<DocumentEntry>, ClientError>,
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    calls: Mutex<Vec<ApiCall>>,
    logins: Mutex<VecDeque<Result<Credential, ClientError>>>,
    lists: Mutex<VecDeque<ScriptedList>>,
    uploads: Mutex<VecDeque<Result<(), ClientError>>>,
    downloads: Mutex<VecDeque<Result<Vec<u8>, ClientError>>>,
    deletes: Mutex<VecDeque<Result<(), ClientError>>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("calls").clone()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ApiCall::List(_)))
            .count()
    }

    pub(crate) fn push_login(&self, result: Result<Credential, ClientError>) {
        self.logins.lock().expect("logins").push_back(result);
    }

    pub(crate) fn push_list(&self, result: Result<Vec<DocumentEntry>, ClientError>) {
        self.lists.lock().expect("lists").push_back(ScriptedList { gate: None, result });
    }

    /// Queues a list response that is only delivered once the returned sender fires.
    pub(crate) fn push_gated_list(
        &self,
        result: Result<Vec<DocumentEntry>, ClientError>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lists.lock().expect("lists").push_back(ScriptedList {
            gate: Some(rx),
            result,
        });
        tx
    }

    pub(crate) fn push_upload(&self, result: Result<(), ClientError>) {
        self.uploads.lock().expect("uploads").push_back(result);
    }

    pub(crate) fn push_download(&self, result: Result<Vec<u8>, ClientError>) {
        self.downloads.lock().expect("downloads").push_back(result);
    }

    pub(crate) fn push_delete(&self, result: Result<(), ClientError>) {
        self.deletes.lock().expect("deletes").push_back(result);
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().expect("calls").push(call);
    }
}

#[async_trait]
impl DocumentApi for ScriptedApi {
    async fn login(&self, username: &str) -> Result<Credential, ClientError> {
        self.record(ApiCall::Login(username.to_string()));
        self.logins
            .lock()
            .expect("logins")
            .pop_front()
            .unwrap_or_else(|| Ok(Credential::new("test-token")))
    }

    async fn list_documents(
        &self,
        _credential: &Credential,
        patient_id: &PatientId,
    ) -> Result<Vec<DocumentEntry>, ClientError> {
        self.record(ApiCall::List(patient_id.clone()));
        let scripted = self.lists.lock().expect("lists").pop_front();
        let Some(scripted) = scripted else {
            return Ok(Vec::new());
        };
        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }
        scripted.result
    }

    async fn upload_document(
        &self,
        _credential: &Credential,
        patient_id: &PatientId,
        file: &SelectedFile,
    ) -> Result<(), ClientError> {
        self.record(ApiCall::Upload {
            patient_id: patient_id.clone(),
            filename: file.filename.clone(),
        });
        self.uploads
            .lock()
            .expect("uploads")
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn download_document(
        &self,
        _credential: &Credential,
        document_id: DocumentId,
    ) -> Result<Vec<u8>, ClientError> {
        self.record(ApiCall::Download(document_id));
        self.downloads
            .lock()
            .expect("downloads")
            .pop_front()
            .unwrap_or_else(|| Ok(b"%PDF-1.4 test".to_vec()))
    }

    async fn delete_document(
        &self,
        _credential: &Credential,
        document_id: DocumentId,
    ) -> Result<(), ClientError> {
        self.record(ApiCall::Delete(document_id));
        self.deletes
            .lock()
            .expect("deletes")
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
    fail_with: Option<String>,
}

impl RecordingSink {
    pub(crate) fn failing(reason: impl Into<String>) -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    pub(crate) fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().expect("saved").clone()
    }
}

#[async_trait]
impl DocumentSink for RecordingSink {
    async fn save(&self, filename: &str, bytes: Vec<u8>) -> anyhow::Result<()> {
        if let Some(reason) = &self.fail_with {
            return Err(anyhow!(reason.clone()));
        }
        self.saved
            .lock()
            .expect("saved")
            .push((filename.to_string(), bytes));
        Ok(())
    }
}

pub(crate) struct ScriptedConfirmation {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmation {
    pub(crate) fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts").clone()
    }
}

#[async_trait]
impl ConfirmationGate for ScriptedConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().expect("prompts").push(prompt.to_string());
        self.answer
    }
}

pub(crate) fn entry(id: i64, filename: &str) -> DocumentEntry {
    DocumentEntry {
        id: DocumentId(id),
        patient_id: None,
        filename: filename.to_string(),
        size: 1024 * id as u64,
        uploaded_at: Utc
            .with_ymd_and_hms(2024, 3, 5, 10, 0, 0)
            .single()
            .expect("timestamp"),
    }
}

pub(crate) fn status_error(operation: Operation, status: StatusCode, body: &[u8]) -> ClientError {
    ClientError::Operation {
        operation,
        status,
        body: ErrorBody::parse(body),
    }
}

pub(crate) fn transport_error(operation: Operation) -> ClientError {
    ClientError::Transport {
        operation,
        reason: "error sending request: connection refused".to_string(),
    }
}

/// Lets spawned timer tasks observe a clock advance.
pub(crate) async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
