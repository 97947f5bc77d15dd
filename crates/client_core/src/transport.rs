//! API boundary: the remote document-storage service.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    domain::{Credential, DocumentEntry, DocumentId, PatientId},
    error::ErrorBody,
    protocol::{
        DeleteResponse, ListDocumentsQuery, LoginRequest, LoginResponse, PDF_MIME_TYPE,
        UPLOAD_FILE_FIELD, UPLOAD_PATIENT_FIELD,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    environment::SelectedFile,
    error::{ClientError, Operation},
};

#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn login(&self, username: &str) -> Result<Credential, ClientError>;
    async fn list_documents(
        &self,
        credential: &Credential,
        patient_id: &PatientId,
    ) -> Result<Vec<DocumentEntry>, ClientError>;
    async fn upload_document(
        &self,
        credential: &Credential,
        patient_id: &PatientId,
        file: &SelectedFile,
    ) -> Result<(), ClientError>;
    async fn download_document(
        &self,
        credential: &Credential,
        document_id: DocumentId,
    ) -> Result<Vec<u8>, ClientError>;
    async fn delete_document(
        &self,
        credential: &Credential,
        document_id: DocumentId,
    ) -> Result<(), ClientError>;
}

pub struct HttpDocumentApi {
    http: Client,
    base_url: Url,
}

impl HttpDocumentApi {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

fn classify(operation: Operation, err: reqwest::Error) -> ClientError {
    if err.is_decode() || err.is_builder() {
        ClientError::unexpected(operation, err)
    } else {
        ClientError::transport(operation, &err)
    }
}

async fn ensure_success(operation: Operation, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let raw = match response.bytes().await {
        Ok(raw) => raw.to_vec(),
        Err(err) => {
            warn!(%operation, error = %err, "failed to read error body");
            Vec::new()
        }
    };
    Err(ClientError::Operation {
        operation,
        status,
        body: ErrorBody::parse(&raw),
    })
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    async fn login(&self, username: &str) -> Result<Credential, ClientError> {
        let operation = Operation::Authenticate;
        let response = self
            .http
            .post(self.endpoint("/auth/login"))
            .json(&LoginRequest {
                username: username.to_string(),
            })
            .send()
            .await
            .map_err(|err| classify(operation, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Auth { status });
        }
        let body: LoginResponse = response
            .json()
            .await
            .map_err(|err| classify(operation, err))?;
        debug!(username, "auth: access token issued");
        Ok(Credential::new(body.access_token))
    }

    async fn list_documents(
        &self,
        credential: &Credential,
        patient_id: &PatientId,
    ) -> Result<Vec<DocumentEntry>, ClientError> {
        let operation = Operation::List;
        let response = self
            .http
            .get(self.endpoint("/files"))
            .bearer_auth(credential.token())
            .query(&ListDocumentsQuery {
                patient_id: patient_id.clone(),
            })
            .send()
            .await
            .map_err(|err| classify(operation, err))?;
        let documents: Vec<DocumentEntry> = ensure_success(operation, response)
            .await?
            .json()
            .await
            .map_err(|err| classify(operation, err))?;
        debug!(patient_id = %patient_id, count = documents.len(), "files: listed");
        Ok(documents)
    }

    async fn upload_document(
        &self,
        credential: &Credential,
        patient_id: &PatientId,
        file: &SelectedFile,
    ) -> Result<(), ClientError> {
        let operation = Operation::Upload;
        let mime_type = file.mime_type.as_deref().unwrap_or(PDF_MIME_TYPE);
        let part = Part::bytes(file.content.clone())
            .file_name(file.filename.clone())
            .mime_str(mime_type)
            .map_err(|err| classify(operation, err))?;
        let form = Form::new()
            .text(UPLOAD_PATIENT_FIELD, patient_id.as_str().to_string())
            .part(UPLOAD_FILE_FIELD, part);
        let response = self
            .http
            .post(self.endpoint("/files/upload"))
            .bearer_auth(credential.token())
            .multipart(form)
            .send()
            .await
            .map_err(|err| classify(operation, err))?;
        ensure_success(operation, response).await?;
        debug!(
            patient_id = %patient_id,
            filename = %file.filename,
            size = file.content.len(),
            "files: uploaded"
        );
        Ok(())
    }

    async fn download_document(
        &self,
        credential: &Credential,
        document_id: DocumentId,
    ) -> Result<Vec<u8>, ClientError> {
        let operation = Operation::Download;
        let response = self
            .http
            .get(self.endpoint(&format!("/files/{document_id}/download")))
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|err| classify(operation, err))?;
        let bytes = ensure_success(operation, response)
            .await?
            .bytes()
            .await
            .map_err(|err| classify(operation, err))?;
        debug!(document_id = document_id.0, size = bytes.len(), "files: downloaded");
        Ok(bytes.to_vec())
    }

    async fn delete_document(
        &self,
        credential: &Credential,
        document_id: DocumentId,
    ) -> Result<(), ClientError> {
        let operation = Operation::Delete;
        let response = self
            .http
            .delete(self.endpoint(&format!("/files/{document_id}")))
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|err| classify(operation, err))?;
        let response = ensure_success(operation, response).await?;
        // The acknowledgement body is informational only.
        match response.json::<DeleteResponse>().await {
            Ok(ack) => debug!(
                document_id = document_id.0,
                status = %ack.status,
                message = ack.message.as_deref(),
                "files: deleted"
            ),
            Err(_) => debug!(document_id = document_id.0, "files: deleted"),
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
