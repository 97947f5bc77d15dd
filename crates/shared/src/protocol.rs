use serde::{Deserialize, Serialize};

use crate::domain::PatientId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDocumentsQuery {
    pub patient_id: PatientId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default = "default_delete_status")]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_delete_status() -> String {
    "deleted".to_string()
}

pub const UPLOAD_PATIENT_FIELD: &str = "patient_id";
pub const UPLOAD_FILE_FIELD: &str = "file";
pub const PDF_MIME_TYPE: &str = "application/pdf";
