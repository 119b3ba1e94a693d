use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::issue::IssuedCertificate;

pub const SUCCESS_MESSAGE: &str = "Certificate generated successfully";

/// JSON envelope returned by every certificate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Base64-encoded PDF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ApiResponse {
    pub fn certificate(certificate: &IssuedCertificate) -> Self {
        Self {
            success: true,
            message: Some(SUCCESS_MESSAGE.to_string()),
            data: Some(STANDARD.encode(&certificate.pdf)),
            filename: Some(certificate.filename.clone()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            filename: None,
        }
    }
}
