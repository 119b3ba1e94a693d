use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::info;

use crate::pdf::{format_name, CertificateRenderer, RenderError};
use crate::roster::{RosterCache, RosterError};
use crate::verify::verify_participant;

pub const NOT_FOUND_MESSAGE: &str =
    "Participant details not found in registered participants list";

static EMAIL: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL.get_or_init(|| {
        Regex::new(r"(?i)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@([a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$")
            .expect("Invalid email pattern")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    !email.starts_with('.') && !email.contains("..") && email_pattern().is_match(email)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub name: String,
    pub rollno: String,
    pub email: String,
}

impl VerificationRequest {
    /// Shape checks run before the roster is consulted. Name and roll number
    /// only need a non-blank value; the email must match as sent, so padding
    /// around it is rejected.
    pub fn validate(&self) -> Result<(), IssueError> {
        if self.name.trim().is_empty() {
            return Err(IssueError::Invalid("Full name is required".to_string()));
        }
        if self.rollno.trim().is_empty() {
            return Err(IssueError::Invalid("Roll number is required".to_string()));
        }
        if !is_valid_email(&self.email) {
            return Err(IssueError::Invalid("Invalid email address".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("{0}")]
    Invalid(String),
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub filename: String,
    pub pdf: Vec<u8>,
}

/// Download name for a participant's certificate: whitespace runs become
/// underscores, then `_Certificate.pdf` is appended.
pub fn certificate_filename(name: &str) -> String {
    let stem = name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{stem}_Certificate.pdf")
}

/// Verify-then-render pipeline. Owns the roster cache for the lifetime of the
/// process.
pub struct CertificateService {
    roster: RosterCache,
    renderer: CertificateRenderer,
}

impl CertificateService {
    pub fn new(roster: RosterCache, renderer: CertificateRenderer) -> Self {
        Self { roster, renderer }
    }

    /// Blocking: may read the roster, template and font from disk.
    pub fn issue(&self, request: &VerificationRequest) -> Result<IssuedCertificate, IssueError> {
        request.validate()?;

        let participants = self.roster.participants()?;
        if !verify_participant(&request.name, &request.rollno, &request.email, &participants) {
            return Err(IssueError::NotFound);
        }

        let name = format_name(&request.name);
        let pdf = self.renderer.render(&name)?;
        info!(%name, bytes = pdf.len(), "Certificate generated");

        Ok(IssuedCertificate {
            filename: certificate_filename(&request.name),
            pdf,
        })
    }
}
