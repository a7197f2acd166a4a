use chrono::{DateTime, Utc};
use thiserror::Error;

/// Everything a certificate document shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateDocument {
    pub subject_name: String,
    pub activity_title: String,
    /// Human label of the activity kind ("Workshop", "Competition").
    pub activity_kind: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub verification_code: String,
    pub verify_url: String,
}

/// A rendered, downloadable document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub content_type: &'static str,
    pub file_extension: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("certificate field `{0}` is empty")]
    MissingField(&'static str),
    #[error("rendering failed: {0}")]
    Failed(String),
}

/// Produces the binary certificate handed to participants.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, doc: &CertificateDocument) -> Result<RenderedDocument, RenderError>;
}

/// Renders certificates as plain UTF-8 text.
#[derive(Debug, Clone)]
pub struct TextCertificateRenderer {
    pub event_name: String,
}

impl TextCertificateRenderer {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
        }
    }
}

impl DocumentRenderer for TextCertificateRenderer {
    fn render(&self, doc: &CertificateDocument) -> Result<RenderedDocument, RenderError> {
        if doc.subject_name.trim().is_empty() {
            return Err(RenderError::MissingField("subject_name"));
        }
        if doc.verification_code.is_empty() {
            return Err(RenderError::MissingField("verification_code"));
        }

        let text = format!(
            "{event}\n\nCERTIFICATE\n\nAwarded to\n\n{name}\n\nfor taking part in the {kind} \"{title}\"\n{start} - {end}\n\nVerification code: {code}\nVerify at: {url}\n",
            event = self.event_name,
            name = doc.subject_name.to_uppercase(),
            kind = doc.activity_kind.to_lowercase(),
            title = doc.activity_title,
            start = doc.window_start.format("%B %-d, %Y"),
            end = doc.window_end.format("%B %-d, %Y"),
            code = doc.verification_code,
            url = doc.verify_url,
        );

        Ok(RenderedDocument {
            content_type: "text/plain; charset=utf-8",
            file_extension: "txt",
            bytes: text.into_bytes(),
        })
    }
}
