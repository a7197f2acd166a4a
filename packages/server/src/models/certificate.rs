use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::activity::ActivityKind;

/// Everything needed to print or re-print a participant's certificate.
#[derive(Serialize, Debug, Clone, utoipa::ToSchema)]
pub struct CertificatePayload {
    pub subject_name: String,
    pub activity_title: String,
    pub kind: ActivityKind,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    #[schema(example = "9b2f5c1e-7d3a-4c8e-a1f0-3e6b2d9c4a57")]
    pub verification_code: String,
    /// Public link that resolves the code.
    pub verify_url: String,
    pub issued_at: Option<DateTime<Utc>>,
}

/// The only fields disclosed to an anonymous verifier.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct VerificationRecord {
    pub kind: ActivityKind,
    pub participant_name: String,
    pub activity_title: String,
    pub issued_at: Option<DateTime<Utc>>,
}
