pub mod config;
pub mod document;
pub mod mail;
pub mod qr;
pub mod retry;

pub use config::{MailConfig, MailTransport, SmtpConfig};
pub use document::{CertificateDocument, DocumentRenderer, RenderError, RenderedDocument};
pub use mail::{LogMailer, MailAttachment, MailError, MailMessage, Mailer, SmtpMailer};
pub use qr::{QrCodeEncoder, QrEncoder, QrError};
pub use retry::{RetryPolicy, Retryable};
