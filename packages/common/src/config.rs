use serde::Deserialize;

/// How outgoing mail leaves the process.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Deliver through the configured SMTP relay.
    #[default]
    Smtp,
    /// Development only: accept every message and log it instead of sending.
    Log,
}

/// SMTP relay settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    /// Relay host name. Required when the SMTP transport is enabled.
    #[serde(default)]
    pub host: Option<String>,
    /// Default: 587.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Implicit TLS from the first byte (usually port 465). When false,
    /// STARTTLS is used if the server offers it. Default: false.
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Bound on connecting and on each SMTP exchange. Default: 10.
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_smtp_port() -> u16 {
    587
}
fn default_smtp_timeout_secs() -> u64 {
    10
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_smtp_port(),
            secure: false,
            user: None,
            password: None,
            timeout_secs: default_smtp_timeout_secs(),
        }
    }
}

/// Outbound mail configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// Whether a mail transport is available. Default: false.
    /// When disabled, every send reports the transport as unavailable.
    #[serde(default)]
    pub enabled: bool,
    /// Default: `smtp`.
    #[serde(default)]
    pub transport: MailTransport,
    /// Sender address. Default: "no-reply@example.com".
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Event name used in subjects and bodies. Default: "Event Registrar".
    #[serde(default = "default_site_name")]
    pub site_name: String,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

fn default_mail_from() -> String {
    "no-reply@example.com".into()
}
fn default_site_name() -> String {
    "Event Registrar".into()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            transport: MailTransport::default(),
            from: default_mail_from(),
            site_name: default_site_name(),
            smtp: SmtpConfig::default(),
        }
    }
}
