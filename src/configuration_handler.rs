use crate::configuration::{Configuration, SmtpSettings};
use clap::Parser;
use std::path::PathBuf;

/// Runtime settings, from CLI flags first and environment variables second.
#[derive(Debug, Clone, Parser)]
pub struct ConfigurationHandler {
    /// Port the HTTP server listens on
    #[arg(long, env = "PORT", default_value = "3000")]
    port: String,

    /// Postgres connection string; omit to run with impersistent in-memory
    /// storage
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Password expected in the x-admin-password header on admin routes
    #[arg(long, env = "ADMIN_PASSWORD")]
    admin_password: String,

    /// SMTP relay host; omit to log confirmation mails instead of sending
    /// them
    #[arg(long, env = "SMTP_HOST")]
    smtp_host: Option<String>,

    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    smtp_port: u16,

    #[arg(long, env = "SMTP_USERNAME", default_value = "")]
    smtp_username: String,

    #[arg(long, env = "SMTP_PASSWORD", default_value = "")]
    smtp_password: String,

    /// From address on confirmation mails
    #[arg(long, env = "SMTP_SENDER", default_value = "bookings@example.com")]
    smtp_sender: String,

    /// Fixed recipient of booking confirmations
    #[arg(long, env = "OPERATOR_EMAIL", default_value = "operator@example.com")]
    operator_email: String,

    /// Optional image attached to every confirmation mail
    #[arg(long, env = "SIGNATURE_IMAGE")]
    signature_image: Option<PathBuf>,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> String {
        self.port.clone()
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }

    fn admin_password(&self) -> String {
        self.admin_password.clone()
    }

    fn smtp(&self) -> Option<SmtpSettings> {
        self.smtp_host.as_ref().map(|host| SmtpSettings {
            host: host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            sender: self.smtp_sender.clone(),
            operator: self.operator_email.clone(),
            signature_image: self.signature_image.clone(),
        })
    }
}
