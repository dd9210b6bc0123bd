use std::path::PathBuf;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> String;
    fn database_url(&self) -> Option<String>;
    fn admin_password(&self) -> String;
    /// None when no SMTP relay is configured; confirmation mails are then
    /// only logged.
    fn smtp(&self) -> Option<SmtpSettings>;
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// From address on confirmation mails.
    pub sender: String,
    /// Fixed recipient of every booking confirmation.
    pub operator: String,
    /// Optional image attached to every confirmation mail.
    pub signature_image: Option<PathBuf>,
}
