use std::time::Duration;

use crate::{
    configuration::Configuration, configuration_handler::ConfigurationHandler,
    database_interface::DatabaseInterface, http::create_app, local_store::LocalStore,
    mailer::{LogMailer, Notifier, SmtpMailer},
};
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod backend;
mod configuration;
mod configuration_handler;
mod database_interface;
mod http;
mod local_store;
mod mailer;
mod schema;
mod slots;
#[cfg(test)]
mod testutils;
mod types;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("#######################");
    println!("# Appointment Backend #");
    println!("#######################");

    let configuration = ConfigurationHandler::parse_arguments();

    let notifier = match configuration.smtp() {
        Some(settings) => match SmtpMailer::new(&settings) {
            Ok(mailer) => {
                info!(host = %settings.host, "Confirmation mails go through SMTP relay");
                Notifier::spawn(mailer)
            }
            Err(err) => {
                error!(?err, "SMTP relay misconfigured, confirmation mails will only be logged");
                Notifier::spawn(LogMailer)
            }
        },
        None => {
            warn!("No SMTP relay configured, confirmation mails will only be logged");
            Notifier::spawn(LogMailer)
        }
    };

    let address = format!("0.0.0.0:{}", configuration.port());
    println!("Accessable at:\n{}", address.clone());
    let listener = tokio::net::TcpListener::bind(address).await.unwrap();

    let app = if let Some(database_url) = configuration.database_url() {
        let backend = loop {
            match DatabaseInterface::new(&database_url) {
                Ok(backend) => {
                    info!("Successfully connected to database");
                    break backend;
                }
                Err(err) => {
                    error!(?err, "Failed to establish database connection: {database_url}. Retry in 1 sec. You may want to restart it without DATABASE_URL (impersistent bookings).");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        create_app(backend, notifier, configuration)
    } else {
        warn!("No DATABASE_URL configured, bookings and availability are impersistent");
        create_app(LocalStore::default(), notifier, configuration)
    };

    axum::serve(listener, app).await.unwrap();
}
