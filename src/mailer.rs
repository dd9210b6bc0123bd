use crate::configuration::SmtpSettings;
use crate::types::Booking;
use async_trait::async_trait;
use futures::StreamExt;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

const QUEUE_CAPACITY: usize = 64;
const DELIVERY_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build mail: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send_confirmation(&self, booking: &Booking) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
    operator: String,
    signature: Option<Vec<u8>>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();
        let signature = settings
            .signature_image
            .as_ref()
            .and_then(|path| match std::fs::read(path) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    warn!(?err, "signature image not readable, mails go out without it");
                    None
                }
            });
        Ok(Self {
            transport,
            sender: settings.sender.clone(),
            operator: settings.operator.clone(),
            signature,
        })
    }

    fn message(&self, booking: &Booking) -> Result<Message, MailError> {
        let body = format!(
            "A new appointment has been booked.\n\n\
             Name:  {}\n\
             Email: {}\n\
             Date:  {}\n\
             Time:  {}\n\n\
             The slot is confirmed, no further action is needed.\n",
            booking.name, booking.email, booking.date, booking.time
        );
        let builder = Message::builder()
            .from(self.sender.parse()?)
            .to(self.operator.parse()?)
            .subject(format!(
                "New booking on {} at {}",
                booking.date, booking.time
            ));
        let message = match &self.signature {
            Some(bytes) => builder.multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body))
                    .singlepart(
                        Attachment::new(String::from("signature.png"))
                            .body(bytes.clone(), ContentType::parse("image/png").unwrap()),
                    ),
            )?,
            None => builder.body(body)?,
        };
        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation(&self, booking: &Booking) -> Result<(), MailError> {
        let message = self.message(booking)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Logs instead of sending, for setups without an SMTP relay.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation(&self, booking: &Booking) -> Result<(), MailError> {
        info!(
            name = %booking.name,
            date = %booking.date,
            time = %booking.time,
            "no SMTP relay configured, confirmation mail only logged"
        );
        Ok(())
    }
}

/// Hands confirmation mails to a background worker, so a slow or failing
/// relay never delays or fails a booking request.
#[derive(Clone)]
pub struct Notifier {
    queue: mpsc::Sender<Booking>,
}

impl Notifier {
    pub fn spawn<M: Mailer>(mailer: M) -> Self {
        let (queue, jobs) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(deliver_queued(mailer, jobs));
        Self { queue }
    }

    pub fn enqueue(&self, booking: Booking) {
        if let Err(err) = self.queue.try_send(booking) {
            error!(?err, "confirmation mail dropped");
        }
    }
}

async fn deliver_queued<M: Mailer>(mailer: M, jobs: mpsc::Receiver<Booking>) {
    let mut jobs = ReceiverStream::new(jobs);
    while let Some(booking) = jobs.next().await {
        for attempt in 1..=DELIVERY_ATTEMPTS {
            match mailer.send_confirmation(&booking).await {
                Ok(()) => {
                    info!(date = %booking.date, time = %booking.time, "confirmation mail sent");
                    break;
                }
                Err(err) if attempt < DELIVERY_ATTEMPTS => {
                    warn!(?err, attempt, "confirmation mail failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(err) => {
                    error!(?err, "confirmation mail given up after {DELIVERY_ATTEMPTS} attempts");
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutils::example_booking;

    fn transport_failure() -> MailError {
        // easiest MailError to construct in a test
        MailError::Address("missing-at-sign".parse::<lettre::Address>().unwrap_err())
    }

    #[tokio::test]
    async fn test_worker_delivers_each_queued_booking_once() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send_confirmation()
            .times(2)
            .returning(|_| Ok(()));

        let (queue, jobs) = mpsc::channel(QUEUE_CAPACITY);
        queue.send(example_booking()).await.unwrap();
        queue.send(example_booking()).await.unwrap();
        drop(queue);

        // returns once the queue is closed and drained
        deliver_queued(mailer, jobs).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_retries_then_gives_up() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send_confirmation()
            .times(DELIVERY_ATTEMPTS as usize)
            .returning(|_| Err(transport_failure()));

        let (queue, jobs) = mpsc::channel(QUEUE_CAPACITY);
        queue.send(example_booking()).await.unwrap();
        drop(queue);

        deliver_queued(mailer, jobs).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_stops_retrying_after_success() {
        let mut mailer = MockMailer::new();
        let mut failures_left = 1;
        mailer
            .expect_send_confirmation()
            .times(2)
            .returning(move |_| {
                if failures_left > 0 {
                    failures_left -= 1;
                    Err(transport_failure())
                } else {
                    Ok(())
                }
            });

        let (queue, jobs) = mpsc::channel(QUEUE_CAPACITY);
        queue.send(example_booking()).await.unwrap();
        drop(queue);

        deliver_queued(mailer, jobs).await;
    }

    #[tokio::test]
    async fn test_notifier_hands_bookings_to_the_worker() {
        let (done, mut delivered) = mpsc::unbounded_channel();
        let mut mailer = MockMailer::new();
        mailer.expect_send_confirmation().returning(move |booking| {
            done.send(booking.time.clone()).unwrap();
            Ok(())
        });

        let notifier = Notifier::spawn(mailer);
        notifier.enqueue(example_booking());

        assert_eq!(delivered.recv().await.unwrap(), "09:00");
    }
}
