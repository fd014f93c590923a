use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;

use chrono::Utc;

use reqwest::{Client, Method, Response};

use secrecy::Secret;

use serde::Serialize;

use uuid::Uuid;

use bookings::app::{self, AppContext};
use bookings::client::{
    DeliveryError, DeliveryResult, Email, EmailSender, SmtpCredentials, SmtpEmailClient,
};
use bookings::cors::AllowedOrigins;
use bookings::model::{Booking, NewBooking};
use bookings::notification::BookingNotifier;
use bookings::repo::{BookingRepo, RepoError, RepoResult};
use bookings::settings::{Runtime, Settings};

pub const ADMIN_EMAIL: &str = "admin@test.com";

/// Booking form body, every field optional so malformed submissions can be sent
#[derive(Debug, Default, Clone, Serialize)]
pub struct BookingForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BookingForm {
    pub fn valid() -> Self {
        Self {
            name: Some("Jane Doe".into()),
            email: Some("JANE@Example.com".into()),
            date: Some("2025-06-01".into()),
            ..Default::default()
        }
    }
}

/// In-memory store standing in for Postgres
#[derive(Default)]
pub struct InMemoryBookingRepo {
    records: Mutex<Vec<Booking>>,
    unavailable: bool,
}

impl InMemoryBookingRepo {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn records(&self) -> Vec<Booking> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BookingRepo for InMemoryBookingRepo {
    async fn insert(&self, new_booking: &NewBooking) -> RepoResult<Booking> {
        if self.unavailable {
            return Err(RepoError::Database(sqlx::Error::PoolTimedOut));
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            name: new_booking.name.as_ref().to_string(),
            email: new_booking.email.as_ref().to_string(),
            phone: new_booking.phone.clone(),
            date: new_booking.date.clone(),
            time: new_booking.time.clone(),
            topic: new_booking.topic.clone(),
            message: new_booking.message.clone(),
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(booking.clone());
        Ok(booking)
    }
}

/// Email transport double that records every send
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<Email>>,
    attempts: Mutex<usize>,
    unavailable: bool,
}

impl RecordingEmailSender {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    /// Wait for background deliveries to reach `count` emails, or give up after a second
    pub async fn wait_for_emails(&self, count: usize) -> Vec<Email> {
        for _ in 0..50 {
            {
                let sent = self.sent.lock().unwrap();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, email: &Email) -> DeliveryResult<()> {
        *self.attempts.lock().unwrap() += 1;
        if self.unavailable {
            return Err(DeliveryError::Unavailable("connection refused".into()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    async fn verify(&self) -> DeliveryResult<()> {
        Ok(())
    }
}

/// Knobs for the collaborators a test app is built with
#[derive(Default)]
pub struct TestOptions {
    pub store_unavailable: bool,
    pub email_sender: Option<Arc<dyn EmailSender>>,
    pub extra_origins: String,
}

pub struct TestApp {
    addr: String,
    handle: ServerHandle,

    pub client: Client,
    pub store: Arc<InMemoryBookingRepo>,
    pub email_sender: Arc<RecordingEmailSender>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to listen on random port");
        let port = listener.local_addr().unwrap().port();

        let addr = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(if options.store_unavailable {
            InMemoryBookingRepo::unavailable()
        } else {
            InMemoryBookingRepo::default()
        });

        let email_sender = Arc::new(RecordingEmailSender::default());
        let sender: Arc<dyn EmailSender> = options
            .email_sender
            .unwrap_or_else(|| email_sender.clone() as Arc<dyn EmailSender>);

        let context = AppContext {
            bookings: store.clone(),
            notifier: BookingNotifier::new(
                sender,
                "TimTom Health Care".into(),
                ADMIN_EMAIL.into(),
            ),
        };

        let server = app::run(
            listener,
            context,
            AllowedOrigins::with_extra(&options.extra_origins),
        )
        .expect("Failed to spawn app instance");
        let handle = server.handle();
        let _ = tokio::spawn(server);

        let client = Client::new();

        Self {
            addr,
            handle,
            client,
            store,
            email_sender,
        }
    }

    pub fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", &self.addr, url);
        self.client.request(method, url)
    }

    pub async fn health_check(&self) -> reqwest::Result<Response> {
        self.request(Method::GET, "api/health").send().await
    }

    pub async fn booking_create(&self, form: &BookingForm) -> reqwest::Result<Response> {
        self.request(Method::POST, "api/bookings")
            .json(form)
            .send()
            .await
    }

    pub async fn booking_create_from(
        &self,
        origin: &str,
        form: &BookingForm,
    ) -> reqwest::Result<Response> {
        self.request(Method::POST, "api/bookings")
            .header("Origin", origin)
            .json(form)
            .send()
            .await
    }

    /// Stop the server, waiting for in-flight requests
    pub async fn shutdown(self) {
        self.handle.stop(true).await;
    }
}

/// A real SMTP client pointed at a port nothing listens on
pub fn unreachable_smtp_client() -> Arc<dyn EmailSender> {
    let credentials = SmtpCredentials {
        username: "bookings@test.com".into(),
        password: Secret::new("password".into()),
    };
    let sender = "TimTom Health Care <bookings@test.com>"
        .parse()
        .expect("Failed to parse sender mailbox");

    let client =
        SmtpEmailClient::new("127.0.0.1", 1, credentials, Some(sender), Duration::from_secs(2))
            .expect("Failed to create SMTP client");
    Arc::new(client)
}

/// A real SMTP client built from the repository settings, which ship without an SMTP account
pub fn smtp_client_from_repository_settings() -> Arc<dyn EmailSender> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("settings");
    let settings = Settings::load_from(Runtime::Dev, &path).expect("Failed to load settings");
    assert!(
        settings.email.smtp_username().is_empty(),
        "Repository settings should not carry an SMTP account"
    );

    let client = SmtpEmailClient::from_settings(&settings.email).expect("Failed to create SMTP client");
    Arc::new(client)
}
