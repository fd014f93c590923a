use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Context;

use sqlx::PgPool;

use bookings::app::{self, AppContext};
use bookings::client::SmtpEmailClient;
use bookings::notification::BookingNotifier;
use bookings::repo::PgBookingRepo;
use bookings::settings::Settings;
use bookings::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::set_subscriber(telemetry::create_subscriber("info", std::io::stdout))?;

    let settings = Settings::load().context("Failed to load settings")?;
    let email = &settings.email;

    tracing::info!("SMTP user: {}", email.smtp_username());
    tracing::info!(
        "SMTP password: {}",
        if email.has_smtp_password() { "loaded" } else { "missing" }
    );

    // The service cannot run without its store
    let pool = PgPool::connect_with(settings.database.connect_options()?)
        .await
        .context("Failed to connect to the database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database connected successfully");

    // Email is best-effort, a missing sender only disables confirmations
    let email_client =
        SmtpEmailClient::from_settings(email).context("Failed to create SMTP email client")?;
    let notifier = BookingNotifier::new(
        Arc::new(email_client),
        email.organization().to_string(),
        email.admin_email().to_string(),
    );

    // Verify the transport without holding up startup
    let verifier = notifier.clone();
    tokio::spawn(async move { verifier.verify_transport().await });

    let context = AppContext {
        bookings: Arc::new(PgBookingRepo::new(pool)),
        notifier,
    };

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!("Server running at http://{}", listener.local_addr()?);

    let allowed_origins = settings.app.allowed_origins();
    tracing::info!("Allowed origins: {}", allowed_origins.as_slice().join(", "));

    app::run(listener, context, allowed_origins)?
        .await
        .context("Failed to run app")
}
