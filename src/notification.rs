use std::sync::Arc;

use tokio::task::JoinHandle;

use tracing::Instrument;

use crate::client::{DeliveryError, Email, EmailSender};
use crate::model::BookingFields;

mod template;

/// Placeholder for optional fields left empty on the booking form
const NOT_AVAILABLE: &str = "N/A";

/// Booking details handed to the notifier for a single confirmation email
#[derive(Debug, Clone, PartialEq)]
pub struct EmailDeliveryRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub topic: String,
    pub message: String,
}

impl EmailDeliveryRequest {
    /// Normalize submitted fields for the email template.
    ///
    /// | field                                  | value                        |
    /// |----------------------------------------|------------------------------|
    /// | `name`, `email`                        | trimmed                      |
    /// | `phone`, `date`, `time`, `topic`, `message` | as submitted, `"N/A"` if absent or empty |
    pub fn from_submission(fields: &BookingFields) -> Self {
        fn or_placeholder(value: &Option<String>) -> String {
            match value.as_deref() {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => NOT_AVAILABLE.to_string(),
            }
        }

        Self {
            name: fields.name.as_deref().unwrap_or_default().trim().to_string(),
            email: fields.email.as_deref().unwrap_or_default().trim().to_string(),
            phone: or_placeholder(&fields.phone),
            date: or_placeholder(&fields.date),
            time: or_placeholder(&fields.time),
            topic: or_placeholder(&fields.topic),
            message: or_placeholder(&fields.message),
        }
    }
}

/// Result of a single confirmation email delivery
#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(DeliveryError),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Sends booking confirmations to the client and the administrator.
/// Delivery is best effort, failures are logged and never returned as errors.
#[derive(Clone)]
pub struct BookingNotifier {
    sender: Arc<dyn EmailSender>,
    organization: String,
    admin_email: String,
}

impl BookingNotifier {
    pub fn new(sender: Arc<dyn EmailSender>, organization: String, admin_email: String) -> Self {
        Self {
            sender,
            organization,
            admin_email,
        }
    }

    /// Build the confirmation email for a booking request
    pub fn compose(&self, request: &EmailDeliveryRequest) -> Email {
        let mut recipients = vec![request.email.clone()];
        if !self.admin_email.eq_ignore_ascii_case(&request.email) {
            recipients.push(self.admin_email.clone());
        }

        Email {
            recipients,
            subject: format!("Your Booking Has Been Received — {}", self.organization),
            html_body: template::confirmation_html(&self.organization, request),
        }
    }

    /// Send the confirmation email and record the outcome in the logs
    #[tracing::instrument(name = "Send booking confirmation", skip(self, request), fields(recipient = %request.email))]
    pub async fn send(&self, request: EmailDeliveryRequest) -> DeliveryOutcome {
        let email = self.compose(&request);

        match self.sender.send(&email).await {
            Ok(()) => {
                tracing::info!(
                    "Confirmation email sent to {} (and copied to admin)",
                    request.email
                );
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                tracing::error!("Confirmation email send failed: {}", e);
                DeliveryOutcome::Failed(e)
            }
        }
    }

    /// Send the confirmation email on a background task.
    /// Callers may drop the handle, the task still runs to completion.
    pub fn dispatch(&self, request: EmailDeliveryRequest) -> JoinHandle<DeliveryOutcome> {
        let notifier = self.clone();
        tokio::spawn(async move { notifier.send(request).await }.instrument(tracing::Span::current()))
    }

    /// Check the email transport, logging the result.
    /// A failed check does not stop the application from serving requests.
    pub async fn verify_transport(&self) -> bool {
        match self.sender.verify().await {
            Ok(()) => {
                tracing::info!("SMTP server verified and ready");
                true
            }
            Err(e) => {
                tracing::error!("SMTP verification failed: {}", e);
                false
            }
        }
    }
}
