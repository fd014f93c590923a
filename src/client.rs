mod email_client;

pub use email_client::{
    DeliveryError, DeliveryResult, Email, EmailSender, SmtpCredentials, SmtpEmailClient,
};
