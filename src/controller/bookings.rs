use actix_web::dev::HttpServiceFactory;
use actix_web::{web, HttpResponse};

use serde::Serialize;

use uuid::Uuid;

use crate::app::{not_found, AppContext};
use crate::domain::EmailAddress;
use crate::error::{FieldError, RestError, RestResult};
use crate::model::BookingFields;
use crate::notification::EmailDeliveryRequest;

const BOOKING_RECEIVED: &str =
    "Your booking has been received successfully. A confirmation email has been sent.";

/// Success response for a stored booking
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingCreated {
    ok: bool,
    booking_id: Uuid,
    message: &'static str,
}

/// Check the submitted form before anything is stored.
/// Violations are returned in field order.
fn validate_submission(fields: &BookingFields) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = fields.name.as_deref();
    if name.map_or(true, |n| n.trim().is_empty()) {
        errors.push(FieldError::field("name", "Name is required", name));
    }

    let email = fields.email.as_deref();
    if !email.map_or(false, EmailAddress::is_well_formed) {
        errors.push(FieldError::field("email", "Valid email is required", email));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Create endpoint for booking form submissions
#[tracing::instrument(name = "Create a new booking", skip(context, form))]
async fn create(
    context: web::Data<AppContext>,
    form: web::Json<BookingFields>,
) -> RestResult<HttpResponse> {
    let fields = form.into_inner();
    validate_submission(&fields).map_err(RestError::InvalidInput)?;

    let booking = context.bookings.create(fields.clone()).await?;
    tracing::info!(
        "New booking stored for {} ({}): {}",
        booking.name,
        booking.email,
        booking.summary()
    );

    // Delivery runs in the background and never changes the response
    let _ = context
        .notifier
        .dispatch(EmailDeliveryRequest::from_submission(&fields));

    Ok(HttpResponse::Created().json(BookingCreated {
        ok: true,
        booking_id: booking.id,
        message: BOOKING_RECEIVED,
    }))
}

/// Reject unreadable bodies with the same envelope as invalid fields
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::warn!("Rejected booking body: {}", err);
        RestError::InvalidInput(vec![FieldError::body(err.to_string())]).into()
    })
}

/// Bookings API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/bookings").service(
        web::resource("")
            .app_data(json_config())
            .route(web::post().to(create))
            .default_service(web::to(not_found)),
    )
}
