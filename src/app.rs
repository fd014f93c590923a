use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::middleware::{from_fn, NormalizePath};
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use serde::Serialize;

use tracing_actix_web::TracingLogger;

use crate::controller::bookings;
use crate::cors::{self, AllowedOrigins};
use crate::error::{RestError, RestResult};
use crate::notification::BookingNotifier;
use crate::repo::BookingRepo;

/// Process-wide services shared by every request.
/// Built once at startup, or by test helpers with doubles.
#[derive(Clone)]
pub struct AppContext {
    pub bookings: Arc<dyn BookingRepo>,
    pub notifier: BookingNotifier,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    ok: bool,
    status: &'static str,
}

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        ok: true,
        status: "healthy",
    })
}

/// Fallback for unmatched routes
pub(crate) async fn not_found() -> RestResult<HttpResponse> {
    Err(RestError::NotFound)
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    context: AppContext,
    allowed_origins: AllowedOrigins,
) -> anyhow::Result<Server> {
    // Wrap application data
    let context = web::Data::new(context);
    let allowed_origins = web::Data::new(allowed_origins);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(from_fn(cors::enforce_allow_list))
            .wrap(TracingLogger::default())
            .app_data(context.clone())
            .app_data(allowed_origins.clone())
            .service(
                web::scope("/api")
                    .service(health_check)
                    .service(bookings::scope()),
            )
            .default_service(web::to(not_found))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
