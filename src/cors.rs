use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::Method;
use actix_web::middleware::Next;
use actix_web::{web, HttpResponse, ResponseError};

use crate::error::RestError;

/// Origins used by the website during local development
const DEV_ORIGINS: [&str; 6] = [
    "http://127.0.0.1:5500",
    "http://127.0.0.1:5501",
    "http://localhost:5500",
    "http://localhost:5501",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Origins permitted to make cross-origin requests
#[derive(Debug, Clone, PartialEq)]
pub struct AllowedOrigins(Vec<String>);

impl AllowedOrigins {
    /// The development origins plus a comma-separated list of extra origins.
    /// Blank entries and duplicates are dropped.
    pub fn with_extra(extra: &str) -> Self {
        let mut origins: Vec<String> = DEV_ORIGINS.iter().map(|o| o.to_string()).collect();
        for origin in extra.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            if !origins.iter().any(|o| o == origin) {
                origins.push(origin.to_string());
            }
        }
        Self(origins)
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.0.iter().any(|o| o == origin)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        Self::with_extra("")
    }
}

/// Reject cross-origin requests from origins outside the allow-list.
/// Requests without an `Origin` header (curl, server-to-server) always pass.
pub async fn enforce_allow_list<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    let origin = match req.headers().get(header::ORIGIN) {
        Some(origin) => origin.clone(),
        None => return Ok(next.call(req).await?.map_into_left_body()),
    };

    let allowed = origin.to_str().ok().map_or(false, |o| {
        req.app_data::<web::Data<AllowedOrigins>>()
            .map_or_else(|| AllowedOrigins::default().contains(o), |a| a.contains(o))
    });
    if !allowed {
        let origin = String::from_utf8_lossy(origin.as_bytes()).into_owned();
        tracing::warn!("Blocked CORS request from: {}", origin);
        let res = RestError::OriginNotAllowed(origin).error_response();
        return Ok(req.into_response(res).map_into_right_body());
    }

    // Preflight
    if req.method() == Method::OPTIONS
        && req.headers().contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
    {
        let mut res = HttpResponse::NoContent();
        res.insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin))
            .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
            .insert_header((header::VARY, "Origin"));
        if let Some(headers) = req.headers().get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
            res.insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, headers.clone()));
        }
        let res = res.finish();
        return Ok(req.into_response(res).map_into_right_body());
    }

    let mut res = next.call(req).await?;
    let headers = res.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.append(header::VARY, HeaderValue::from_static("Origin"));

    Ok(res.map_into_left_body())
}
