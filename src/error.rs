use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde::Serialize;

use thiserror::Error;

use crate::repo::RepoError;

pub type RestResult<T> = Result<T, RestError>;

/// A single rejected input, reported back to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'static str>,
    pub location: &'static str,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldError {
    /// A rule violated by one of the body fields
    pub fn field(path: &'static str, msg: &str, value: Option<&str>) -> Self {
        Self {
            kind: "field",
            path: Some(path),
            location: "body",
            msg: msg.to_string(),
            value: value.map(str::to_string),
        }
    }

    /// A body that could not be read at all
    pub fn body(msg: String) -> Self {
        Self {
            kind: "body",
            path: None,
            location: "body",
            msg,
            value: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RestError {
    #[error("Invalid input — please check your form fields.")]
    InvalidInput(Vec<FieldError>),

    #[error("Server error creating booking. Please try again later.")]
    BookingNotCreated,

    #[error("Origin {0} not allowed by CORS")]
    OriginNotAllowed(String),

    #[error("Route not found")]
    NotFound,
}

impl From<RepoError> for RestError {
    fn from(e: RepoError) -> Self {
        tracing::error!("Booking submission failed: {}", e);
        Self::BookingNotCreated
    }
}

/// JSON envelope for every error response
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
    message: String,
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BookingNotCreated => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let errors = match self {
            Self::InvalidInput(errors) => Some(errors.as_slice()),
            _ => None,
        };
        let body = ErrorBody {
            ok: false,
            errors,
            message: self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
