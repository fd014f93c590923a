/// Basic application code
pub mod app;
/// Clients for outside services
pub mod client;
/// Controllers for REST endpoints
pub mod controller;
/// Cross-origin request policy
pub mod cors;
/// Domain objects
pub mod domain;
/// REST error responses
pub mod error;
/// Persisted models
pub mod model;
/// Booking confirmation emails
pub mod notification;
/// Repositories
pub mod repo;
/// Application settings
pub mod settings;
/// Application telemetry for tracing and logging
pub mod telemetry;
