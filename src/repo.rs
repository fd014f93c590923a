mod bookings;

pub use bookings::{BookingRepo, PgBookingRepo, RepoError, RepoResult};
