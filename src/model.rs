mod bookings;

pub use bookings::{Booking, BookingFields, NewBooking, ValidationError};
