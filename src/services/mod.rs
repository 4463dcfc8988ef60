pub mod bookings;
pub mod geo;
pub mod locations;
pub mod payment;
pub mod qr;
pub mod slots;
pub mod users;
