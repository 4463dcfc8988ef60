pub mod booking;
pub mod location;
pub mod slot;
pub mod user;

pub use booking::{BookingStatus, PaymentMethod, PaymentStatus};
pub use location::LocationCategory;
pub use slot::VehicleType;
