//! Domain definitions.

pub mod availability;
pub mod reservation;
pub mod room;
pub mod user;

pub use self::{reservation::Reservation, room::Room};
