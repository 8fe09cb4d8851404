//! Background [`Task`]s definitions.

pub mod advance_reservation_statuses;
mod background;

pub use common::Handler as Task;

pub use self::{
    advance_reservation_statuses::AdvanceReservationStatuses,
    background::Background,
};
