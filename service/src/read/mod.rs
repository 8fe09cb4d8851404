//! Read entities definitions.

pub mod reservation;
pub mod room;
