pub mod auth;
pub mod booking;
pub mod events;
pub mod scheduling;
