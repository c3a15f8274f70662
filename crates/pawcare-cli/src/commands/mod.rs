pub mod appointment;
pub mod auth;
pub mod config;
pub mod notify;
pub mod pet;
pub mod prescription;
pub mod sync;
