pub mod availability;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod database_validator;
pub mod identity;
