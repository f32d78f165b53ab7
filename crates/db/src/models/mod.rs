pub mod appointment;
pub mod service;
pub mod therapist;
