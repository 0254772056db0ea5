pub mod dual_read_service;
pub mod health;
