pub mod admin;
pub mod health;
pub mod intake;
pub mod repair_requests;
pub mod sessions;
