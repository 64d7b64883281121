pub mod diagnosis;
pub mod intake;
pub mod message;
pub mod problem;
pub mod repair_request;
pub mod user;
