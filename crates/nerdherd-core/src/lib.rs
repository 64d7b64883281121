//! nerdherd-core
//!
//! Pure domain types, reply heuristics, and S3 key conventions.
//! No AWS SDK dependency. This is the shared vocabulary of the NerdHerd
//! diagnosis service.

pub mod error;
pub mod heuristics;
pub mod models;
pub mod s3_keys;
pub mod validate;
