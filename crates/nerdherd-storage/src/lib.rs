//! nerdherd-storage
//!
//! S3 persistence for leads, intake records, and finished diagnoses. Thin
//! wrapper around the AWS S3 SDK.

pub mod client;
pub mod error;
pub mod json;
pub mod objects;
pub mod records;
pub mod store;

pub use store::{RecordStore, S3RecordStore};
