//! S3 key/path conventions.
//!
//! Pure string functions with no AWS SDK dependency. These define the
//! canonical layout of objects in the NerdHerd S3 bucket.

use uuid::Uuid;

pub fn diagnosis(id: Uuid) -> String {
    format!("diagnoses/{id}.json")
}

pub const DIAGNOSES_PREFIX: &str = "diagnoses/";

pub fn user(id: Uuid) -> String {
    format!("users/{id}.json")
}

pub fn repair_request(id: Uuid) -> String {
    format!("repair-requests/{id}.json")
}

pub const REPAIR_REQUESTS_PREFIX: &str = "repair-requests/";
