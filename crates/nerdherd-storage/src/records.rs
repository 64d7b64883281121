//! Typed reads and writes for each record kind in the bucket.
//!
//! Every record is one JSON object under its prefix in `s3_keys`. Listings
//! fetch each object in turn; objects that fail to decode are logged and
//! skipped so one bad write cannot hide every other lead.

use aws_sdk_s3::Client;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use nerdherd_core::models::diagnosis::DiagnosisRecord;
use nerdherd_core::models::repair_request::RepairRequest;
use nerdherd_core::models::user::UserRecord;
use nerdherd_core::s3_keys;
use nerdherd_diagnosis::collaborators::BoxFuture;

use crate::error::StorageError;
use crate::{json, objects};

/// Attempts at an If-Match write before giving up.
pub const MAX_APPEND_ATTEMPTS: u32 = 3;

// ── Repair requests ──────────────────────────────────────────────────────────

pub async fn save_repair_request(
    client: &Client,
    bucket: &str,
    request: &RepairRequest,
) -> Result<(), StorageError> {
    let key = s3_keys::repair_request(request.id);
    json::save_json(client, bucket, &key, request).await?;
    info!(repair_request_id = %request.id, "repair request stored");
    Ok(())
}

pub async fn get_repair_request(
    client: &Client,
    bucket: &str,
    id: Uuid,
) -> Result<RepairRequest, StorageError> {
    json::load_json(client, bucket, &s3_keys::repair_request(id)).await
}

/// All leads, newest first.
pub async fn list_repair_requests(
    client: &Client,
    bucket: &str,
) -> Result<Vec<RepairRequest>, StorageError> {
    let mut requests: Vec<RepairRequest> =
        load_all(client, bucket, s3_keys::REPAIR_REQUESTS_PREFIX).await?;
    newest_first(&mut requests, |r| r.created_at);
    Ok(requests)
}

/// Delete a lead. Returns [`StorageError::NotFound`] if it does not exist.
pub async fn delete_repair_request(
    client: &Client,
    bucket: &str,
    id: Uuid,
) -> Result<(), StorageError> {
    let key = s3_keys::repair_request(id);
    // S3 deletes are idempotent; look first so callers can tell a miss apart.
    objects::get_object(client, bucket, &key).await?;
    objects::delete_object(client, bucket, &key).await?;
    info!(repair_request_id = %id, "repair request deleted");
    Ok(())
}

// ── Users ────────────────────────────────────────────────────────────────────

pub async fn save_user(client: &Client, bucket: &str, user: &UserRecord) -> Result<(), StorageError> {
    json::save_json(client, bucket, &s3_keys::user(user.id), user).await?;
    info!(user_id = %user.id, "user record stored");
    Ok(())
}

/// Versioned access to user records: reads return the ETag, writes are
/// conditional on it.
pub trait UserDocuments: Send + Sync {
    fn load_user(&self, user_id: Uuid) -> BoxFuture<'_, Result<(UserRecord, String), StorageError>>;

    /// Fails with [`StorageError::PreconditionFailed`] if the record moved
    /// past `etag`.
    fn save_user_if_match<'a>(
        &'a self,
        user: &'a UserRecord,
        etag: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>>;
}

/// User records in one bucket.
pub struct BucketUsers<'c> {
    pub client: &'c Client,
    pub bucket: &'c str,
}

impl UserDocuments for BucketUsers<'_> {
    fn load_user(&self, user_id: Uuid) -> BoxFuture<'_, Result<(UserRecord, String), StorageError>> {
        Box::pin(async move {
            json::load_json_with_etag(self.client, self.bucket, &s3_keys::user(user_id)).await
        })
    }

    fn save_user_if_match<'a>(
        &'a self,
        user: &'a UserRecord,
        etag: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let key = s3_keys::user(user.id);
            json::save_json_if_match(self.client, self.bucket, &key, user, etag).await?;
            Ok(())
        })
    }
}

/// Add a diagnosis to a user record in the bucket.
pub async fn append_diagnosis_to_user(
    client: &Client,
    bucket: &str,
    user_id: Uuid,
    diagnosis: &DiagnosisRecord,
) -> Result<(), StorageError> {
    append_diagnosis(&BucketUsers { client, bucket }, user_id, diagnosis).await
}

/// Add a diagnosis to a user record with array-union semantics.
///
/// Reads the record and its ETag, appends unless a diagnosis with the same
/// id is already there, and writes back with If-Match. A concurrent writer
/// causes a re-read, up to [`MAX_APPEND_ATTEMPTS`] times.
pub async fn append_diagnosis(
    users: &impl UserDocuments,
    user_id: Uuid,
    diagnosis: &DiagnosisRecord,
) -> Result<(), StorageError> {
    for attempt in 1..=MAX_APPEND_ATTEMPTS {
        let (mut user, etag) = users.load_user(user_id).await?;

        if !user.add_diagnosis(diagnosis.clone()) {
            info!(%user_id, diagnosis_id = %diagnosis.id, "diagnosis already on user record");
            return Ok(());
        }

        match users.save_user_if_match(&user, &etag).await {
            Ok(()) => return Ok(()),
            Err(StorageError::PreconditionFailed { .. }) => {
                warn!(%user_id, attempt, "user record changed during append, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(StorageError::Contended {
        key: s3_keys::user(user_id),
        attempts: MAX_APPEND_ATTEMPTS,
    })
}

// ── Diagnoses ────────────────────────────────────────────────────────────────

pub async fn save_diagnosis(
    client: &Client,
    bucket: &str,
    diagnosis: &DiagnosisRecord,
) -> Result<(), StorageError> {
    json::save_json(client, bucket, &s3_keys::diagnosis(diagnosis.id), diagnosis).await?;
    Ok(())
}

/// All stored diagnoses, newest first.
pub async fn list_diagnoses(
    client: &Client,
    bucket: &str,
) -> Result<Vec<DiagnosisRecord>, StorageError> {
    let mut diagnoses: Vec<DiagnosisRecord> =
        load_all(client, bucket, s3_keys::DIAGNOSES_PREFIX).await?;
    newest_first(&mut diagnoses, |d| d.created_at);
    Ok(diagnoses)
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Sort descending by timestamp. Ties keep their listing order.
pub fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> jiff::Timestamp) {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

async fn load_all<T: DeserializeOwned>(
    client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<T>, StorageError> {
    let keys = objects::list_objects(client, bucket, prefix).await?;
    let mut records = Vec::with_capacity(keys.len());

    for key in keys.iter().filter(|k| k.ends_with(".json")) {
        match json::load_json(client, bucket, key).await {
            Ok(record) => records.push(record),
            Err(StorageError::Serialization(e)) => {
                warn!(key = %key, error = %e, "skipping undecodable record");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(records)
}
