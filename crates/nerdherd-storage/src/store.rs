//! Object-safe store handles for the service layer.
//!
//! The HTTP layer holds an `Arc<dyn RecordStore>` and the persistence worker
//! an `Arc<dyn DiagnosisStore>`. [`S3RecordStore`] is both.

use aws_sdk_s3::Client;
use uuid::Uuid;

use nerdherd_core::models::diagnosis::DiagnosisRecord;
use nerdherd_core::models::repair_request::RepairRequest;
use nerdherd_core::models::user::UserRecord;
use nerdherd_diagnosis::collaborators::{BoxFuture, DiagnosisStore};
use nerdherd_diagnosis::error::DiagnosisError;

use crate::error::StorageError;
use crate::records;

/// Leads, intake records, and diagnosis listings.
pub trait RecordStore: Send + Sync {
    fn save_repair_request<'a>(
        &'a self,
        request: &'a RepairRequest,
    ) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Newest first.
    fn list_repair_requests(&self) -> BoxFuture<'_, Result<Vec<RepairRequest>, StorageError>>;

    fn get_repair_request(&self, id: Uuid) -> BoxFuture<'_, Result<RepairRequest, StorageError>>;

    fn delete_repair_request(&self, id: Uuid) -> BoxFuture<'_, Result<(), StorageError>>;

    fn save_user<'a>(&'a self, user: &'a UserRecord) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Newest first.
    fn list_diagnoses(&self) -> BoxFuture<'_, Result<Vec<DiagnosisRecord>, StorageError>>;
}

/// Store backed by one S3 bucket.
#[derive(Clone)]
pub struct S3RecordStore {
    client: Client,
    bucket: String,
}

impl S3RecordStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

impl RecordStore for S3RecordStore {
    fn save_repair_request<'a>(
        &'a self,
        request: &'a RepairRequest,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(records::save_repair_request(&self.client, &self.bucket, request))
    }

    fn list_repair_requests(&self) -> BoxFuture<'_, Result<Vec<RepairRequest>, StorageError>> {
        Box::pin(records::list_repair_requests(&self.client, &self.bucket))
    }

    fn get_repair_request(&self, id: Uuid) -> BoxFuture<'_, Result<RepairRequest, StorageError>> {
        Box::pin(records::get_repair_request(&self.client, &self.bucket, id))
    }

    fn delete_repair_request(&self, id: Uuid) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(records::delete_repair_request(&self.client, &self.bucket, id))
    }

    fn save_user<'a>(&'a self, user: &'a UserRecord) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(records::save_user(&self.client, &self.bucket, user))
    }

    fn list_diagnoses(&self) -> BoxFuture<'_, Result<Vec<DiagnosisRecord>, StorageError>> {
        Box::pin(records::list_diagnoses(&self.client, &self.bucket))
    }
}

impl DiagnosisStore for S3RecordStore {
    fn save_diagnosis<'a>(
        &'a self,
        record: &'a DiagnosisRecord,
    ) -> BoxFuture<'a, Result<(), DiagnosisError>> {
        Box::pin(async move {
            records::save_diagnosis(&self.client, &self.bucket, record)
                .await
                .map_err(|e| DiagnosisError::Persistence(e.to_string()))
        })
    }

    fn append_diagnosis_to_user<'a>(
        &'a self,
        user_id: Uuid,
        record: &'a DiagnosisRecord,
    ) -> BoxFuture<'a, Result<(), DiagnosisError>> {
        Box::pin(async move {
            records::append_diagnosis_to_user(&self.client, &self.bucket, user_id, record)
                .await
                .map_err(|e| DiagnosisError::Persistence(e.to_string()))
        })
    }
}
