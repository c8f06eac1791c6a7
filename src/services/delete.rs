// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use super::{ServiceError, ServiceResult, VaultService};
use crate::error::ApiError;
use crate::identity;
use crate::storage::StorageResult;

impl VaultService {
    /// Delete the object stored under `id` in `bucket`, whatever its extension.
    ///
    /// When several keys start with `id` the first in lexicographic order is
    /// removed.
    pub async fn delete_object(&self, bucket: &str, id: &str) -> Result<(), ApiError> {
        self.remove_by_id(bucket, id).await.map_err(|e| {
            e.into_api(
                "delete_object",
                "An unexpected error occurred while deleting the resource.",
            )
        })
    }

    async fn remove_by_id(&self, bucket: &str, id: &str) -> ServiceResult<()> {
        let bucket = self.policy.require_bucket(Some(bucket))?;
        let id = identity::require_uuid(id)?;

        let mut keys = self
            .storage
            .list_objects_by_prefix(&bucket, &id)
            .await
            .map_err(|e| ServiceError::from(e).at(&bucket, &id))?;
        keys.sort();

        let Some(key) = keys.first() else {
            return Err(not_found(&bucket, &id));
        };
        if keys.len() > 1 {
            tracing::warn!(
                bucket = %bucket,
                id = %id,
                matches = keys.len(),
                deleting = %key,
                "Multiple objects share an id"
            );
        }

        settle_removal(self.storage.delete_file(&bucket, key).await, &bucket, &id, key)
    }
}

fn not_found(bucket: &str, id: &str) -> ServiceError {
    ApiError::not_found(format!("Resource with id {id} not found in bucket {bucket}.")).into()
}

/// A key removed concurrently between listing and deleting reads as not found.
fn settle_removal(result: StorageResult<()>, bucket: &str, id: &str, key: &str) -> ServiceResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            tracing::debug!(bucket, key, "Object vanished before delete");
            Err(not_found(bucket, id))
        }
        Err(e) => Err(ServiceError::from(e).at(bucket, key)),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::test_support::local_vault;
    use super::*;
    use crate::models::DocumentRequest;
    use crate::storage::StorageError;

    const ID: &str = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";

    #[tokio::test]
    async fn delete_removes_stored_object() {
        let dir = tempfile::tempdir().unwrap();
        let vault = local_vault(dir.path());
        vault
            .store_public_document(&DocumentRequest {
                bucket: Some("documents".into()),
                id: Some(ID.into()),
                data: Some(json!({"a": 1})),
            })
            .await
            .unwrap();

        vault.delete_object("documents", ID).await.unwrap();

        assert!(!dir.path().join("documents").join(format!("{ID}.json")).exists());
        let err = vault.delete_object("documents", ID).await.unwrap_err();
        assert_eq!(
            err.message(),
            format!("Resource with id {ID} not found in bucket documents.")
        );
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_picks_first_key_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().join("files");
        std::fs::create_dir_all(&bucket).unwrap();
        std::fs::write(bucket.join(format!("{ID}.png")), b"png").unwrap();
        std::fs::write(bucket.join(format!("{ID}.json")), b"{}").unwrap();
        let vault = local_vault(dir.path());

        vault.delete_object("files", ID).await.unwrap();

        assert!(!bucket.join(format!("{ID}.json")).exists());
        assert!(bucket.join(format!("{ID}.png")).exists());
    }

    #[tokio::test]
    async fn delete_validates_bucket_and_id() {
        let dir = tempfile::tempdir().unwrap();
        let vault = local_vault(dir.path());

        let err = vault.delete_object("secret", ID).await.unwrap_err();
        assert!(err.message().starts_with("Invalid bucket."));

        let err = vault.delete_object("documents", "123").await.unwrap_err();
        assert_eq!(err.message(), "Invalid id 123. Please provide a valid UUID.");
    }

    #[test]
    fn object_removed_concurrently_is_not_found() {
        let gone = StorageError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        let err = settle_removal(Err(gone), "documents", ID, &format!("{ID}.json"))
            .unwrap_err()
            .into_api("delete_object", "generic");
        assert_eq!(
            err,
            ApiError::not_found(format!("Resource with id {ID} not found in bucket documents."))
        );

        let denied = StorageError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        let err = settle_removal(Err(denied), "documents", ID, &format!("{ID}.json"))
            .unwrap_err()
            .into_api("delete_object", "generic");
        assert_eq!(err, ApiError::application("generic"));
    }
}
