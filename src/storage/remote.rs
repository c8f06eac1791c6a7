// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Remote object-store backends (S3-compatible and Google Cloud Storage).
//!
//! Both providers go through the `object_store` crate. A client is bound to a
//! single bucket, so one is built per bucket on first use and cached for the
//! life of the process. Credentials are read by the builders from the usual
//! provider environment variables (`AWS_ACCESS_KEY_ID`,
//! `AWS_SECRET_ACCESS_KEY`, `GOOGLE_SERVICE_ACCOUNT`, ...).

use std::collections::HashMap;
use std::future;
use std::sync::Arc;

use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use tokio::sync::RwLock;

use super::uri::{self, BaseUrl};
use super::StorageResult;

/// Builds a store client bound to the named bucket.
pub type StoreFactory =
    Arc<dyn Fn(&str) -> object_store::Result<Arc<dyn ObjectStore>> + Send + Sync>;

/// How public URIs are shaped for this provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addressing {
    S3 {
        endpoint: Option<BaseUrl>,
        force_path_style: bool,
    },
    Gcs,
}

/// Object storage over per-bucket `object_store` clients.
pub struct ObjectStorage {
    addressing: Addressing,
    public_url: Option<BaseUrl>,
    factory: StoreFactory,
    clients: RwLock<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStorage {
    pub fn with_factory(
        addressing: Addressing,
        public_url: Option<BaseUrl>,
        factory: StoreFactory,
    ) -> Self {
        Self {
            addressing,
            public_url,
            factory,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// AWS S3 or an S3-compatible provider.
    ///
    /// With a custom endpoint and virtual-hosted addressing the bucket is
    /// folded into the endpoint host, which is what the S3 client expects.
    pub fn s3(
        region: String,
        endpoint: Option<BaseUrl>,
        force_path_style: bool,
        public_url: Option<BaseUrl>,
    ) -> Self {
        let client_endpoint = endpoint.clone();
        let factory: StoreFactory = Arc::new(move |bucket: &str| {
            let mut builder = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .with_region(region.clone());

            if let Some(endpoint) = &client_endpoint {
                let endpoint_url = if force_path_style {
                    endpoint.origin()
                } else {
                    format!("{}://{bucket}.{}", endpoint.scheme(), endpoint.authority())
                };
                builder = builder
                    .with_endpoint(endpoint_url)
                    .with_virtual_hosted_style_request(!force_path_style)
                    .with_allow_http(endpoint.scheme() == "http");
            }

            let store: Arc<dyn ObjectStore> = Arc::new(builder.build()?);
            Ok(store)
        });

        Self::with_factory(
            Addressing::S3 {
                endpoint,
                force_path_style,
            },
            public_url,
            factory,
        )
    }

    pub fn gcs(public_url: Option<BaseUrl>) -> Self {
        let factory: StoreFactory = Arc::new(|bucket: &str| {
            let store: Arc<dyn ObjectStore> = Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(bucket)
                    .build()?,
            );
            Ok(store)
        });

        Self::with_factory(Addressing::Gcs, public_url, factory)
    }

    pub fn addressing(&self) -> &Addressing {
        &self.addressing
    }

    async fn client(&self, bucket: &str) -> StorageResult<Arc<dyn ObjectStore>> {
        if let Some(client) = self.clients.read().await.get(bucket) {
            return Ok(Arc::clone(client));
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(bucket) {
            return Ok(Arc::clone(client));
        }

        let client = (self.factory)(bucket)?;
        tracing::debug!(bucket, "Created object store client");
        clients.insert(bucket.to_string(), Arc::clone(&client));
        Ok(client)
    }

    pub async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> StorageResult<()> {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.client(bucket)
            .await?
            .put_opts(&ObjectPath::from(key), PutPayload::from(body.to_vec()), options)
            .await?;
        Ok(())
    }

    /// HEAD probe; a missing object is `false`, any other failure is an error.
    pub async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        match self.client(bucket).await?.head(&ObjectPath::from(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Keys whose file name starts with `prefix`.
    ///
    /// Keys are flat, so matches sort contiguously. Listing starts after
    /// `prefix` (S3 `start-after`, GCS `startOffset`) and stops at the first
    /// key that no longer matches.
    pub async fn list_objects_by_prefix(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> StorageResult<Vec<String>> {
        let client = self.client(bucket).await?;
        let offset = ObjectPath::from(prefix);
        let keys = client
            .list_with_offset(None, &offset)
            .try_take_while(|meta| {
                future::ready(Ok(meta
                    .location
                    .filename()
                    .is_some_and(|name| name.starts_with(prefix))))
            })
            .map_ok(|meta| meta.location.to_string())
            .try_collect::<Vec<_>>()
            .await?;
        Ok(keys)
    }

    pub async fn delete_file(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.client(bucket)
            .await?
            .delete(&ObjectPath::from(key))
            .await?;
        Ok(())
    }

    pub fn derive_uri(&self, bucket: &str, key: &str) -> String {
        if let Some(public_url) = &self.public_url {
            return uri::override_uri(public_url, key);
        }
        match &self.addressing {
            Addressing::S3 {
                endpoint,
                force_path_style,
            } => uri::s3_uri(endpoint.as_ref(), *force_path_style, bucket, key),
            Addressing::Gcs => uri::gcs_uri(bucket, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use object_store::memory::InMemory;

    use super::*;

    /// One in-memory store per bucket, counting how many clients were built.
    fn in_memory(addressing: Addressing, public_url: Option<BaseUrl>) -> (ObjectStorage, Arc<AtomicUsize>) {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let factory: StoreFactory = Arc::new(move |_bucket: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
            Ok(store)
        });
        (ObjectStorage::with_factory(addressing, public_url, factory), built)
    }

    fn minio() -> Addressing {
        Addressing::S3 {
            endpoint: Some(BaseUrl::parse("http://localhost:9000").unwrap()),
            force_path_style: true,
        }
    }

    #[tokio::test]
    async fn upload_exists_list_delete() {
        let (storage, _) = in_memory(minio(), None);

        assert!(!storage.object_exists("docs", "a.json").await.unwrap());
        storage
            .upload_file("docs", "a.json", b"{}", "application/json")
            .await
            .unwrap();
        storage
            .upload_file("docs", "b.png", b"png", "image/png")
            .await
            .unwrap();
        assert!(storage.object_exists("docs", "a.json").await.unwrap());

        let keys = storage.list_objects_by_prefix("docs", "a").await.unwrap();
        assert_eq!(keys, vec!["a.json".to_string()]);

        storage.delete_file("docs", "a.json").await.unwrap();
        assert!(!storage.object_exists("docs", "a.json").await.unwrap());
        assert!(storage
            .list_objects_by_prefix("docs", "a")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn prefix_listing_skips_neighbouring_keys() {
        let (storage, _) = in_memory(minio(), None);
        let id = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";

        for key in [
            "0aaaaaaa-0000-4000-8000-000000000000.json".to_string(),
            format!("{id}.json"),
            format!("{id}.png"),
            "3f2504e1-0000-4000-8000-000000000000.json".to_string(),
            "ffffffff-0000-4000-8000-000000000000.png".to_string(),
        ] {
            storage
                .upload_file("docs", &key, b"x", "application/octet-stream")
                .await
                .unwrap();
        }

        let keys = storage.list_objects_by_prefix("docs", id).await.unwrap();
        assert_eq!(keys, vec![format!("{id}.json"), format!("{id}.png")]);

        let none = storage
            .list_objects_by_prefix("docs", "11111111-0000-4000-8000-000000000000")
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn buckets_are_isolated_and_clients_cached() {
        let (storage, built) = in_memory(minio(), None);

        storage
            .upload_file("docs", "a.json", b"{}", "application/json")
            .await
            .unwrap();
        assert!(!storage.object_exists("files", "a.json").await.unwrap());
        assert!(storage.object_exists("docs", "a.json").await.unwrap());

        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn upload_records_content_type() {
        let store = Arc::new(InMemory::new());
        let shared = Arc::clone(&store);
        let factory: StoreFactory = Arc::new(move |_bucket: &str| {
            let client: Arc<dyn ObjectStore> = shared.clone();
            Ok(client)
        });
        let storage = ObjectStorage::with_factory(Addressing::Gcs, None, factory);

        storage
            .upload_file("files", "a.png", b"png", "image/png")
            .await
            .unwrap();

        let result = store.get(&ObjectPath::from("a.png")).await.unwrap();
        assert_eq!(
            result.attributes.get(&Attribute::ContentType).map(|v| v.as_ref()),
            Some("image/png")
        );
    }

    #[test]
    fn derive_uri_by_addressing() {
        let (path_style, _) = in_memory(minio(), None);
        assert_eq!(path_style.derive_uri("b", "k"), "http://localhost:9000/b/k");

        let (aws, _) = in_memory(
            Addressing::S3 {
                endpoint: None,
                force_path_style: false,
            },
            None,
        );
        assert_eq!(aws.derive_uri("b", "k"), "https://b.s3.amazonaws.com/k");

        let (gcs, _) = in_memory(Addressing::Gcs, None);
        assert_eq!(gcs.derive_uri("b", "k"), "https://b.storage.googleapis.com/k");
    }

    #[test]
    fn public_url_wins_over_provider_addressing() {
        let cdn = BaseUrl::parse("https://cdn.x.com").unwrap();
        let (s3, _) = in_memory(minio(), Some(cdn.clone()));
        assert_eq!(s3.derive_uri("b", "k.json"), "https://cdn.x.com/k.json");

        let (gcs, _) = in_memory(Addressing::Gcs, Some(cdn));
        assert_eq!(gcs.derive_uri("b", "k.json"), "https://cdn.x.com/k.json");
    }
}
