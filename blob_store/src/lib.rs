//! Storage collaborator for the document vault: a thin wrapper over
//! [`object_store`] exposing put/list/get/delete on a single container
//! prefix. Backends are selected by the configured URL scheme
//! (`file://`, `s3://`, `az://`).

use std::{env, sync::Arc};

use bytes::{Bytes, BytesMut};
use futures::{stream::BoxStream, Stream, StreamExt};
use object_store::{
    aws::{AmazonS3Builder, AmazonS3ConfigKey, S3ConditionalPut},
    azure::{AzureConfigKey, MicrosoftAzureBuilder},
    parse_url,
    path::Path,
    Attribute,
    Attributes,
    ObjectStore,
    ObjectStoreScheme,
    PutMode,
    PutOptions,
    PutPayload,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;
use url::Url;

mod error;
pub use error::{BlobError, BlobResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStorageConfig {
    pub path: String,
}

impl BlobStorageConfig {
    pub fn new(path: &str) -> Self {
        BlobStorageConfig {
            path: path.to_string(),
        }
    }
}

impl Default for BlobStorageConfig {
    fn default() -> Self {
        let blob_store_path = format!(
            "file://{}",
            env::current_dir()
                .unwrap()
                .join("docvault_storage/blobs")
                .to_str()
                .unwrap()
        );
        info!("using blob store path: {}", blob_store_path);
        BlobStorageConfig {
            path: blob_store_path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PutResult {
    pub key: String,
    pub size_bytes: u64,
}

/// A blob fetched from the backend: its chunk stream plus the metadata
/// reported by the store.
pub struct BlobRead {
    pub stream: BoxStream<'static, BlobResult<Bytes>>,
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

impl std::fmt::Debug for BlobRead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobRead")
            .field("size_bytes", &self.size_bytes)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct BlobStorage {
    object_store: Arc<dyn ObjectStore>,
    path: Path,
    attributes_supported: bool,
}

impl BlobStorage {
    pub fn new(config: BlobStorageConfig) -> BlobResult<Self> {
        let (object_store, path, attributes_supported) = Self::build_object_store(&config.path)?;
        Ok(Self {
            object_store: Arc::from(object_store),
            path,
            attributes_supported,
        })
    }

    fn build_object_store(url_str: &str) -> BlobResult<(Box<dyn ObjectStore>, Path, bool)> {
        let url = url_str.parse::<Url>()?;
        let (scheme, path) =
            ObjectStoreScheme::parse(&url).map_err(|e| BlobError::InvalidUrl {
                url: url_str.to_string(),
                reason: e.to_string(),
            })?;
        match scheme {
            ObjectStoreScheme::AmazonS3 => {
                // inject AWS environment variables to prioritize keys over
                // instance metadata credentials.
                let mut builder = AmazonS3Builder::new().with_url(url_str);
                for (key, value) in env_config::<AmazonS3ConfigKey>("AWS_") {
                    builder = builder.with_config(key, value);
                }
                let store = builder
                    .with_conditional_put(S3ConditionalPut::ETagMatch)
                    .build()?;
                Ok((Box::new(store), path, true))
            }
            ObjectStoreScheme::MicrosoftAzure => {
                let mut builder = MicrosoftAzureBuilder::new().with_url(url_str);
                for (key, value) in env_config::<AzureConfigKey>("AZURE_") {
                    builder = builder.with_config(key, value);
                }
                let store = builder.build()?;
                Ok((Box::new(store), path, true))
            }
            // The local filesystem backend rejects object attributes.
            ObjectStoreScheme::Local => {
                let (store, path) = parse_url(&url)?;
                Ok((store, path, false))
            }
            _ => {
                let (store, path) = parse_url(&url)?;
                Ok((store, path, true))
            }
        }
    }

    /// Store `bytes` under `key`, rejecting the write if the key is already
    /// taken. The content type is persisted as an object attribute on
    /// backends that support it.
    pub async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> BlobResult<PutResult> {
        let path = self.path.child(key);
        let mut attributes = Attributes::new();
        if self.attributes_supported {
            if let Some(content_type) = content_type {
                attributes.insert(Attribute::ContentType, content_type.to_string().into());
            }
        }
        let mut opts = PutOptions::from(PutMode::Create);
        opts.attributes = attributes;
        let size_bytes = bytes.len() as u64;
        self.object_store
            .put_opts(&path, PutPayload::from_bytes(bytes), opts)
            .await?;
        Ok(PutResult {
            key: key.to_string(),
            size_bytes,
        })
    }

    /// Enumerate blob names under the configured prefix, in whatever order
    /// the backend yields them.
    pub async fn list(&self) -> BlobResult<Vec<String>> {
        let prefix = format!("{}/", self.path);
        let mut entries = self.object_store.list(Some(&self.path));
        let mut names = Vec::new();
        while let Some(meta) = entries.next().await {
            let location = meta?.location.to_string();
            let name = location
                .strip_prefix(&prefix)
                .unwrap_or(&location)
                .to_string();
            names.push(name);
        }
        Ok(names)
    }

    /// Fetch a blob's chunk stream and metadata. Chunks are forwarded
    /// through a channel by a spawned task; dropping the returned stream
    /// stops the forwarding loop, aborting the upstream read.
    pub async fn get(&self, key: &str) -> BlobResult<BlobRead> {
        let path = self.path.child(key);
        let result = self.object_store.get(&path).await?;
        let size_bytes = result.meta.size;
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string());
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut stream = result.into_stream();
            while let Some(chunk) = stream.next().await {
                if tx.send(chunk.map_err(BlobError::from)).is_err() {
                    // receiver dropped, stop reading from the backend
                    break;
                }
            }
        });
        Ok(BlobRead {
            stream: Box::pin(UnboundedReceiverStream::new(rx)),
            size_bytes,
            content_type,
        })
    }

    pub async fn delete(&self, key: &str) -> BlobResult<()> {
        self.object_store.delete(&self.path.child(key)).await?;
        Ok(())
    }

    /// Fetch a blob and buffer it fully into memory.
    pub async fn read_bytes(&self, key: &str) -> BlobResult<Bytes> {
        let read = self.get(key).await?;
        collect_bytes(read.stream).await
    }
}

/// Accumulate a chunk stream into one contiguous byte sequence. Chunks are
/// appended in arrival order; a stream error fails the whole read and no
/// partial result is surfaced. An empty stream yields empty bytes.
pub async fn collect_bytes(
    mut stream: impl Stream<Item = BlobResult<Bytes>> + Unpin,
) -> BlobResult<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

fn env_config<K: std::str::FromStr>(prefix: &str) -> Vec<(K, String)> {
    std::env::vars_os()
        .filter_map(|(os_key, os_value)| {
            let (key, value) = (os_key.to_str()?, os_value.to_str()?);
            if !key.starts_with(prefix) {
                return None;
            }
            key.to_ascii_lowercase()
                .parse::<K>()
                .ok()
                .map(|config_key| (config_key, value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    fn test_storage(temp_dir: &tempfile::TempDir) -> BlobStorage {
        let path = temp_dir.path().join("blobs");
        std::fs::create_dir_all(&path).unwrap();
        let config = BlobStorageConfig::new(&format!("file://{}", path.display()));
        BlobStorage::new(config).unwrap()
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir);

        let res = storage
            .put("42-Jane-cert.pdf", Bytes::from_static(b"%PDF"), None)
            .await
            .unwrap();
        assert_eq!(res.key, "42-Jane-cert.pdf");
        assert_eq!(res.size_bytes, 4);

        let read = storage.get("42-Jane-cert.pdf").await.unwrap();
        assert_eq!(read.size_bytes, 4);
        let bytes = collect_bytes(read.stream).await.unwrap();
        assert_eq!(bytes.as_ref(), b"%PDF");
    }

    #[tokio::test]
    async fn put_rejects_existing_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir);

        storage
            .put("dup", Bytes::from_static(b"first"), None)
            .await
            .unwrap();
        let err = storage
            .put("dup", Bytes::from_static(b"second"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::AlreadyExists { .. }));

        // the original bytes survive the rejected write
        let bytes = storage.read_bytes("dup").await.unwrap();
        assert_eq!(bytes.as_ref(), b"first");
    }

    #[tokio::test]
    async fn list_returns_names_relative_to_prefix() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir);

        assert!(storage.list().await.unwrap().is_empty());

        storage.put("a.txt", Bytes::from_static(b"a"), None).await.unwrap();
        storage.put("b.txt", Bytes::from_static(b"b"), None).await.unwrap();

        let mut names = storage.list().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir);

        let err = storage.get("missing-key").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_removes_blob() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir);

        storage.put("gone", Bytes::from_static(b"x"), None).await.unwrap();
        storage.delete("gone").await.unwrap();

        let err = storage.get("gone").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound { .. }));

        let err = storage.delete("gone").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound { .. }));
    }

    #[tokio::test]
    async fn collect_bytes_concatenates_in_order() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"c")),
        ]);
        let bytes = collect_bytes(chunks).await.unwrap();
        assert_eq!(bytes.as_ref(), b"abc");
    }

    #[tokio::test]
    async fn collect_bytes_empty_stream_is_empty() {
        let chunks = stream::iter(Vec::<BlobResult<Bytes>>::new());
        let bytes = collect_bytes(chunks).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn collect_bytes_fails_on_stream_error() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(BlobError::Other {
                source: anyhow::anyhow!("stream interrupted"),
            }),
        ]);
        // chunks seen before the error are discarded with the failure
        assert!(collect_bytes(chunks).await.is_err());
    }
}
