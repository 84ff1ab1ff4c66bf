/// In-memory object storage backend
///
/// Ephemeral store for development and tests. Signed URLs carry a fresh
/// random token per issue so each call returns a distinct URL, matching
/// the behavior of a real presigner.
use crate::error::{ApiError, ApiResult};
use crate::object_store::{ObjectStore, SignedUrl};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().unwrap().contains_key(key)
    }

    /// Test hook: stored byte length for a key
    pub fn size_of(&self, key: &str) -> Option<usize> {
        self.objects.read().unwrap().get(key).map(|(d, _)| d.len())
    }

    /// Test hook: number of stored objects
    pub fn object_count(&self) -> usize {
        self.objects.read().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, mime_type: &str) -> ApiResult<()> {
        self.objects
            .write()
            .unwrap()
            .insert(key.to_string(), (data, mime_type.to_string()));
        Ok(())
    }

    async fn signed_url(&self, key: &str, expires_in: u64) -> ApiResult<SignedUrl> {
        if !self.contains(key) {
            return Err(ApiError::Storage(format!("No such object: {}", key)));
        }

        Ok(SignedUrl {
            url: format!(
                "memory://{}?expires={}&token={}",
                key,
                expires_in,
                Uuid::new_v4()
            ),
            expires_in,
        })
    }

    async fn delete(&self, key: &str) -> ApiResult<()> {
        self.objects.write().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_sign_delete() {
        let store = MemoryObjectStore::new();

        store
            .put("uploads/u1/f1.txt", b"hello".to_vec(), "text/plain")
            .await
            .unwrap();
        assert_eq!(store.size_of("uploads/u1/f1.txt"), Some(5));

        let signed = store.signed_url("uploads/u1/f1.txt", 3600).await.unwrap();
        assert!(signed.url.contains("uploads/u1/f1.txt"));
        assert_eq!(signed.expires_in, 3600);

        store.delete("uploads/u1/f1.txt").await.unwrap();
        assert!(!store.contains("uploads/u1/f1.txt"));
    }

    #[tokio::test]
    async fn test_signed_urls_are_fresh_per_call() {
        let store = MemoryObjectStore::new();
        store
            .put("k", b"x".to_vec(), "application/octet-stream")
            .await
            .unwrap();

        let a = store.signed_url("k", 3600).await.unwrap();
        let b = store.signed_url("k", 3600).await.unwrap();
        assert_ne!(a.url, b.url);
    }

    #[tokio::test]
    async fn test_sign_missing_object_fails() {
        let store = MemoryObjectStore::new();
        assert!(store.signed_url("absent", 60).await.is_err());
    }
}
