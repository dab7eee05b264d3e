//! Driven port for the emoji image bucket.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{StoragePath, StoredImage};

define_port_error! {
    /// Errors raised by object storage adapters.
    pub enum ObjectStorageError {
        /// Network transport failed before receiving a response.
        Transport { message: String } => "object storage transport failed: {message}",
        /// An object already exists at the path; uploads never overwrite.
        AlreadyExists { path: String } => "object already exists at {path}",
        /// No object exists at the path.
        NotFound { path: String } => "no object at {path}",
        /// The store refused the request.
        Rejected { message: String } => "object storage rejected request: {message}",
    }
}

/// Port for uploading, reading, and removing emoji images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path`. Fails with `AlreadyExists` instead of
    /// replacing an existing object.
    async fn upload(
        &self,
        path: &StoragePath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStorageError>;

    /// Read the object at `path`.
    async fn download(&self, path: &StoragePath) -> Result<StoredImage, ObjectStorageError>;

    /// Delete the object at `path`.
    async fn remove(&self, path: &StoragePath) -> Result<(), ObjectStorageError>;
}

/// Storage used when no bucket is configured: accepts writes, holds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureObjectStorage;

#[async_trait]
impl ObjectStorage for FixtureObjectStorage {
    async fn upload(
        &self,
        _path: &StoragePath,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), ObjectStorageError> {
        Ok(())
    }

    async fn download(&self, path: &StoragePath) -> Result<StoredImage, ObjectStorageError> {
        Err(ObjectStorageError::not_found(path.as_str()))
    }

    async fn remove(&self, _path: &StoragePath) -> Result<(), ObjectStorageError> {
        Ok(())
    }
}
