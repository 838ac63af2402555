// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S3-compatible object store with bounded retry.
//!
//! Transfers retry up to three attempts with exponential backoff (1 s base,
//! 10 s cap, factor-of-2 jitter). Missing keys are terminal, not retried.

use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use rand::Rng;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::error::StorageError;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(10);

/// Object store configuration; `endpoint` covers MinIO-style deployments.
#[derive(Debug, Clone)]
pub struct ObjectConfig {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: String,
}

/// S3 client wrapper scoped to one bucket.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
}

impl ObjectStore {
    pub async fn connect(config: &ObjectConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(access), Some(secret)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(aws_sdk_s3::config::Credentials::new(
                access.clone(),
                secret.clone(),
                None,
                None,
                "retrace-env",
            ));
        }
        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();
        Self { client: Client::from_conf(s3_config), bucket: config.bucket.clone() }
    }

    /// Download an object into memory.
    pub async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.with_retry(key, || async {
            let out = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| classify_get_error(key, err))?;
            let bytes = out
                .body
                .collect()
                .await
                .map_err(|err| StorageError::Object(err.to_string()))?;
            Ok(bytes.into_bytes().to_vec())
        })
        .await
    }

    /// Download an object to a file path.
    pub async fn get_to_file(&self, key: &str, path: &Path) -> Result<(), StorageError> {
        let bytes = self.get_bytes(key).await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Upload bytes under a key.
    pub async fn put_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.with_retry(key, || {
            let bytes = bytes.clone();
            async move {
                self.client
                    .put_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .body(ByteStream::from(bytes))
                    .send()
                    .await
                    .map_err(|err| StorageError::Object(err.to_string()))?;
                Ok(())
            }
        })
        .await
    }

    /// Upload a file under a key.
    pub async fn put_file(&self, key: &str, path: &Path) -> Result<(), StorageError> {
        let bytes = tokio::fs::read(path).await?;
        self.put_bytes(key, bytes).await
    }

    async fn with_retry<T, F, Fut>(&self, key: &str, mut op: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StorageError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) if attempt >= MAX_ATTEMPTS => return Err(err),
                Err(err) => {
                    let delay = backoff_delay(attempt);
                    warn!(key, attempt, error = %err, "object store transfer failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn classify_get_error<E, R>(key: &str, err: SdkError<E, R>) -> StorageError
where
    E: std::fmt::Debug + aws_sdk_s3::error::ProvideErrorMetadata,
    R: std::fmt::Debug,
{
    if let SdkError::ServiceError(service_err) = &err {
        if service_err.err().code() == Some("NoSuchKey") {
            return StorageError::ObjectMissing(key.to_string());
        }
    }
    StorageError::Object(format!("{:?}", err))
}

/// Exponential backoff with factor-of-2 jitter: base 2^(n-1), scaled by a
/// random factor in [1, 2), capped.
fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE.saturating_mul(1 << (attempt - 1).min(8));
    let jitter = rand::thread_rng().gen_range(1.0..2.0);
    let with_jitter = exp.mul_f64(jitter);
    with_jitter.min(BACKOFF_CAP)
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod tests;
