//! Amazon S3 blob backend.
//!
//! Each container maps to the bucket `{bucket_prefix}{container}`. The
//! bucket is created on first use and given a policy that lets anyone read
//! its objects, so the URL returned by `save` can be handed to clients
//! directly.

use std::collections::HashSet;

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use marquee_core::blob::{blob_name, generate_blob_name, BlobStore};
use marquee_core::error::CoreError;
use tokio::sync::Mutex;

/// Region in which S3 rejects an explicit location constraint.
const DEFAULT_REGION: &str = "us-east-1";

pub struct S3BlobStore {
    client: Client,
    bucket_prefix: String,
    region: String,
    public_base_url: Option<String>,
    /// Buckets already known to exist with the public-read policy applied.
    ready: Mutex<HashSet<String>>,
}

impl S3BlobStore {
    pub fn new(
        client: Client,
        region: impl Into<String>,
        bucket_prefix: impl Into<String>,
        public_base_url: Option<String>,
    ) -> Self {
        Self {
            client,
            bucket_prefix: bucket_prefix.into(),
            region: region.into(),
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
            ready: Mutex::new(HashSet::new()),
        }
    }

    /// Build a client from the standard AWS environment (credentials chain,
    /// `AWS_REGION`, `AWS_ENDPOINT_URL`, ...).
    pub async fn from_env(bucket_prefix: impl Into<String>, public_base_url: Option<String>) -> Self {
        let config = aws_config::load_from_env().await;
        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        Self::new(Client::new(&config), region, bucket_prefix, public_base_url)
    }

    pub fn bucket_for(&self, container: &str) -> String {
        format!("{}{container}", self.bucket_prefix)
    }

    /// Public URL of `key` in `bucket`.
    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}/{bucket}/{key}"),
            None => format!("https://{bucket}.s3.{}.amazonaws.com/{key}", self.region),
        }
    }

    /// Create `bucket` if needed and open it for anonymous reads.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), CoreError> {
        let mut ready = self.ready.lock().await;
        if ready.contains(bucket) {
            return Ok(());
        }

        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {}
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_not_found() => {
                let mut request = self.client.create_bucket().bucket(bucket);
                if self.region != DEFAULT_REGION {
                    request = request.create_bucket_configuration(
                        CreateBucketConfiguration::builder()
                            .location_constraint(BucketLocationConstraint::from(
                                self.region.as_str(),
                            ))
                            .build(),
                    );
                }
                request
                    .send()
                    .await
                    .map_err(|e| s3_error("create_bucket", e))?;
                tracing::info!(bucket, "Created bucket");
            }
            Err(e) => return Err(s3_error("head_bucket", e)),
        }

        self.client
            .delete_public_access_block()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| s3_error("delete_public_access_block", e))?;
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(public_read_policy(bucket))
            .send()
            .await
            .map_err(|e| s3_error("put_bucket_policy", e))?;

        ready.insert(bucket.to_string());
        Ok(())
    }
}

/// Bucket policy granting `s3:GetObject` on every object to everyone.
pub fn public_read_policy(bucket: &str) -> String {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "PublicRead",
            "Effect": "Allow",
            "Principal": "*",
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{bucket}/*")],
        }],
    })
    .to_string()
}

/// Whether an HTTP status from S3 is worth retrying.
fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

fn s3_error<E>(operation: &str, err: SdkError<E, HttpResponse>) -> CoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let transient = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(ctx) => is_retryable_status(ctx.raw().status().as_u16()),
        _ => false,
    };
    let message = format!("S3 {operation} failed: {}", DisplayErrorContext(&err));
    if transient {
        CoreError::transient(message)
    } else {
        CoreError::storage(message)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn save(
        &self,
        container: &str,
        bytes: &[u8],
        extension: &str,
        content_type: Option<&str>,
    ) -> Result<String, CoreError> {
        let bucket = self.bucket_for(container);
        self.ensure_bucket(&bucket).await?;

        let key = generate_blob_name(extension);
        self.client
            .put_object()
            .bucket(&bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| s3_error("put_object", e))?;

        tracing::info!(bucket = %bucket, key = %key, size = bytes.len(), "Uploaded blob");
        Ok(self.public_url(&bucket, &key))
    }

    async fn delete(&self, container: &str, url_or_path: &str) -> Result<(), CoreError> {
        let key = blob_name(url_or_path.trim());
        if key.is_empty() {
            return Ok(());
        }

        let bucket = self.bucket_for(container);
        match self
            .client
            .delete_object()
            .bucket(&bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => {
                tracing::info!(bucket = %bucket, key, "Deleted blob");
                Ok(())
            }
            // A bucket that was never created holds no blob to delete.
            Err(SdkError::ServiceError(ctx)) if ctx.raw().status().as_u16() == 404 => Ok(()),
            Err(e) => Err(s3_error("delete_object", e)),
        }
    }
}
