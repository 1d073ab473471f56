//! [`BlobStore`](marquee_core::blob::BlobStore) adapters.
//!
//! - [`local::LocalBlobStore`] writes under a directory served by the API
//!   at `/media`.
//! - [`s3::S3BlobStore`] maps each container to a public-read S3 bucket.

pub mod local;
pub mod s3;

pub use local::LocalBlobStore;
pub use s3::S3BlobStore;
