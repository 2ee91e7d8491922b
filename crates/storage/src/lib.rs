//! Downstream collaborators of the draft generation pipeline.
//!
//! - [`RecordStore`]: source of records and the once-per-record commit
//!   of finished artifacts. [`AirtableStore`] implements it over the
//!   Airtable REST API.
//! - [`ArtifactStore`]: durable hosting of generated images.
//!   [`S3ArtifactStore`] implements it with `aws-sdk-s3`.

pub mod airtable;
pub mod artifacts;
pub mod error;
pub mod records;
pub mod s3;

pub use airtable::AirtableStore;
pub use artifacts::ArtifactStore;
pub use error::StorageError;
pub use records::RecordStore;
pub use s3::S3ArtifactStore;
