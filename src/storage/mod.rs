//! Object-storage gateway for uploaded compliance documents.
//!
//! Files live on the local filesystem under the `kyc-documents` bucket
//! directory, addressed by bucket-relative paths
//! `{company_id}/{document_id}/{file_name}`. Access from outside the process
//! goes through signed, time-limited URLs served by the HTTP API.

pub mod gateway;
pub mod signed_url;

pub use gateway::{sniff_kind, FileKind, StorageGateway};
pub use signed_url::{SignedUrl, UrlSigner};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Signed URL expired")]
    UrlExpired,

    #[error("Signed URL signature mismatch")]
    SignatureMismatch,
}
