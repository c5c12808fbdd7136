//! BOS wire model for bcestack.
//!
//! Request and response types per operation, the error model shared by the
//! client and the in-memory service, the [`Body`] carried across the
//! [`Transport`] boundary, and the multipart rules both sides enforce.

pub mod body;
pub mod checksum;
pub mod error;
pub mod headers;
pub mod input;
pub mod multipart;
pub mod output;
pub mod transport;
pub mod types;

pub use body::Body;
pub use error::{BosError, BosErrorCode, ErrorBody};
pub use transport::{Transport, TransportError};
pub use types::{ObjectMetadata, PartETag, PartInfo};

/// Result alias used by every BOS operation.
pub type BosResult<T> = Result<T, BosError>;
