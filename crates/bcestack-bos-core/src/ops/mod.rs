//! BOS client operations.
//!
//! Each submodule adds `async fn`s to [`crate::client::BosClient`] for one
//! category of operation.

mod bucket;
mod multipart;
mod object;
mod presign;
