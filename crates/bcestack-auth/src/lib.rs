//! `bce-auth-v1` request authentication for bcestack.
//!
//! This crate implements both sides of the BOS authentication protocol:
//! signing outgoing requests (the `Authorization` header token), building
//! presigned URLs whose query string alone authorizes a request, and verifying
//! either form against a credential store.
//!
//! # Overview
//!
//! A token is valid for `expirationSeconds` after its timestamp. The verifier
//! takes the current time as an argument so the window can be tested
//! deterministically.
//!
//! # Usage
//!
//! ```rust
//! use bcestack_auth::canonical::RequestParts;
//! use bcestack_auth::credentials::{CredentialContext, StaticCredentialProvider};
//! use bcestack_auth::signer::{SignOptions, parse_timestamp, sign};
//! use bcestack_auth::verify::verify_at;
//!
//! let creds = CredentialContext::new("ak", "sk");
//! let mut headers = vec![("host".to_owned(), "localhost".to_owned())];
//! let parts = RequestParts { method: "GET", path: "/b/k", query: &[], headers: &headers };
//! let token = sign(&creds, &parts, &SignOptions::new(60).with_timestamp("20240101T000000Z"))
//!     .unwrap()
//!     .to_token();
//!
//! headers.push(("authorization".to_owned(), token));
//! let parts = RequestParts { method: "GET", path: "/b/k", query: &[], headers: &headers };
//! let provider = StaticCredentialProvider::new(vec![("ak".to_owned(), "sk".to_owned())]);
//! let now = parse_timestamp("20240101T000030Z").unwrap();
//! assert!(verify_at(&parts, &provider, now).is_ok());
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction and percent-encoding
//! - [`credentials`] - Credential context, provider trait and in-memory store
//! - [`error`] - Authentication error types
//! - [`presigned`] - Presigned URL generation and verification
//! - [`signer`] - Token derivation
//! - [`verify`] - Header-token verification and the validity window

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod presigned;
pub mod signer;
pub mod verify;

pub use canonical::{CanonicalRequest, RequestParts};
pub use credentials::{CredentialContext, CredentialProvider, StaticCredentialProvider};
pub use error::AuthError;
pub use presigned::{
    MAX_PRESIGN_EXPIRATION_SECONDS, PresignedUrl, PresignedUrlBuilder, build_presigned_url,
    verify_presigned, verify_presigned_at,
};
pub use signer::{SignOptions, SignatureMaterial, sign};
pub use verify::{AuthResult, check_validity_window, verify, verify_at};
