//! # Blobstore Testkit
//!
//! Test utilities for blobstore.
//!
//! This crate provides:
//! - Record fixtures and temporary stores for both backends
//! - Property-based test generators using proptest
//! - The backend contract every [`BlobStore`](blobstore_storage::BlobStore)
//!   must satisfy, runnable against any backend
//! - Concurrent stress helpers
//!
//! ## Usage
//!
//! ```rust
//! use blobstore_testkit::prelude::*;
//!
//! with_file_store(|store| {
//!     check_round_trip(store);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::contract::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use contract::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
