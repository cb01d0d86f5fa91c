//! Backblaze B2 storage gateway over the S3-compatible API.
//!
//! This crate provides:
//! - File/byte upload and download by key
//! - Prefix listing and best-effort recursive prefix deletion
//! - Public URL derivation (presigned GET with a template fallback)
//! - The `ObjectStore` trait seam plus an in-memory implementation for tests

pub mod client;
pub mod error;
pub mod memory;
pub mod store;

pub use client::{B2Client, B2Config, ObjectInfo};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use store::ObjectStore;
