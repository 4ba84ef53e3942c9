//! Storage service for lot document binaries using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development only)
//! - In-memory (tests)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write_with("key", data) │ op.stat("key")                     │
//! │ op.read("key")             │ op.delete("key")                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every document version owns one object at `{lot_id}/{document_id}/{key}`.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{StoredObject, StorageService, sanitize_filename};
