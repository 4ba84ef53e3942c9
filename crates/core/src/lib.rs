//! Core business logic for OpLots.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and storage access live here.
//!
//! # Modules
//!
//! - `lot` - Lot aggregate and its repository seam
//! - `document` - Versioned lot documents, validators, permissions
//! - `storage` - Object storage for document binaries

pub mod document;
pub mod lot;
pub mod storage;
