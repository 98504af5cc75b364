//! # Error Types
//!
//! This module defines error types used throughout the pergamino library.

use thiserror::Error;

/// Main error type for pergamino operations
#[derive(Debug, Error)]
pub enum PergaminoError {
    /// An element with this id already exists in the template
    #[error("Duplicate element id: {0}")]
    DuplicateId(String),

    /// The named element, template, asset, or layout does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// An update tried to swap an element's properties to the other variant
    #[error("Properties variant does not match element type for id: {0}")]
    TypeMismatch(String),

    /// Export was started without a renderable surface (fatal, aborts the batch)
    #[error("No render surface available for export")]
    NoSurface,

    /// Remote template persistence failed (local state is unaffected)
    #[error("Persist failed: {0}")]
    Persist(String),

    /// Remote asset upload failed (local state is unaffected)
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Image fetching or decoding error
    #[error("Image error: {0}")]
    Image(String),

    /// PDF assembly error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
