//! Error types for template filesystem operations.

use thiserror::Error;

/// Errors raised by the adapter and the bundled template stores.
///
/// Trait seams return `anyhow::Result`; these variants travel inside it and
/// can be recovered with `downcast_ref`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateFsError {
    #[error("Address has no template name")]
    MissingName,

    #[error("Invalid template name: {0}")]
    InvalidName(String),

    #[error("Template already exists: {0}")]
    TemplateExists(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Lock poisoned")]
    LockPoisoned,
}
