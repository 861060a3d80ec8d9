use std::time::SystemTime;

use anyhow::Result;
use async_trait::async_trait;

/// A named unit of content, the entity exposed as a virtual file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub ext: String,
    pub content: Vec<u8>,
    /// Creation time
    pub ctime: SystemTime,
    /// Last modification time
    pub mtime: SystemTime,
}

impl Template {
    /// Create an empty template stamped with the current time
    pub fn new(name: impl Into<String>, ext: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            name: name.into(),
            ext: ext.into(),
            content: Vec::new(),
            ctime: now,
            mtime: now,
        }
    }

    /// Content length in bytes
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Name-keyed template storage consumed by the filesystem adapter
///
/// Lookups are synchronous. Mutations are async so stores can perform I/O.
/// Removing a template that does not exist must succeed.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Create an empty template
    async fn create_template(&self, name: &str, ext: &str) -> Result<()>;

    /// Look up a template by name
    fn get_template(&self, name: &str) -> Option<Template>;

    /// Replace the content of an existing template and bump its mtime
    async fn update_template(&self, name: &str, content: &[u8]) -> Result<()>;

    /// Remove a template (no-op when absent)
    async fn remove_template(&self, name: &str) -> Result<()>;

    /// Check if a template exists
    fn exists(&self, name: &str) -> bool {
        self.get_template(name).is_some()
    }
}
