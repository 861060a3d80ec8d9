//! In-memory template store
//!
//! Ephemeral storage that lives as long as the store value. Used by tests
//! and by hosts that persist templates elsewhere.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::TemplateFsError;
use crate::template::{Template, TemplateStore};

/// In-memory template store
///
/// Thread-safe via internal `RwLock`. Clones share the same templates.
#[derive(Clone, Default)]
pub struct MemoryTemplateStore {
    templates: Arc<RwLock<HashMap<String, Template>>>,
}

impl MemoryTemplateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with initial templates (`name`, `ext`, `content`)
    pub fn with_templates(templates: Vec<(&str, &str, &[u8])>) -> Self {
        let map = templates
            .into_iter()
            .map(|(name, ext, content)| {
                let mut template = Template::new(name, ext);
                template.content = content.to_vec();
                (name.to_string(), template)
            })
            .collect();
        Self {
            templates: Arc::new(RwLock::new(map)),
        }
    }

    /// Number of stored templates
    pub fn len(&self) -> usize {
        self.templates.read().map_or(0, |t| t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn create_template(&self, name: &str, ext: &str) -> Result<()> {
        let mut templates = self
            .templates
            .write()
            .map_err(|_| TemplateFsError::LockPoisoned)?;
        if templates.contains_key(name) {
            return Err(TemplateFsError::TemplateExists(name.to_string()).into());
        }
        templates.insert(name.to_string(), Template::new(name, ext));
        Ok(())
    }

    fn get_template(&self, name: &str) -> Option<Template> {
        self.templates.read().ok()?.get(name).cloned()
    }

    async fn update_template(&self, name: &str, content: &[u8]) -> Result<()> {
        let mut templates = self
            .templates
            .write()
            .map_err(|_| TemplateFsError::LockPoisoned)?;
        let template = templates
            .get_mut(name)
            .ok_or_else(|| TemplateFsError::TemplateNotFound(name.to_string()))?;
        template.content = content.to_vec();
        template.mtime = SystemTime::now();
        Ok(())
    }

    async fn remove_template(&self, name: &str) -> Result<()> {
        self.templates
            .write()
            .map_err(|_| TemplateFsError::LockPoisoned)?
            .remove(name);
        Ok(())
    }
}
