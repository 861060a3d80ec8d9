//! Directory-backed template store - one file per template
//!
//! A template named `greeting` with extension `md` lives at
//! `<root>/greeting.md`; with an empty extension at `<root>/greeting`. The
//! first `.` of a file name separates name from extension, so names cannot
//! contain dots while extensions may (`spec.ts`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

use crate::error::TemplateFsError;
use crate::template::{Template, TemplateStore};

/// Template store rooted at a directory on the local filesystem
pub struct DirTemplateStore {
    root: PathBuf,
}

impl DirTemplateStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject names that could escape the root or collide with another name
    ///
    /// SECURITY: names end up as file names, so separators, parent
    /// references and drive/stream colons are refused.
    fn validate_name(name: &str) -> Result<(), TemplateFsError> {
        if name.is_empty() || name.contains(['.', '/', '\\', ':', '\0']) {
            return Err(TemplateFsError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn validate_ext(ext: &str) -> Result<(), TemplateFsError> {
        if ext.starts_with('.') || ext.ends_with('.') || ext.contains(['/', '\\', ':', '\0']) {
            return Err(TemplateFsError::InvalidName(format!("extension {ext:?}")));
        }
        Ok(())
    }

    /// Split a file name into (name, ext)
    fn parse_file_name(file_name: &str) -> (&str, &str) {
        file_name.split_once('.').unwrap_or((file_name, ""))
    }

    fn file_name(name: &str, ext: &str) -> String {
        if ext.is_empty() {
            name.to_string()
        } else {
            format!("{name}.{ext}")
        }
    }

    fn load(&self, name: &str) -> io::Result<Option<Template>> {
        let Some((path, ext)) = find(&self.root, name)? else {
            return Ok(None);
        };
        let content = fs::read(&path)?;
        let meta = fs::metadata(&path)?;
        let mtime = meta.modified()?;
        Ok(Some(Template {
            name: name.to_string(),
            ext,
            content,
            ctime: meta.created().unwrap_or(mtime),
            mtime,
        }))
    }
}

/// Locate the file holding `name` under `root`, if any
fn find(root: &Path, name: &str) -> io::Result<Option<(PathBuf, String)>> {
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let (stem, ext) = DirTemplateStore::parse_file_name(file_name);
        if stem == name {
            return Ok(Some((entry.path(), ext.to_string())));
        }
    }
    Ok(None)
}

#[async_trait]
impl TemplateStore for DirTemplateStore {
    async fn create_template(&self, name: &str, ext: &str) -> Result<()> {
        Self::validate_name(name)?;
        Self::validate_ext(ext)?;

        let root = self.root.clone();
        let name = name.to_string();
        let file_name = Self::file_name(&name, ext);
        tokio::task::spawn_blocking(move || -> Result<()> {
            if find(&root, &name)?.is_some() {
                return Err(TemplateFsError::TemplateExists(name).into());
            }
            fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(root.join(file_name))?;
            Ok(())
        })
        .await?
    }

    fn get_template(&self, name: &str) -> Option<Template> {
        Self::validate_name(name).ok()?;
        match self.load(name) {
            Ok(template) => template,
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "Failed to load template");
                None
            }
        }
    }

    async fn update_template(&self, name: &str, content: &[u8]) -> Result<()> {
        Self::validate_name(name)?;

        let root = self.root.clone();
        let name = name.to_string();
        let content = content.to_vec();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let (path, _) =
                find(&root, &name)?.ok_or(TemplateFsError::TemplateNotFound(name))?;
            fs::write(path, content)?;
            Ok(())
        })
        .await?
    }

    async fn remove_template(&self, name: &str) -> Result<()> {
        // A name the store cannot hold has nothing to remove
        if Self::validate_name(name).is_err() {
            return Ok(());
        }

        let root = self.root.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let Some((path, _)) = find(&root, &name)? else {
                return Ok(());
            };
            match fs::remove_file(path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            }
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_name() {
        assert_eq!(DirTemplateStore::parse_file_name("greeting.md"), ("greeting", "md"));
        assert_eq!(DirTemplateStore::parse_file_name("comp.spec.ts"), ("comp", "spec.ts"));
        assert_eq!(DirTemplateStore::parse_file_name("Makefile"), ("Makefile", ""));
    }

    #[test]
    fn test_validate_name() {
        assert!(DirTemplateStore::validate_name("greeting").is_ok());
        assert!(DirTemplateStore::validate_name("my template").is_ok());
        for bad in ["", "..", "a.b", "../etc", "dir/file", "dir\\file", "c:", "nul\0"] {
            assert!(DirTemplateStore::validate_name(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn test_validate_ext() {
        assert!(DirTemplateStore::validate_ext("").is_ok());
        assert!(DirTemplateStore::validate_ext("spec.ts").is_ok());
        assert!(DirTemplateStore::validate_ext("../x").is_err());
        assert!(DirTemplateStore::validate_ext(".md").is_err());
    }
}
