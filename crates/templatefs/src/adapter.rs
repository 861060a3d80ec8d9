//! Template filesystem adapter
//!
//! Decodes the template identity from each address and delegates to a
//! [`TemplateStore`]. Mutations queue change events on the owned
//! [`EventCoalescer`], which delivers them to subscribers in debounced
//! batches.
//!
//! The template model is flat: directories, copy, rename and watch are
//! accepted and ignored.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use url::Url;

use crate::address::TemplateQuery;
use crate::coalescer::EventCoalescer;
use crate::config::AdapterConfig;
use crate::error::TemplateFsError;
use crate::events::{ChangeBatch, FileChangeEvent};
use crate::provider::{Disposable, FileStat, FileSystemProvider, FileType};
use crate::template::TemplateStore;

/// Virtual filesystem over a template store
pub struct TemplateFileSystem {
    store: Arc<dyn TemplateStore>,
    events: EventCoalescer,
    /// Serializes write/delete so the exists-check and create stay paired
    mutations: Mutex<()>,
}

impl TemplateFileSystem {
    /// Create an adapter with the default debounce
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self::with_config(store, &AdapterConfig::default())
    }

    pub fn with_config(store: Arc<dyn TemplateStore>, config: &AdapterConfig) -> Self {
        Self {
            store,
            events: EventCoalescer::new(
                Duration::from_millis(config.debounce_ms),
                config.channel_capacity,
            ),
            mutations: Mutex::new(()),
        }
    }

    /// Backing store
    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    /// Invoke `callback` with every delivered batch until the handle is disposed
    pub fn on_did_change_file<F>(&self, callback: F) -> Disposable
    where
        F: FnMut(ChangeBatch) + Send + 'static,
    {
        self.events.on_batch(callback)
    }

    /// Name for a write; addresses without one are rejected
    fn required_name(query: &TemplateQuery) -> Result<&str, TemplateFsError> {
        query.name.as_deref().ok_or(TemplateFsError::MissingName)
    }
}

#[async_trait]
impl FileSystemProvider for TemplateFileSystem {
    fn subscribe(&self) -> broadcast::Receiver<ChangeBatch> {
        self.events.subscribe()
    }

    fn watch(&self, _uri: &Url) -> Disposable {
        // Changes are pushed by the coalescer
        Disposable::noop()
    }

    fn stat(&self, uri: &Url) -> Result<FileStat> {
        let query = TemplateQuery::decode(uri);
        let stat = self
            .store
            .get_template(query.name_or_empty())
            .map_or_else(FileStat::empty_now, |t| {
                FileStat::file(t.ctime, t.mtime, t.size())
            });
        Ok(stat)
    }

    fn read_directory(&self, _uri: &Url) -> Result<Vec<(String, FileType)>> {
        Ok(Vec::new())
    }

    fn create_directory(&self, _uri: &Url) -> Result<()> {
        Ok(())
    }

    fn read_file(&self, uri: &Url) -> Result<Vec<u8>> {
        let query = TemplateQuery::decode(uri);
        Ok(self
            .store
            .get_template(query.name_or_empty())
            .map(|t| t.content)
            .unwrap_or_default())
    }

    #[tracing::instrument(skip_all, fields(uri = %uri, len = content.len()), level = "debug")]
    async fn write_file(&self, uri: &Url, content: &[u8]) -> Result<()> {
        let query = TemplateQuery::decode(uri);
        let name = Self::required_name(&query)?;
        let _guard = self.mutations.lock().await;

        if !self.store.exists(name) {
            let ext = query.ext.as_deref().unwrap_or_default();
            self.store.create_template(name, ext).await?;
            tracing::debug!(name = %name, ext = %ext, "Template created");
            self.events.enqueue(FileChangeEvent::created(uri));
        }

        self.store.update_template(name, content).await?;
        self.events.enqueue(FileChangeEvent::changed(uri));
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(uri = %uri), level = "debug")]
    async fn delete(&self, uri: &Url) -> Result<()> {
        let query = TemplateQuery::decode(uri);
        // Nothing can exist without a name, so there is nothing to delete
        let Some(name) = query.name.as_deref() else {
            tracing::debug!("Delete of nameless address ignored");
            return Ok(());
        };
        let _guard = self.mutations.lock().await;

        self.store.remove_template(name).await?;
        tracing::debug!(name = %name, "Template removed");
        self.events.enqueue(FileChangeEvent::deleted(uri));
        Ok(())
    }

    fn rename(&self, _old_uri: &Url, _new_uri: &Url) -> Result<()> {
        Ok(())
    }

    fn copy(&self, _source: &Url, _destination: &Url) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::events::FileChangeType;
    use crate::memory::MemoryTemplateStore;
    use crate::template::Template;

    fn uri(name: &str, ext: &str) -> Url {
        Url::parse(&format!("templatefs:/{name}.{ext}?name={name}&ext={ext}")).unwrap()
    }

    fn adapter() -> (TemplateFileSystem, MemoryTemplateStore) {
        let store = MemoryTemplateStore::new();
        (TemplateFileSystem::new(Arc::new(store.clone())), store)
    }

    /// Store whose updates always fail
    struct FailingUpdates(MemoryTemplateStore);

    #[async_trait]
    impl TemplateStore for FailingUpdates {
        async fn create_template(&self, name: &str, ext: &str) -> Result<()> {
            self.0.create_template(name, ext).await
        }

        fn get_template(&self, name: &str) -> Option<Template> {
            self.0.get_template(name)
        }

        async fn update_template(&self, _name: &str, _content: &[u8]) -> Result<()> {
            anyhow::bail!("disk full")
        }

        async fn remove_template(&self, name: &str) -> Result<()> {
            self.0.remove_template(name).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_address_reads_empty() {
        let (fs, _) = adapter();
        let addr = uri("ghost", "md");

        assert!(fs.read_file(&addr).unwrap().is_empty());

        let before = SystemTime::now();
        let stat = fs.stat(&addr).unwrap();
        let after = SystemTime::now();
        assert_eq!(stat.size, 0);
        assert_eq!(stat.ctime, stat.mtime);
        assert_eq!(stat.file_type, FileType::File);
        assert!(stat.ctime >= before);
        assert!(stat.ctime <= after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_write_creates_then_changes() {
        let (fs, store) = adapter();
        let mut rx = fs.subscribe();
        let addr = uri("greeting", "md");

        fs.write_file(&addr, b"Hello").await.unwrap();

        assert_eq!(fs.read_file(&addr).unwrap(), b"Hello");
        assert_eq!(store.get_template("greeting").unwrap().ext, "md");

        let batch = rx.recv().await.unwrap();
        let kinds: Vec<_> = batch.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![FileChangeType::Created, FileChangeType::Changed]);
        assert!(batch.iter().all(|e| e.uri == addr));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_only_changes() {
        let (fs, _) = adapter();
        let addr = uri("notes", "txt");
        fs.write_file(&addr, b"one").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut rx = fs.subscribe();
        fs.write_file(&addr, b"two").await.unwrap();
        fs.write_file(&addr, b"three").await.unwrap();

        let batch = rx.recv().await.unwrap();
        assert_eq!(
            batch,
            vec![FileChangeEvent::changed(&addr), FileChangeEvent::changed(&addr)]
        );
        assert_eq!(fs.read_file(&addr).unwrap(), b"three");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stat_matches_content() {
        let (fs, _) = adapter();
        let addr = uri("sized", "rs");
        fs.write_file(&addr, b"fn main() {}").await.unwrap();

        let stat = fs.stat(&addr).unwrap();
        assert_eq!(stat.size, fs.read_file(&addr).unwrap().len() as u64);
        assert!(stat.mtime >= stat.ctime);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_is_idempotent() {
        let (fs, _) = adapter();
        let addr = uri("old", "md");
        fs.write_file(&addr, b"bye").await.unwrap();
        let mut rx = fs.subscribe();

        fs.delete(&addr).await.unwrap();
        fs.delete(&addr).await.unwrap();

        assert!(fs.read_file(&addr).unwrap().is_empty());
        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.last(), Some(&FileChangeEvent::deleted(&addr)));
        assert_eq!(
            batch.iter().filter(|e| e.kind == FileChangeType::Deleted).count(),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_name() {
        let (fs, store) = adapter();
        let mut rx = fs.subscribe();
        let addr = Url::parse("templatefs:/nameless?ext=md").unwrap();

        assert!(fs.read_file(&addr).unwrap().is_empty());
        assert_eq!(fs.stat(&addr).unwrap().size, 0);

        let err = fs.write_file(&addr, b"x").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<TemplateFsError>(),
            Some(&TemplateFsError::MissingName)
        );
        fs.delete(&addr).await.unwrap();
        assert!(store.is_empty());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_failure_propagates() {
        let store = FailingUpdates(MemoryTemplateStore::new());
        let fs = TemplateFileSystem::new(Arc::new(store));
        let mut rx = fs.subscribe();
        let addr = uri("doomed", "md");

        let err = fs.write_file(&addr, b"x").await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");

        // The create step succeeded, so its event still goes out alone
        let batch = rx.recv().await.unwrap();
        assert_eq!(batch, vec![FileChangeEvent::created(&addr)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_operations_are_noops() {
        let (fs, store) = adapter();
        let a = uri("a", "md");
        let b = uri("b", "md");
        fs.write_file(&a, b"A").await.unwrap();

        fs.watch(&a).dispose();
        fs.copy(&a, &b).unwrap();
        fs.rename(&a, &b).unwrap();
        fs.create_directory(&b).unwrap();
        assert!(fs.read_directory(&a).unwrap().is_empty());

        assert_eq!(store.len(), 1);
        assert!(store.exists("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_subscription() {
        let (fs, _) = adapter();
        let (tx, mut seen) = tokio::sync::mpsc::unbounded_channel();
        let handle = fs.on_did_change_file(move |batch| {
            let _ = tx.send(batch.len());
        });

        fs.write_file(&uri("cb", "md"), b"x").await.unwrap();
        assert_eq!(seen.recv().await, Some(2));
        handle.dispose();
    }
}
