//! Templates exposed to a host editor as a flat virtual filesystem.
//!
//! Every file address is a URI whose query carries `name` (and `ext` on
//! creation). The [`TemplateFileSystem`] adapter maps filesystem calls onto a
//! [`TemplateStore`] and coalesces change notifications into debounced
//! batches.

pub mod adapter;
pub mod address;
pub mod coalescer;
pub mod config;
pub mod dir;
pub mod error;
pub mod events;
pub mod memory;
pub mod provider;
pub mod template;

pub use adapter::TemplateFileSystem;
pub use address::TemplateQuery;
pub use coalescer::EventCoalescer;
pub use config::{AdapterConfig, Config, StoreConfig};
pub use dir::DirTemplateStore;
pub use error::TemplateFsError;
pub use events::{ChangeBatch, FileChangeEvent, FileChangeType};
pub use memory::MemoryTemplateStore;
pub use provider::{Disposable, FileStat, FileSystemProvider, FileType};
pub use template::{Template, TemplateStore};
