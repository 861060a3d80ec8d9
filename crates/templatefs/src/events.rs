use url::Url;

/// Kind of change reported for an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileChangeType {
    Created,
    Changed,
    Deleted,
}

/// One change notification for an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeEvent {
    pub kind: FileChangeType,
    pub uri: Url,
}

impl FileChangeEvent {
    pub fn created(uri: &Url) -> Self {
        Self {
            kind: FileChangeType::Created,
            uri: uri.clone(),
        }
    }

    pub fn changed(uri: &Url) -> Self {
        Self {
            kind: FileChangeType::Changed,
            uri: uri.clone(),
        }
    }

    pub fn deleted(uri: &Url) -> Self {
        Self {
            kind: FileChangeType::Deleted,
            uri: uri.clone(),
        }
    }
}

/// Events delivered together, in enqueue order
pub type ChangeBatch = Vec<FileChangeEvent>;
