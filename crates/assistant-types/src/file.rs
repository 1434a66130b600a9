//! Document file selection: a local upload or a file in cloud storage.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// MIME types offered by the cloud file picker.
pub const SUPPORTED_REMOTE_MIME_TYPES: &[&str] = &[
    "application/vnd.google-apps.document",
    "application/vnd.google-apps.presentation",
    "application/vnd.google-apps.spreadsheet",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "text/csv",
    "text/html",
    "application/json",
    "text/xml",
    "application/rtf",
    "application/epub+zip",
];

/// A file picked from the local machine, with its bytes already read.
#[derive(Clone)]
pub struct LocalFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub data: Rc<[u8]>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: data.len() as u64,
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// A file handle returned by the cloud picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
}

/// Deduplicates automatic summarization within a session.
///
/// Local files are keyed by content shape (name + size), remote files by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileSessionKey {
    Local { name: String, size: u64 },
    Remote { id: String },
}

/// At most one file is selected; the variants are mutually exclusive.
#[derive(Debug, Clone)]
pub enum FileSelection {
    Local(LocalFile),
    Remote(RemoteFile),
}

impl FileSelection {
    pub fn name(&self) -> &str {
        match self {
            FileSelection::Local(f) => &f.name,
            FileSelection::Remote(f) => &f.name,
        }
    }

    pub fn session_key(&self) -> FileSessionKey {
        match self {
            FileSelection::Local(f) => FileSessionKey::Local {
                name: f.name.clone(),
                size: f.size,
            },
            FileSelection::Remote(f) => FileSessionKey::Remote { id: f.id.clone() },
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, FileSelection::Remote(_))
    }

    pub fn summary(&self) -> FileSummary {
        match self {
            FileSelection::Local(f) => FileSummary {
                name: f.name.clone(),
                mime_type: f.mime_type.clone(),
                size: Some(f.size),
                remote: false,
            },
            FileSelection::Remote(f) => FileSummary {
                name: f.name.clone(),
                mime_type: f.mime_type.clone(),
                size: None,
                remote: true,
            },
        }
    }
}

/// What presentation needs to know about the selected file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<u64>,
    pub remote: bool,
}

/// Input handed to the document-analysis gateway
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Local(LocalFile),
    Remote { file: RemoteFile, token: String },
}

impl DocumentSource {
    pub fn name(&self) -> &str {
        match self {
            DocumentSource::Local(f) => &f.name,
            DocumentSource::Remote { file, .. } => &file.name,
        }
    }
}
