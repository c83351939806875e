//! Document stores holding raw ad impressions

use crate::error::{AdClickError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A raw record as stored: field name to JSON value
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Read/write access to named collections of documents
pub trait DocumentStore: Send + Sync {
    /// Every document in `collection`, in storage order
    fn fetch_all(&self, collection: &str) -> Result<Vec<Document>>;

    /// Append documents to `collection`, creating it when absent
    fn insert_many(&self, collection: &str, documents: &[Document]) -> Result<usize>;
}

/// Collections stored as `<root>/<collection>.jsonl`, one document per line
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    root: PathBuf,
}

impl JsonLinesStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.jsonl", collection))
    }
}

impl DocumentStore for JsonLinesStore {
    fn fetch_all(&self, collection: &str) -> Result<Vec<Document>> {
        let path = self.collection_path(collection);
        let file = File::open(&path).map_err(|e| {
            AdClickError::IngestionError(format!(
                "collection '{}' is not reachable at {}: {}",
                collection,
                path.display(),
                e
            ))
        })?;

        let mut documents = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let doc: Document = serde_json::from_str(&line).map_err(|e| {
                AdClickError::IngestionError(format!(
                    "{}:{}: malformed document: {}",
                    path.display(),
                    line_no + 1,
                    e
                ))
            })?;
            documents.push(doc);
        }
        Ok(documents)
    }

    fn insert_many(&self, collection: &str, documents: &[Document]) -> Result<usize> {
        fs::create_dir_all(&self.root)?;
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.collection_path(collection))?;
        let mut writer = BufWriter::new(file);
        for doc in documents {
            serde_json::to_writer(&mut writer, doc)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(documents.len())
    }
}

/// In-process store, handy for tests and demos
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn fetch_all(&self, collection: &str) -> Result<Vec<Document>> {
        self.collections
            .read()
            .get(collection)
            .cloned()
            .ok_or_else(|| {
                AdClickError::IngestionError(format!("collection '{}' does not exist", collection))
            })
    }

    fn insert_many(&self, collection: &str, documents: &[Document]) -> Result<usize> {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .extend_from_slice(documents);
        Ok(documents.len())
    }
}
