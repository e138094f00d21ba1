use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::translation::hash::content_digest;
use super::translation::store::write_atomic;
use crate::error::CacheError;

pub const METADATA_FILE: &str = "post-metadata.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PostMeta {
    pub created_at: String,
    pub updated_at: String,
    pub content_hash: String,
}

/// Creation and last-change timestamps per post slug.
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    entries: BTreeMap<String, PostMeta>,
    dirty: bool,
}

impl MetadataStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!("failed to parse {}: {e}; timestamps will be reset", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, slug: &str) -> Option<&PostMeta> {
        self.entries.get(slug)
    }

    /// Record the current body of `slug`, bumping `updated_at` when it
    /// changed since the last build.
    pub fn stamp(&mut self, slug: &str, content: &str, now: DateTime<Utc>) -> PostMeta {
        let digest = content_digest(content);
        let now = now.to_rfc3339_opts(SecondsFormat::Secs, true);

        let meta = match self.entries.get(slug) {
            None => {
                info!("{slug}: new post");
                PostMeta {
                    created_at: now.clone(),
                    updated_at: now,
                    content_hash: digest,
                }
            }
            Some(prev) if prev.content_hash != digest => {
                debug!("{slug}: content changed");
                PostMeta {
                    created_at: prev.created_at.clone(),
                    updated_at: now,
                    content_hash: digest,
                }
            }
            Some(prev) => return prev.clone(),
        };

        self.entries.insert(slug.to_string(), meta.clone());
        self.dirty = true;
        meta
    }

    /// Persist when anything changed.
    pub fn save(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        Ok(())
    }
}
