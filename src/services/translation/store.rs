use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::model::Translatable;

pub const CACHE_FILE: &str = "translation-cache.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheEntry {
    #[serde(alias = "hash", alias = "content_hash")]
    pub fingerprint: String,

    pub translation: Value,
}

/// Why a lookup did not produce a usable translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Hit(T),
    Absent,
    Stale,
    /// Stored record has the right fingerprint but does not deserialize.
    Unreadable,
    /// Stored record is missing these required fields.
    Incomplete(Vec<String>),
}

/// Persistent unit key → {fingerprint, translation} map.
///
/// Every `put` rewrites the whole file before returning.
#[derive(Debug)]
pub struct TranslationCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl TranslationCache {
    /// Load the cache file, starting empty when it is missing or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        debug!("translation cache {} has {} entries", path.display(), entries.len());
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Cached translation for `key`, only if it matches `fingerprint` and
    /// every field that is non-empty in `original` is non-empty in it.
    pub fn get<T: Translatable>(&self, key: &str, fingerprint: &str, original: &T) -> Option<T> {
        match self.lookup(key, fingerprint, original) {
            Lookup::Hit(t) => Some(t),
            _ => None,
        }
    }

    pub fn lookup<T: Translatable>(&self, key: &str, fingerprint: &str, original: &T) -> Lookup<T> {
        let Some(entry) = self.entries.get(key) else {
            return Lookup::Absent;
        };

        if entry.fingerprint != fingerprint {
            return Lookup::Stale;
        }

        let cached: T = match serde_json::from_value(entry.translation.clone()) {
            Ok(t) => t,
            Err(e) => {
                warn!("cached translation for {key} is unreadable: {e}");
                return Lookup::Unreadable;
            }
        };

        let missing = cached.missing_fields(original);
        if !missing.is_empty() {
            return Lookup::Incomplete(missing);
        }

        Lookup::Hit(cached)
    }

    /// Store a translation and persist the whole cache immediately.
    pub fn put<T: Translatable>(
        &mut self,
        key: &str,
        fingerprint: &str,
        translation: &T,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            fingerprint: fingerprint.to_string(),
            translation: serde_json::to_value(translation)?,
        };
        self.entries.insert(key.to_string(), entry);
        self.save()
    }

    pub fn save(&self) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, CacheEntry> {
    if !path.exists() {
        return BTreeMap::new();
    }

    let data = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!("failed to read {}: {e}; starting with an empty cache", path.display());
            return BTreeMap::new();
        }
    };

    match serde_json::from_str(&data) {
        Ok(v) => v,
        Err(e) => {
            warn!("failed to parse {}: {e}; starting with an empty cache", path.display());
            BTreeMap::new()
        }
    }
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(&tmp, bytes)?;

    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&tmp, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "cache".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PostFields;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn original() -> PostFields {
        PostFields {
            title: "Hello".into(),
            excerpt: "X".into(),
            tags: vec!["ml".into()],
            content: "Body".into(),
        }
    }

    fn translated() -> PostFields {
        PostFields {
            title: "Olá".into(),
            excerpt: "X".into(),
            tags: vec!["ml".into()],
            content: "Corpo".into(),
        }
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let mut cache = TranslationCache::load(blocker.join(CACHE_FILE));
        let err = cache.put("my-post", "fp", &translated()).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }), "got {err}");
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let cache = TranslationCache::load(dir.path().join(CACHE_FILE));
        assert!(cache.is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE);
        fs::write(&path, "{ not json").unwrap();

        let cache = TranslationCache::load(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn put_is_durable_and_get_checks_fingerprint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CACHE_FILE);

        let mut cache = TranslationCache::load(&path);
        cache.put("my-post", "H1", &translated()).unwrap();

        let reloaded = TranslationCache::load(&path);
        assert_eq!(reloaded.get("my-post", "H1", &original()), Some(translated()));
        assert_eq!(reloaded.get::<PostFields>("my-post", "H2", &original()), None);
        assert_eq!(reloaded.get::<PostFields>("other", "H1", &original()), None);
    }

    #[test]
    fn incomplete_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE);
        fs::write(
            &path,
            r#"{"my-post": {"fingerprint": "H", "translation": {"title": "", "excerpt": "X", "tags": ["ml"], "content": "Corpo"}}}"#,
        )
        .unwrap();

        let cache = TranslationCache::load(&path);
        assert_eq!(cache.get::<PostFields>("my-post", "H", &original()), None);
        assert_eq!(
            cache.lookup::<PostFields>("my-post", "H", &original()),
            Lookup::Incomplete(vec!["TITLE".to_string()])
        );
    }

    #[test]
    fn legacy_hash_field_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE);
        fs::write(
            &path,
            r#"{"my-post": {"hash": "H", "translation": {"title": "Olá", "excerpt": "X", "tags": ["ml"], "content": "Corpo"}}}"#,
        )
        .unwrap();

        let cache = TranslationCache::load(&path);
        assert_eq!(cache.get("my-post", "H", &original()), Some(translated()));
    }

    #[test]
    fn file_is_pretty_and_keeps_accents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE);

        let mut cache = TranslationCache::load(&path);
        cache.put("my-post", "H1", &translated()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Olá"));
        assert!(raw.contains("\n  \"my-post\""));
        assert!(!path.with_file_name(format!("{CACHE_FILE}.tmp")).exists());
    }
}
