use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tempfile::Builder;

use crate::error::SearchError;

pub const SPECIES_LIST_KEY: &str = "species_list";

#[derive(Debug, Clone)]
pub struct Cache {
    root: Utf8PathBuf,
}

impl Cache {
    pub fn new() -> Result<Self, SearchError> {
        let root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("poke-search")).ok()
            })
            .ok_or_else(|| SearchError::Cache("unable to resolve cache directory".to_string()))?;
        Ok(Self { root })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn open(root: Option<Utf8PathBuf>) -> Result<Self, SearchError> {
        match root {
            Some(root) => Ok(Self::new_with_root(root)),
            None => Self::new(),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn entry_path(&self, key: &str) -> Result<Utf8PathBuf, SearchError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, SearchError> {
        let path = self.entry_path(key)?;
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| SearchError::Cache(format!("read {path}: {err}")))?;
        Ok(Some(content))
    }

    pub fn contains(&self, key: &str) -> Result<bool, SearchError> {
        Ok(self.entry_path(key)?.as_std_path().exists())
    }

    pub fn set(&self, key: &str, blob: &str) -> Result<(), SearchError> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| SearchError::Cache(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix("poke-search-entry")
            .tempfile_in(self.root.as_std_path())
            .map_err(|err| SearchError::Cache(err.to_string()))?;
        temp.write_all(blob.as_bytes())
            .map_err(|err| SearchError::Cache(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| SearchError::Cache(err.to_string()))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SearchError> {
        if self.root.as_std_path().exists() {
            fs::remove_dir_all(self.root.as_std_path())
                .map_err(|err| SearchError::Cache(err.to_string()))?;
        }
        Ok(())
    }

    pub fn entry_count(&self) -> Result<usize, SearchError> {
        if !self.root.as_std_path().exists() {
            return Ok(0);
        }
        let entries = fs::read_dir(self.root.as_std_path())
            .map_err(|err| SearchError::Cache(err.to_string()))?;
        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|err| SearchError::Cache(err.to_string()))?;
            let path = entry.path();
            if path.is_file() && path.extension().map(|ext| ext == "json").unwrap_or(false) {
                count += 1;
            }
        }
        Ok(count)
    }
}

fn validate_key(key: &str) -> Result<(), SearchError> {
    let is_valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if !is_valid {
        return Err(SearchError::InvalidCacheKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn temp_cache() -> (tempfile::TempDir, Cache) {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("cache")).unwrap();
        (temp, Cache::new_with_root(root))
    }

    #[test]
    fn get_missing_is_none() {
        let (_temp, cache) = temp_cache();
        assert_eq!(cache.get("entity_1").unwrap(), None);
        assert_eq!(cache.entry_count().unwrap(), 0);
    }

    #[test]
    fn set_then_get_and_overwrite() {
        let (_temp, cache) = temp_cache();
        cache.set("entity_1", r#"{"id":"1"}"#).unwrap();
        cache.set("entity_1", r#"{"id":"1","name":"bulbasaur"}"#).unwrap();

        assert_eq!(
            cache.get("entity_1").unwrap().as_deref(),
            Some(r#"{"id":"1","name":"bulbasaur"}"#)
        );
        assert!(cache.contains("entity_1").unwrap());
        assert_eq!(cache.entry_count().unwrap(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let (_temp, cache) = temp_cache();
        cache.set("entity_1", "{}").unwrap();
        cache.set(SPECIES_LIST_KEY, "{}").unwrap();
        cache.clear().unwrap();

        assert_eq!(cache.get("entity_1").unwrap(), None);
        assert_eq!(cache.entry_count().unwrap(), 0);
    }

    #[test]
    fn rejects_unsafe_keys() {
        let (_temp, cache) = temp_cache();
        assert_matches!(
            cache.set("../escape", "{}"),
            Err(SearchError::InvalidCacheKey(_))
        );
    }
}
