//! Collection registry.
//!
//! Collections are few and change rarely, so they live as JSON files in
//! a local directory (one `{collection_id}.json` per collection) rather
//! than as backend documents. Files are read per call; updating the
//! directory updates the registry without a restart.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use stac_search_shared::StacCollection;

/// Errors reading the collection registry.
#[derive(Debug, Error)]
pub enum CollectionRegistryError {
    /// The registry directory or a collection file could not be read.
    #[error("Failed to read collection registry: {0}")]
    Io(#[from] std::io::Error),

    /// A collection file exists but is not a valid STAC Collection.
    #[error("Collection '{id}' is malformed: {message}")]
    Malformed { id: String, message: String },
}

/// File-backed lookup of STAC Collections by id.
pub struct CollectionRegistry {
    dir: PathBuf,
}

impl CollectionRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Look up one collection by id. Unknown ids are `Ok(None)`.
    pub fn get(
        &self,
        collection_id: &str,
    ) -> Result<Option<StacCollection>, CollectionRegistryError> {
        // ids are file stems; anything that could escape the registry
        // directory is treated as unknown
        if collection_id.contains(['/', '\\']) || collection_id.contains("..") {
            return Ok(None);
        }
        let path = self.dir.join(format!("{}.json", collection_id));
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::load(&path, collection_id)?))
    }

    /// All registered collections, ordered by id.
    pub fn list(&self) -> Result<Vec<StacCollection>, CollectionRegistryError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        debug!(count = paths.len(), dir = %self.dir.display(), "Listing collections");
        paths
            .iter()
            .map(|path| {
                let id = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                Self::load(path, id)
            })
            .collect()
    }

    fn load(path: &Path, id: &str) -> Result<StacCollection, CollectionRegistryError> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| CollectionRegistryError::Malformed {
            id: id.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn collection_json(id: &str) -> Value {
        json!({
            "type": "Collection",
            "id": id,
            "stac_version": "1.0.0",
            "description": "Test collection",
            "license": "CC-BY-4.0",
            "extent": {
                "spatial": {"bbox": [[-180.0, -90.0, 180.0, 90.0]]},
                "temporal": {"interval": [["2020-01-01T00:00:00Z", null]]}
            }
        })
    }

    fn registry_with(test_name: &str, files: &[(&str, String)]) -> (CollectionRegistry, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "stac-collection-registry-{}-{}",
            std::process::id(),
            test_name
        ));
        fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
        (CollectionRegistry::new(&dir), dir)
    }

    #[test]
    fn test_get_returns_registered_collection() {
        let (registry, dir) = registry_with(
            "get",
            &[("cmip6.json", collection_json("cmip6").to_string())],
        );

        let collection = registry.get("cmip6").unwrap().unwrap();
        assert_eq!(collection.id, "cmip6");
        assert_eq!(collection.license, "CC-BY-4.0");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_get_unknown_collection_is_none() {
        let (registry, dir) = registry_with("get-unknown", &[]);
        assert!(registry.get("nope").unwrap().is_none());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_get_rejects_path_escapes() {
        let (registry, dir) = registry_with("escape", &[]);
        assert!(registry.get("../cmip6").unwrap().is_none());
        assert!(registry.get("a/b").unwrap().is_none());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let (registry, dir) = registry_with(
            "list",
            &[
                ("cmip6.json", collection_json("cmip6").to_string()),
                ("aviris.json", collection_json("aviris").to_string()),
                ("notes.txt", "not a collection".to_string()),
            ],
        );

        let collections = registry.list().unwrap();
        let ids: Vec<&str> = collections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["aviris", "cmip6"]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_malformed_collection_file_errors_with_id() {
        let (registry, dir) = registry_with(
            "malformed",
            &[("broken.json", "{not valid".to_string())],
        );

        let err = registry.get("broken").unwrap_err();
        assert!(matches!(err, CollectionRegistryError::Malformed { .. }));
        assert!(err.to_string().contains("broken"));

        fs::remove_dir_all(dir).unwrap();
    }
}
