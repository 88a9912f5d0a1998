/// Simple JSON-based storage for generation records
/// Images are plain PNG files next to the index
use crate::models::Generation;
use anyhow::Context;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

const INDEX_FILE: &str = "generations.json";

/// `name` with `tag` spliced in before the extension
pub fn tagged_name(name: &str, tag: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, tag, ext),
        None => format!("{}_{}", name, tag),
    }
}

/// Which image directory a file lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Raw,
    Processed,
    Rendered,
}

impl ImageKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            ImageKind::Raw => "image_raw",
            ImageKind::Processed => "image_processed",
            ImageKind::Rendered => "image_rendered",
        }
    }
}

pub struct GenerationStore {
    storage_path: PathBuf,
    generations: RwLock<HashMap<String, Generation>>,
}

impl GenerationStore {
    pub fn new(storage_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let storage_path = storage_path.as_ref().to_path_buf();
        for kind in [ImageKind::Raw, ImageKind::Processed, ImageKind::Rendered] {
            fs::create_dir_all(storage_path.join(kind.dir_name()))?;
        }

        let index = storage_path.join(INDEX_FILE);
        let generations = if index.exists() {
            let data = fs::read_to_string(&index)?;
            serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!("ignoring unreadable {}: {}", index.display(), e);
                HashMap::new()
            })
        } else {
            HashMap::new()
        };

        Ok(Self {
            storage_path,
            generations: RwLock::new(generations),
        })
    }

    pub fn root(&self) -> &Path {
        &self.storage_path
    }

    pub fn image_path(&self, kind: ImageKind, name: &str) -> PathBuf {
        self.storage_path.join(kind.dir_name()).join(name)
    }

    /// Create a new image file, failing if `name` is already taken
    pub fn write_image(&self, kind: ImageKind, name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.image_path(kind, name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        file.write_all(bytes)?;
        Ok(path)
    }

    /// Best effort cleanup of a file written for a generation that was not recorded
    pub fn remove_image(&self, kind: ImageKind, name: &str) {
        let path = self.image_path(kind, name);
        if let Err(e) = fs::remove_file(&path) {
            warn!("failed to remove {}: {}", path.display(), e);
        }
    }

    pub fn read_image(&self, kind: ImageKind, name: &str) -> anyhow::Result<Vec<u8>> {
        Ok(fs::read(self.image_path(kind, name))?)
    }

    /// Newest first
    pub fn list(&self) -> Vec<Generation> {
        let mut generations: Vec<Generation> = self.generations.read().values().cloned().collect();
        generations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        generations
    }

    pub fn get(&self, id: &str) -> Option<Generation> {
        self.generations.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.generations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, generation: Generation) -> anyhow::Result<Generation> {
        let mut generations = self.generations.write();
        generations.insert(generation.id.clone(), generation.clone());
        drop(generations);

        self.save()?;
        Ok(generation)
    }

    fn save(&self) -> anyhow::Result<()> {
        let generations = self.generations.read();
        let json = serde_json::to_string_pretty(&*generations)?;
        fs::write(self.storage_path.join(INDEX_FILE), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(id: &str, age_secs: i64) -> Generation {
        Generation {
            id: id.to_string(),
            prompt: "tiger".to_string(),
            full_prompt: "A vibrant red Chinese paper, tiger".to_string(),
            seed: 7,
            placeholder: true,
            raw_file: format!("{}_raw.png", id),
            processed_file: format!("{}.png", id),
            download_name: "papercut_1.png".to_string(),
            scenes: vec!["window".to_string()],
            sha256: String::new(),
            width: 4,
            height: 4,
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[test]
    fn test_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        for name in ["image_raw", "image_processed", "image_rendered"] {
            assert!(dir.path().join(name).is_dir());
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_newest_first_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = GenerationStore::new(dir.path()).unwrap();
            store.insert(record("old", 60)).unwrap();
            store.insert(record("new", 0)).unwrap();
            store.insert(record("mid", 30)).unwrap();
        }

        let store = GenerationStore::new(dir.path()).unwrap();
        let ids: Vec<String> = store.list().into_iter().map(|g| g.id).collect();
        assert_eq!(ids, ["new", "mid", "old"]);
        assert_eq!(store.get("mid").unwrap().seed, 7);
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_tagged_name() {
        assert_eq!(tagged_name("flux_tiger_1.png", "ab12"), "flux_tiger_1_ab12.png");
        assert_eq!(tagged_name("raw", "ab12"), "raw_ab12");
    }

    #[test]
    fn test_write_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();

        store.write_image(ImageKind::Processed, "papercut_1.png", b"first").unwrap();
        assert!(store
            .write_image(ImageKind::Processed, "papercut_1.png", b"second")
            .is_err());
        assert_eq!(
            store.read_image(ImageKind::Processed, "papercut_1.png").unwrap(),
            b"first"
        );

        store.remove_image(ImageKind::Processed, "papercut_1.png");
        assert!(!store.image_path(ImageKind::Processed, "papercut_1.png").exists());
    }

    #[test]
    fn test_corrupt_index_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INDEX_FILE), "{ not json").unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        assert!(store.is_empty());
    }
}
