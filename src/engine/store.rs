// Knoux Project Store — Shadow Write Persistence
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// One JSON document per project under the projects directory.
// Saves go to a `.knoux_tmp` sidecar first and are renamed into place, so a
// crash mid-write leaves the previous good file untouched.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use super::project::ProjectState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Invalid project id: {0:?}")]
    InvalidId(String),
    #[error("Project I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Project JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `id`. Ids are restricted so they can never
    /// escape the store directory.
    pub fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }

    /// Stamps `modifiedAt` and writes the project atomically.
    pub async fn save(&self, project: &mut ProjectState) -> Result<PathBuf, StoreError> {
        let path = self.path_for(&project.id)?;
        fs::create_dir_all(&self.root).await.map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        project.touch();
        let json = serde_json::to_vec_pretty(project)?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".knoux_tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, &json).await.map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        if let Err(source) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::Io { path, source });
        }

        info!(
            project_id = %project.id,
            bytes = json.len(),
            "[STORE] Saved project to {:?}",
            path
        );
        Ok(path)
    }

    pub async fn load(&self, id: &str) -> Result<ProjectState, StoreError> {
        let path = self.path_for(id)?;
        let bytes = match fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()))
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let project = serde_json::from_slice(&bytes)?;
        debug!(project_id = id, "[STORE] Loaded project");
        Ok(project)
    }

    /// Ids of all stored projects, sorted. A missing directory is an empty store.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let mut ids = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_id(stem) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(project_id = id, "[STORE] Deleted project");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(id.to_string())),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("projects"));

        let mut project = ProjectState::new("Demo");
        let before = project.metadata.modified_at.clone();
        let path = store.save(&mut project).await.unwrap();

        assert!(path.ends_with(format!("{}.json", project.id)));
        assert!(!path.with_extension("json.knoux_tmp").exists());
        assert!(project.metadata.modified_at >= before);

        let loaded = store.load(&project.id).await.unwrap();
        assert_eq!(loaded, project);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        assert!(store.list().await.unwrap().is_empty());

        let mut a = ProjectState::new("a");
        a.id = "b-project".into();
        let mut b = ProjectState::new("b");
        b.id = "a-project".into();
        store.save(&mut a).await.unwrap();
        store.save(&mut b).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(store.list().await.unwrap(), ["a-project", "b-project"]);

        store.delete("a-project").await.unwrap();
        assert!(matches!(store.load("a-project").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("a-project").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        for id in ["../etc/passwd", "", "a/b", "..", "a.b"] {
            assert!(matches!(store.load(id).await, Err(StoreError::InvalidId(_))), "{id}");
        }
    }

    #[tokio::test]
    async fn test_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let store = ProjectStore::new(dir.path());
        assert!(matches!(store.load("broken").await, Err(StoreError::Json(_))));
    }
}
