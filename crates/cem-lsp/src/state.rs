//! Shared server state: the Document Store and Manifest Registry every
//! handler reads, bundled the way the teacher's `ServerState` bundled its
//! document map and shared caches.

use std::path::PathBuf;

use cem_registry::ManifestRegistry;

use crate::document::DocumentStore;

pub struct AppState {
    pub documents: DocumentStore,
    pub registry: ManifestRegistry,
    pub workspace_root: PathBuf,
}

impl AppState {
    pub fn new(workspace_root: PathBuf, extra_manifest_paths: Vec<PathBuf>) -> Self {
        Self {
            documents: DocumentStore::new(),
            registry: ManifestRegistry::new(workspace_root.clone(), extra_manifest_paths),
            workspace_root,
        }
    }
}
