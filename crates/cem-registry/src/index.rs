//! The Manifest Registry: discovers, parses, and indexes Custom Elements
//! Manifests, and answers tag-name lookups for every handler.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use cem_core::{
    Attribute, CemError, Declaration, ElementDefinition, Manifest, ManifestCache, Result, Slot,
    parse_manifest,
};

use crate::discovery::{discover_manifests, DiscoveredManifest};

#[derive(Debug, Default, Clone)]
struct Indices {
    /// Last-loaded definition per tag name (discovery-order tie-break).
    elements: HashMap<String, ElementDefinition>,
    /// Every definition seen for a tag name, in discovery order, including
    /// the one that currently wins in `elements`. Lets a caller inspect
    /// collisions without re-walking the workspace.
    alternatives: HashMap<String, Vec<ElementDefinition>>,
}

/// Summary of a completed [`ManifestRegistry::reload`], retained so the
/// workspace symbol handler can report duplicate tags without re-scanning.
#[derive(Debug, Clone, Default)]
pub struct ReloadReport {
    pub manifests_loaded: usize,
    pub manifests_failed: usize,
    pub duplicate_tags: Vec<String>,
}

/// Indexes custom element declarations across every manifest reachable from
/// a workspace, keyed by lowercase tag name.
///
/// Reads never block on a reload: [`ManifestRegistry::reload`] builds a
/// fresh [`Indices`] snapshot off to the side and swaps it in under a brief
/// write lock, so a lookup never observes a partially rebuilt index.
pub struct ManifestRegistry {
    workspace_root: PathBuf,
    extra_paths: Vec<PathBuf>,
    indices: RwLock<Arc<Indices>>,
    report: RwLock<ReloadReport>,
    cache: ManifestCache,
}

impl ManifestRegistry {
    pub fn new(workspace_root: PathBuf, extra_paths: Vec<PathBuf>) -> Self {
        Self {
            workspace_root,
            extra_paths,
            indices: RwLock::new(Arc::new(Indices::default())),
            report: RwLock::new(ReloadReport::default()),
            cache: ManifestCache::new(),
        }
    }

    /// Re-discovers manifests and rebuilds the indices from scratch.
    ///
    /// Manifests whose bytes haven't changed since the last successful
    /// parse are served from the mtime-validated cache, so a reload
    /// triggered by an unrelated file in a watched directory is cheap.
    pub fn reload(&self) -> Result<ReloadReport> {
        let discovered = discover_manifests(&self.workspace_root, &self.extra_paths);
        let mut elements: HashMap<String, ElementDefinition> = HashMap::new();
        let mut alternatives: HashMap<String, Vec<ElementDefinition>> = HashMap::new();
        let mut duplicate_tags = Vec::new();
        let mut manifests_failed = 0;

        for discovered_manifest in &discovered {
            let manifest = match self.load_manifest(&discovered_manifest.path) {
                Ok(manifest) => manifest,
                Err(err) => {
                    tracing::warn!(
                        path = %discovered_manifest.path.display(),
                        error = %err,
                        "failed to load manifest"
                    );
                    manifests_failed += 1;
                    continue;
                }
            };
            self.index_manifest(
                &manifest,
                discovered_manifest,
                &mut elements,
                &mut alternatives,
                &mut duplicate_tags,
            );
        }

        let report = ReloadReport {
            manifests_loaded: discovered.len() - manifests_failed,
            manifests_failed,
            duplicate_tags,
        };

        *self.indices.write().unwrap() = Arc::new(Indices {
            elements,
            alternatives,
        });
        *self.report.write().unwrap() = report.clone();
        Ok(report)
    }

    fn index_manifest(
        &self,
        manifest: &Manifest,
        source: &DiscoveredManifest,
        elements: &mut HashMap<String, ElementDefinition>,
        alternatives: &mut HashMap<String, Vec<ElementDefinition>>,
        duplicate_tags: &mut Vec<String>,
    ) {
        for module in &manifest.modules {
            for declaration in &module.declarations {
                let Declaration::Class(class) = declaration else {
                    continue;
                };
                let Some(definition) = ElementDefinition::from_declaration(
                    class,
                    &module.path,
                    source.package_name.as_deref(),
                ) else {
                    continue;
                };
                let tag_name = definition.tag_name.clone();
                if elements.contains_key(&tag_name) && !duplicate_tags.contains(&tag_name) {
                    duplicate_tags.push(tag_name.clone());
                }
                alternatives
                    .entry(tag_name.clone())
                    .or_default()
                    .push(definition.clone());
                elements.insert(tag_name, definition);
            }
        }
    }

    fn load_manifest(&self, path: &Path) -> Result<Manifest> {
        let metadata = std::fs::metadata(path)?;
        if let Some(cached) = self.cache.get_if_fresh(path, &metadata) {
            return Ok((*cached).clone());
        }
        let text = std::fs::read_to_string(path)?;
        let manifest = parse_manifest(&text).map_err(|source| CemError::ManifestParse {
            path: path.display().to_string(),
            source,
        })?;
        self.cache.insert(path.to_path_buf(), &metadata, manifest.clone());
        Ok(manifest)
    }

    /// Drops the cached parse for `path`, forcing the next [`Self::reload`]
    /// to re-read it from disk. Called by the file watcher on a targeted
    /// change notification.
    pub fn invalidate(&self, path: &Path) {
        self.cache.invalidate(path);
    }

    pub fn element(&self, tag_name: &str) -> Option<ElementDefinition> {
        self.indices.read().unwrap().elements.get(tag_name).cloned()
    }

    pub fn attributes(&self, tag_name: &str) -> Option<HashMap<String, Attribute>> {
        self.element(tag_name)
            .map(|def| def.attributes.into_iter().map(|a| (a.name.clone(), a)).collect())
    }

    pub fn slots(&self, tag_name: &str) -> Option<Vec<Slot>> {
        self.element(tag_name).map(|def| def.slots)
    }

    /// Every definition seen for `tag_name` across all loaded manifests, in
    /// discovery order; the last entry matches [`Self::element`].
    pub fn alternatives(&self, tag_name: &str) -> Vec<ElementDefinition> {
        self.indices
            .read()
            .unwrap()
            .alternatives
            .get(tag_name)
            .cloned()
            .unwrap_or_default()
    }

    /// All known tag names, for the workspace symbol handler.
    pub fn tag_names(&self) -> Vec<String> {
        self.indices.read().unwrap().elements.keys().cloned().collect()
    }

    pub fn last_reload_report(&self) -> ReloadReport {
        self.report.read().unwrap().clone()
    }
}
