//! Locates `custom-elements.json` manifests within a workspace.
//!
//! Discovery order matters: workspace-local manifests take precedence over
//! package manifests under `node_modules`, which in turn take precedence
//! over explicitly configured paths. [`ManifestRegistry::reload`] relies on
//! this ordering to decide which definition wins when two manifests declare
//! the same tag name.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::Deserialize;

/// One discovered manifest and where it came from, preserved for
/// diagnostics (duplicate-tag reporting names the owning manifest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredManifest {
    pub path: PathBuf,
    pub package_name: Option<String>,
}

#[derive(Deserialize)]
struct PackageJson {
    name: Option<String>,
    #[serde(rename = "customElements")]
    custom_elements: Option<String>,
}

/// Walks `workspace_root` for `custom-elements.json` files, honoring
/// `.gitignore`/`.ignore` but always skipping `node_modules` (which is
/// scanned separately via `package.json#customElements`), then scans
/// `node_modules/*/package.json` in alphabetical package order, then
/// appends `extra_paths` verbatim.
pub fn discover_manifests(
    workspace_root: &Path,
    extra_paths: &[PathBuf],
) -> Vec<DiscoveredManifest> {
    let mut found = Vec::new();
    found.extend(discover_workspace_manifests(workspace_root));
    found.extend(discover_node_modules_manifests(workspace_root));
    found.extend(extra_paths.iter().cloned().map(|path| DiscoveredManifest {
        path,
        package_name: None,
    }));
    found
}

fn discover_workspace_manifests(workspace_root: &Path) -> Vec<DiscoveredManifest> {
    let mut manifests = Vec::new();
    let mut walker = WalkBuilder::new(workspace_root);
    walker.filter_entry(|entry| entry.file_name() != "node_modules");

    for entry in walker.build().flatten() {
        if entry.file_name() == "custom-elements.json" {
            manifests.push(DiscoveredManifest {
                path: entry.path().to_path_buf(),
                package_name: None,
            });
        }
    }
    manifests.sort_by(|a, b| a.path.cmp(&b.path));
    manifests
}

fn discover_node_modules_manifests(workspace_root: &Path) -> Vec<DiscoveredManifest> {
    let node_modules = workspace_root.join("node_modules");
    let Ok(mut packages) = std::fs::read_dir(&node_modules).map(|read| {
        read.flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>()
    }) else {
        return Vec::new();
    };
    packages.sort();

    packages
        .into_iter()
        .filter_map(|package_dir| {
            let package_json_path = package_dir.join("package.json");
            let text = std::fs::read_to_string(&package_json_path).ok()?;
            let package_json: PackageJson = serde_json::from_str(&text).ok()?;
            let custom_elements = package_json.custom_elements?;
            Some(DiscoveredManifest {
                path: package_dir.join(custom_elements),
                package_name: package_json.name,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_workspace_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("custom-elements.json"), "{}").unwrap();
        let manifests = discover_manifests(dir.path(), &[]);
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].package_name, None);
    }

    #[test]
    fn test_node_modules_manifest_via_package_json() {
        let dir = tempfile::tempdir().unwrap();
        let package_dir = dir.path().join("node_modules").join("my-lib");
        fs::create_dir_all(&package_dir).unwrap();
        fs::write(
            package_dir.join("package.json"),
            r#"{"name": "my-lib", "customElements": "custom-elements.json"}"#,
        )
        .unwrap();
        fs::write(package_dir.join("custom-elements.json"), "{}").unwrap();

        let manifests = discover_manifests(dir.path(), &[]);
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].package_name.as_deref(), Some("my-lib"));
        assert_eq!(manifests[0].path, package_dir.join("custom-elements.json"));
    }

    #[test]
    fn test_node_modules_without_custom_elements_field_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let package_dir = dir.path().join("node_modules").join("plain-lib");
        fs::create_dir_all(&package_dir).unwrap();
        fs::write(package_dir.join("package.json"), r#"{"name": "plain-lib"}"#).unwrap();

        assert!(discover_manifests(dir.path(), &[]).is_empty());
    }

    #[test]
    fn test_explicit_paths_appended_last() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("custom-elements.json"), "{}").unwrap();
        let extra = dir.path().join("vendor/manifest.json");
        let manifests = discover_manifests(dir.path(), std::slice::from_ref(&extra));
        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[1].path, extra);
    }

    #[test]
    fn test_workspace_walk_ignores_node_modules_directly() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("node_modules/other/nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("custom-elements.json"), "{}").unwrap();
        assert!(discover_workspace_manifests(dir.path()).is_empty());
    }
}
