//! Client-side file watcher registration for manifest changes (§4.6).
//!
//! The LSP client is the preferred watch source: on `initialized`, the
//! server asks it to dynamically register `workspace/didChangeWatchedFiles`
//! for `**/custom-elements.json` and `**/package.json`. Clients that don't
//! support dynamic registration fall back to [`spawn_fallback_watcher`],
//! which polls [`cem_registry::NotifyFileWatcher`] directly.

use std::sync::Arc;
use std::time::Duration;

use tower_lsp_server::ls_types::{
    DidChangeWatchedFilesRegistrationOptions, FileSystemWatcher, GlobPattern, Registration,
    WatchKind,
};
use tower_lsp_server::Client;

use cem_registry::{FileWatcher, NotifyFileWatcher};

use crate::state::AppState;

const WATCHED_GLOBS: [&str; 2] = ["**/custom-elements.json", "**/package.json"];

/// Requests dynamic registration of the manifest-relevant glob patterns.
pub async fn register_manifest_watchers(client: &Client) -> Result<(), String> {
    let watchers: Vec<FileSystemWatcher> = WATCHED_GLOBS
        .iter()
        .map(|pattern| FileSystemWatcher {
            glob_pattern: GlobPattern::String((*pattern).to_string()),
            kind: Some(WatchKind::Create | WatchKind::Change | WatchKind::Delete),
        })
        .collect();

    let options = DidChangeWatchedFilesRegistrationOptions { watchers };

    let registration = Registration {
        id: "cem-lsp-manifest-watcher".to_string(),
        method: "workspace/didChangeWatchedFiles".to_string(),
        register_options: Some(serde_json::to_value(options).map_err(|e| e.to_string())?),
    };

    client
        .register_capability(vec![registration])
        .await
        .map_err(|e| format!("failed to register file watchers: {e}"))?;

    tracing::info!("registered manifest file watchers");
    Ok(())
}

/// Starts a background task watching the workspace root for manifest
/// changes, for clients that can't dynamically register watchers. Reloads
/// are debounced by the watcher itself (§4.6); this task just polls for
/// coalesced events and triggers a registry reload when any arrive.
pub fn spawn_fallback_watcher(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut watcher = match NotifyFileWatcher::new() {
            Ok(watcher) => watcher,
            Err(e) => {
                tracing::warn!("could not start fallback file watcher: {e}");
                return;
            }
        };
        if let Err(e) = watcher.watch(&state.workspace_root) {
            tracing::warn!("could not watch workspace root: {e}");
            return;
        }

        let mut interval = tokio::time::interval(Duration::from_millis(100));
        loop {
            interval.tick().await;
            let events = watcher.poll();
            if events.is_empty() {
                continue;
            }
            let relevant = events.iter().any(|event| {
                let path = match event {
                    cem_registry::WatchEvent::Created(p)
                    | cem_registry::WatchEvent::Changed(p)
                    | cem_registry::WatchEvent::Removed(p) => p,
                };
                matches!(
                    path.file_name().and_then(|n| n.to_str()),
                    Some("custom-elements.json") | Some("package.json")
                )
            });
            if !relevant {
                continue;
            }
            match state.registry.reload() {
                Ok(report) => tracing::info!(
                    loaded = report.manifests_loaded,
                    failed = report.manifests_failed,
                    "manifest registry reloaded via fallback watcher"
                ),
                Err(e) => tracing::warn!("manifest reload failed: {e}"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watched_globs_cover_manifests_and_packages() {
        assert!(WATCHED_GLOBS.contains(&"**/custom-elements.json"));
        assert!(WATCHED_GLOBS.contains(&"**/package.json"));
    }
}
