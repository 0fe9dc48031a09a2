//! The `LanguageServer` trait implementation (§6): wires every handler in
//! [`crate::handlers`] to its LSP method and owns the server's two pieces
//! of long-lived state, the [`AppState`] (documents + registry) and the
//! client-negotiated [`CemConfig`].

use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp_server::ls_types::{
    CodeActionOptions, CodeActionParams, CodeActionProviderCapability, CompletionOptions,
    CompletionParams, CompletionResponse, DiagnosticOptions, DiagnosticServerCapabilities,
    DidChangeTextDocumentParams, DidChangeWatchedFilesParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DocumentDiagnosticParams, DocumentDiagnosticReport,
    DocumentDiagnosticReportResult, FullDocumentDiagnosticReport, GotoDefinitionParams,
    GotoDefinitionResponse, Hover, HoverParams, HoverProviderCapability, InitializeParams,
    InitializeResult, InitializedParams, Location, MessageType, OneOf, ReferenceParams,
    RelatedFullDocumentDiagnosticReport, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, WorkspaceSymbolParams,
    WorkspaceSymbolResponse,
};
use tower_lsp_server::{jsonrpc::Result, Client, LanguageServer};

use crate::config::CemConfig;
use crate::file_watcher;
use crate::handlers::{code_actions, completion, definition, diagnostics, hover, references, workspace_symbol};
use crate::state::AppState;

pub struct Backend {
    client: Client,
    state: Arc<AppState>,
    config: Arc<RwLock<CemConfig>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self::with_workspace_root(client, std::env::current_dir().unwrap_or_default())
    }

    pub fn with_workspace_root(client: Client, workspace_root: std::path::PathBuf) -> Self {
        Self::with_workspace_root_and_manifests(client, workspace_root, Vec::new())
    }

    pub fn with_workspace_root_and_manifests(
        client: Client,
        workspace_root: std::path::PathBuf,
        extra_manifest_paths: Vec<std::path::PathBuf>,
    ) -> Self {
        Self {
            client,
            state: Arc::new(AppState::new(workspace_root, extra_manifest_paths)),
            config: Arc::new(RwLock::new(CemConfig::default())),
        }
    }

    fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            completion_provider: Some(CompletionOptions {
                trigger_characters: Some(
                    ["<", " ", "=", "\"", "'"].into_iter().map(String::from).collect(),
                ),
                resolve_provider: Some(false),
                ..Default::default()
            }),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            definition_provider: Some(OneOf::Left(true)),
            references_provider: Some(OneOf::Left(true)),
            code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
                code_action_kinds: Some(vec![tower_lsp_server::ls_types::CodeActionKind::QUICKFIX]),
                ..Default::default()
            })),
            workspace_symbol_provider: Some(OneOf::Left(true)),
            diagnostic_provider: Some(DiagnosticServerCapabilities::Options(DiagnosticOptions {
                identifier: Some("cem".into()),
                inter_file_dependencies: false,
                workspace_diagnostics: false,
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    async fn publish_diagnostics_for(&self, uri: tower_lsp_server::ls_types::Uri, version: Option<i32>) {
        let config = self.config.read().await;
        let items =
            diagnostics::handle_diagnostics(Arc::clone(&self.state), &uri, &config.diagnostics).await;
        self.client.publish_diagnostics(uri, items, version).await;
    }
}

impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("initializing cem-lsp server");

        if let Some(init_options) = params.initialization_options
            && let Ok(config) = serde_json::from_value::<CemConfig>(init_options)
        {
            tracing::debug!("loaded configuration: {:?}", config);
            *self.config.write().await = config;
        }

        self.state.registry.reload().ok();

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "cem-lsp".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("cem-lsp server initialized");
        self.client
            .log_message(MessageType::INFO, "cem-lsp ready")
            .await;

        if let Err(e) = file_watcher::register_manifest_watchers(&self.client).await {
            tracing::warn!("dynamic file watching unavailable, falling back to a local watcher: {e}");
            file_watcher::spawn_fallback_watcher(Arc::clone(&self.state));
        }
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("shutting down cem-lsp server");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        tracing::info!("document opened: {:?}", uri);
        if self.state.documents.open(uri.clone(), params.text_document.text, version).is_none() {
            tracing::debug!("ignoring unsupported document: {:?}", uri);
            return;
        }
        self.publish_diagnostics_for(uri, Some(version)).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        let Some(change) = params.content_changes.into_iter().next() else {
            return;
        };
        if let Err(e) = self.state.documents.update(&uri, change.text, version) {
            tracing::warn!("dropping change for {:?}: {e}", uri);
            return;
        }
        self.publish_diagnostics_for(uri, Some(version)).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("document closed: {:?}", uri);
        self.state.documents.close(&uri);
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        tracing::debug!("received {} file change events", params.changes.len());
        let mut reload_needed = false;
        for change in &params.changes {
            let Some(path) = change.uri.to_file_path() else {
                continue;
            };
            match path.file_name().and_then(|name| name.to_str()) {
                Some("custom-elements.json") | Some("package.json") => reload_needed = true,
                _ => {}
            }
        }
        if reload_needed {
            match self.state.registry.reload() {
                Ok(report) => tracing::info!(
                    loaded = report.manifests_loaded,
                    failed = report.manifests_failed,
                    "manifest registry reloaded"
                ),
                Err(e) => tracing::warn!("manifest reload failed: {e}"),
            }
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let cold_start_enabled = self.config.read().await.cold_start.enabled;
        Ok(hover::handle_hover(Arc::clone(&self.state), params, cold_start_enabled).await)
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let config = self.config.read().await;
        Ok(completion::handle_completion(Arc::clone(&self.state), params, &config.completion).await)
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> Result<Option<GotoDefinitionResponse>> {
        Ok(definition::handle_definition(Arc::clone(&self.state), params).await)
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        Ok(Some(references::handle_references(Arc::clone(&self.state), params).await))
    }

    async fn symbol(&self, params: WorkspaceSymbolParams) -> Result<Option<WorkspaceSymbolResponse>> {
        Ok(Some(
            workspace_symbol::handle_workspace_symbol(Arc::clone(&self.state), params)
                .await
                .into(),
        ))
    }

    async fn code_action(
        &self,
        params: CodeActionParams,
    ) -> Result<Option<Vec<tower_lsp_server::ls_types::CodeActionOrCommand>>> {
        let actions = code_actions::handle_code_actions(Arc::clone(&self.state), params).await;
        Ok(Some(actions))
    }

    async fn diagnostic(
        &self,
        params: DocumentDiagnosticParams,
    ) -> Result<DocumentDiagnosticReportResult> {
        let uri = params.text_document.uri;
        let config = self.config.read().await;
        let items =
            diagnostics::handle_diagnostics(Arc::clone(&self.state), &uri, &config.diagnostics).await;

        Ok(DocumentDiagnosticReportResult::Report(
            DocumentDiagnosticReport::Full(RelatedFullDocumentDiagnosticReport {
                related_documents: None,
                full_document_diagnostic_report: FullDocumentDiagnosticReport {
                    result_id: None,
                    items,
                },
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_capabilities() {
        let caps = Backend::server_capabilities();
        assert!(caps.text_document_sync.is_some());
        assert!(caps.completion_provider.is_some());
        assert!(caps.hover_provider.is_some());
        assert!(caps.definition_provider.is_some());
        assert!(caps.references_provider.is_some());
        assert!(caps.code_action_provider.is_some());
        assert!(caps.workspace_symbol_provider.is_some());
        assert!(caps.diagnostic_provider.is_some());
    }

    #[tokio::test]
    async fn test_backend_creation() {
        let (_service, _socket) = tower_lsp_server::LspService::build(Backend::new).finish();
    }
}
