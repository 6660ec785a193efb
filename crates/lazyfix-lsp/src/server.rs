use crate::config::LazyfixConfig;
use crate::document::ServerState;
use crate::handlers::{code_action_resolve, code_actions, execute_command};
use crate::providers::default_registry;
use lazyfix_core::{Document, ProviderRegistry, RUN_CODE_ACTION_COMMAND, Resolver};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::ls_types::{
    CodeAction, CodeActionKind, CodeActionOptions, CodeActionParams, CodeActionProviderCapability,
    CodeActionResponse, DidChangeConfigurationParams, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, ExecuteCommandOptions,
    ExecuteCommandParams, InitializeParams, InitializeResult, InitializedParams, MessageType,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use tower_lsp_server::{Client, LanguageServer};

pub struct Backend {
    client: Client,
    state: Arc<ServerState>,
    config: Arc<RwLock<LazyfixConfig>>,
    registry: Arc<ProviderRegistry>,
    /// Parent of every request's cancellation token
    shutdown_token: CancellationToken,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self::with_registry(client, default_registry())
    }

    /// Backend serving the actions of `registry` instead of the built-in ones.
    pub fn with_registry(client: Client, registry: ProviderRegistry) -> Self {
        Self {
            client,
            state: Arc::new(ServerState::new()),
            config: Arc::new(RwLock::new(LazyfixConfig::default())),
            registry: Arc::new(registry),
            shutdown_token: CancellationToken::new(),
        }
    }

    fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(
                TextDocumentSyncKind::INCREMENTAL,
            )),
            code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
                code_action_kinds: Some(vec![
                    CodeActionKind::SOURCE,
                    CodeActionKind::SOURCE_FIX_ALL,
                    CodeActionKind::REFACTOR_REWRITE,
                    CodeActionKind::REFACTOR_EXTRACT,
                ]),
                resolve_provider: Some(true),
                ..Default::default()
            })),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: vec![RUN_CODE_ACTION_COMMAND.into()],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Resolver for one request, configured from the current settings.
    async fn resolver(&self) -> Resolver {
        let options = self.config.read().await.resolve.options();
        Resolver::new(Arc::clone(&self.registry)).with_options(options)
    }
}

impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("initializing lazyfix-lsp server");

        if let Some(init_options) = params.initialization_options
            && let Some(config) = LazyfixConfig::from_settings(init_options)
        {
            tracing::debug!("loaded configuration: {:?}", config);
            *self.config.write().await = config;
        }

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "lazyfix-lsp".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("lazyfix-lsp server initialized");
        self.client
            .log_message(MessageType::INFO, "lazyfix-lsp ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("shutting down lazyfix-lsp server");
        self.shutdown_token.cancel();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        tracing::info!("document opened: {}", item.uri.as_str());

        let kind = self.config.read().await.documents.kind_of(&item.uri);
        let document = Document::new(item.uri, item.language_id, item.text)
            .with_version(item.version)
            .with_kind(kind);
        self.state.open_document(document);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if !self
            .state
            .change_document(&uri, params.text_document.version, params.content_changes)
        {
            tracing::warn!("change for document that is not open: {}", uri.as_str());
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("document closed: {}", uri.as_str());
        self.state.close_document(&uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let Some(config) = LazyfixConfig::from_settings(params.settings) else {
            return;
        };
        tracing::info!("configuration changed");
        self.state.reclassify(&config.documents);
        *self.config.write().await = config;
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let resolver = self.resolver().await;
        Ok(Some(
            code_actions::handle_code_actions(Arc::clone(&self.state), &resolver, params).await,
        ))
    }

    async fn code_action_resolve(&self, action: CodeAction) -> Result<CodeAction> {
        let resolver = self.resolver().await;
        let token = self.shutdown_token.child_token();
        let _guard = token.clone().drop_guard();

        code_action_resolve::handle_code_action_resolve(
            Arc::clone(&self.state),
            &resolver,
            action,
            &token,
        )
        .await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        let resolver = self.resolver().await;
        let token = self.shutdown_token.child_token();
        let _guard = token.clone().drop_guard();

        let plan =
            execute_command::plan_command(Arc::clone(&self.state), &resolver, &params, &token)
                .await?;
        if plan.is_empty() {
            tracing::debug!("{} produced nothing to apply", params.command);
        }
        execute_command::carry_out(&self.client, plan).await;
        Ok(None)
    }
}
