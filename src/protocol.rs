//! LSP method-name constants.
//!
//! These are the stable string identifiers used as map keys throughout the
//! dispatcher (`on_request("textDocument/hover", ...)` and friends). They
//! carry no behavior of their own — the full request/response payload
//! shapes for each method live in the `lsp-types` crate, not here.

/// Lifecycle methods: establishing, confirming, and tearing down a session.
pub mod lifecycle {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "initialized";
    pub const SHUTDOWN: &str = "shutdown";
    pub const EXIT: &str = "exit";
    pub const SET_TRACE: &str = "$/setTrace";
    pub const LOG_TRACE: &str = "$/logTrace";
}

/// `textDocument/*` methods: synchronization and language features scoped
/// to a single document.
pub mod text_document {
    // Synchronization
    pub const DID_OPEN: &str = "textDocument/didOpen";
    pub const DID_CHANGE: &str = "textDocument/didChange";
    pub const DID_CLOSE: &str = "textDocument/didClose";
    pub const DID_SAVE: &str = "textDocument/didSave";
    pub const WILL_SAVE: &str = "textDocument/willSave";
    pub const WILL_SAVE_WAIT_UNTIL: &str = "textDocument/willSaveWaitUntil";

    // Language features
    pub const COMPLETION: &str = "textDocument/completion";
    pub const COMPLETION_ITEM_RESOLVE: &str = "completionItem/resolve";
    pub const HOVER: &str = "textDocument/hover";
    pub const SIGNATURE_HELP: &str = "textDocument/signatureHelp";
    pub const DECLARATION: &str = "textDocument/declaration";
    pub const DEFINITION: &str = "textDocument/definition";
    pub const TYPE_DEFINITION: &str = "textDocument/typeDefinition";
    pub const IMPLEMENTATION: &str = "textDocument/implementation";
    pub const REFERENCES: &str = "textDocument/references";
    pub const DOCUMENT_HIGHLIGHT: &str = "textDocument/documentHighlight";
    pub const DOCUMENT_SYMBOL: &str = "textDocument/documentSymbol";
    pub const CODE_ACTION: &str = "textDocument/codeAction";
    pub const CODE_LENS: &str = "textDocument/codeLens";
    pub const CODE_LENS_RESOLVE: &str = "codeLens/resolve";
    pub const DOCUMENT_LINK: &str = "textDocument/documentLink";
    pub const DOCUMENT_LINK_RESOLVE: &str = "documentLink/resolve";
    pub const DOCUMENT_COLOR: &str = "textDocument/documentColor";
    pub const COLOR_PRESENTATION: &str = "textDocument/colorPresentation";
    pub const FORMATTING: &str = "textDocument/formatting";
    pub const RANGE_FORMATTING: &str = "textDocument/rangeFormatting";
    pub const ON_TYPE_FORMATTING: &str = "textDocument/onTypeFormatting";
    pub const RENAME: &str = "textDocument/rename";
    pub const PREPARE_RENAME: &str = "textDocument/prepareRename";
    pub const FOLDING_RANGE: &str = "textDocument/foldingRange";
    pub const SELECTION_RANGE: &str = "textDocument/selectionRange";
    pub const SEMANTIC_TOKENS_FULL: &str = "textDocument/semanticTokens/full";
    pub const SEMANTIC_TOKENS_FULL_DELTA: &str = "textDocument/semanticTokens/full/delta";
    pub const SEMANTIC_TOKENS_RANGE: &str = "textDocument/semanticTokens/range";
    pub const PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";
    pub const DIAGNOSTIC: &str = "textDocument/diagnostic";
    pub const INLAY_HINT: &str = "textDocument/inlayHint";
    pub const INLAY_HINT_RESOLVE: &str = "inlayHint/resolve";
    pub const LINKED_EDITING_RANGE: &str = "textDocument/linkedEditingRange";
    pub const MONIKER: &str = "textDocument/moniker";
    pub const PREPARE_CALL_HIERARCHY: &str = "textDocument/prepareCallHierarchy";
    pub const PREPARE_TYPE_HIERARCHY: &str = "textDocument/prepareTypeHierarchy";
}

/// `callHierarchy/*` and `typeHierarchy/*` expansion methods.
pub mod hierarchy {
    pub const CALL_HIERARCHY_INCOMING_CALLS: &str = "callHierarchy/incomingCalls";
    pub const CALL_HIERARCHY_OUTGOING_CALLS: &str = "callHierarchy/outgoingCalls";
    pub const TYPE_HIERARCHY_SUPERTYPES: &str = "typeHierarchy/supertypes";
    pub const TYPE_HIERARCHY_SUBTYPES: &str = "typeHierarchy/subtypes";
}

/// `workspace/*` methods: multi-document and project-wide operations.
pub mod workspace {
    pub const DID_CHANGE_CONFIGURATION: &str = "workspace/didChangeConfiguration";
    pub const DID_CHANGE_WATCHED_FILES: &str = "workspace/didChangeWatchedFiles";
    pub const DID_CHANGE_WORKSPACE_FOLDERS: &str = "workspace/didChangeWorkspaceFolders";
    pub const SYMBOL: &str = "workspace/symbol";
    pub const SYMBOL_RESOLVE: &str = "workspaceSymbol/resolve";
    pub const EXECUTE_COMMAND: &str = "workspace/executeCommand";
    pub const APPLY_EDIT: &str = "workspace/applyEdit";
    pub const WORKSPACE_FOLDERS: &str = "workspace/workspaceFolders";
    pub const CONFIGURATION: &str = "workspace/configuration";
    pub const WILL_CREATE_FILES: &str = "workspace/willCreateFiles";
    pub const DID_CREATE_FILES: &str = "workspace/didCreateFiles";
    pub const WILL_RENAME_FILES: &str = "workspace/willRenameFiles";
    pub const DID_RENAME_FILES: &str = "workspace/didRenameFiles";
    pub const WILL_DELETE_FILES: &str = "workspace/willDeleteFiles";
    pub const DID_DELETE_FILES: &str = "workspace/didDeleteFiles";
    pub const DIAGNOSTIC: &str = "workspace/diagnostic";
    pub const DIAGNOSTIC_REFRESH: &str = "workspace/diagnostic/refresh";
    pub const CODE_LENS_REFRESH: &str = "workspace/codeLens/refresh";
    pub const INLAY_HINT_REFRESH: &str = "workspace/inlayHint/refresh";
    pub const SEMANTIC_TOKENS_REFRESH: &str = "workspace/semanticTokens/refresh";
}

/// `window/*` methods: server-initiated client UI requests.
pub mod window {
    pub const SHOW_MESSAGE: &str = "window/showMessage";
    pub const SHOW_MESSAGE_REQUEST: &str = "window/showMessageRequest";
    pub const LOG_MESSAGE: &str = "window/logMessage";
    pub const WORK_DONE_PROGRESS_CREATE: &str = "window/workDoneProgress/create";
    pub const WORK_DONE_PROGRESS_CANCEL: &str = "window/workDoneProgress/cancel";
    pub const SHOW_DOCUMENT: &str = "window/showDocument";
}

/// `client/*` methods: capability negotiation callbacks.
pub mod client {
    pub const REGISTER_CAPABILITY: &str = "client/registerCapability";
    pub const UNREGISTER_CAPABILITY: &str = "client/unregisterCapability";
}

/// `$/*` meta methods, not tied to any single feature area.
pub mod meta {
    pub const CANCEL_REQUEST: &str = "$/cancelRequest";
    pub const PROGRESS: &str = "$/progress";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_method_matches_dispatcher_constant() {
        assert_eq!(meta::CANCEL_REQUEST, "$/cancelRequest");
    }

    #[test]
    fn method_names_are_namespaced_as_the_protocol_defines() {
        assert!(text_document::HOVER.starts_with("textDocument/"));
        assert!(workspace::SYMBOL.starts_with("workspace/"));
        assert!(window::SHOW_MESSAGE.starts_with("window/"));
        assert!(lifecycle::INITIALIZE == "initialize");
    }
}
