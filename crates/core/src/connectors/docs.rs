//! Document storage connector: read and batch-update documents.

use super::{ConnectorAction, ConnectorConfig, IntegrationConnector};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for `GetDocument`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetDocumentParams {
    /// Identifier of the document to fetch.
    pub document_id: String,
}

/// One edit request inside a `BatchUpdateDocument` call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentEdit {
    /// Zero-based insertion index.
    pub index: u64,
    /// Text to insert at the index.
    pub text: String,
}

/// Parameters for `BatchUpdateDocument`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchUpdateDocumentParams {
    pub document_id: String,
    pub edits: Vec<DocumentEdit>,
}

/// Prebuilt document storage connector with its action catalog.
pub fn google_docs_connector(config: ConnectorConfig) -> IntegrationConnector {
    IntegrationConnector::new(
        config,
        vec![
            ConnectorAction::describe::<GetDocumentParams>("GetDocument", "Get Document"),
            ConnectorAction::describe::<BatchUpdateDocumentParams>(
                "BatchUpdateDocument",
                "Batch Update Document",
            ),
        ],
    )
}
