//! File storage connector: folder creation and file upload.

use super::{ConnectorAction, ConnectorConfig, IntegrationConnector};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for `CreateFolder`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateFolderParams {
    /// Name of the folder to create.
    pub name: String,
    /// Parent folder id; root when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<String>,
}

/// Parameters for `UploadFile`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadFileParams {
    pub file_name: String,
    /// UTF-8 file content.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

/// Prebuilt file storage connector with its action catalog.
pub fn google_drive_connector(config: ConnectorConfig) -> IntegrationConnector {
    IntegrationConnector::new(
        config,
        vec![
            ConnectorAction::describe::<CreateFolderParams>("CreateFolder", "Create Folder"),
            ConnectorAction::describe::<UploadFileParams>("UploadFile", "Upload File"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::ConnectorActionService;
    use crate::PipelineError;

    #[test]
    fn test_catalog() {
        let connector = google_drive_connector(ConnectorConfig::new(
            "proj",
            "eu-west1",
            "google-drive-connector",
        ));
        let names: Vec<_> = connector.actions().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["CreateFolder", "UploadFile"]);
    }

    #[tokio::test]
    async fn test_uncataloged_drive_action_rejected() {
        let connector = google_drive_connector(ConnectorConfig::new(
            "proj",
            "eu-west1",
            "google-drive-connector",
        ));
        let err = connector
            .invoke("MoveToTrash", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownAction(_)));
    }

    #[test]
    fn test_optional_parent_omitted() {
        let params = CreateFolderParams {
            name: "reports".into(),
            parent_folder_id: None,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert!(json.get("parent_folder_id").is_none());
    }
}
