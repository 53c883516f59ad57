//! # Connector Actions
//!
//! Prebuilt document/file storage connectors exposed as callable actions.
//! The pipeline treats each connector as an opaque invoker: a named action
//! with a fixed parameter schema goes in, JSON comes out, and nothing here
//! interprets the result.

pub mod docs;
pub mod drive;

pub use docs::google_docs_connector;
pub use drive::google_drive_connector;

use crate::{PipelineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One externally defined operation a connector can perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorAction {
    /// Action identifier, e.g. `CreateFolder`.
    pub name: String,
    /// Human-readable name for catalogs and UIs.
    pub display_name: String,
    /// JSON schema of the action's parameters.
    pub input_schema: Value,
}

impl ConnectorAction {
    /// Describe an action whose parameters are the schema of `P`.
    pub fn describe<P: schemars::JsonSchema>(name: &str, display_name: &str) -> Self {
        let schema = schemars::schema_for!(P);
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            input_schema: serde_json::to_value(schema).unwrap_or(Value::Null),
        }
    }
}

/// Where a connector lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Cloud project hosting the connection.
    pub project_id: String,
    /// Connection location, e.g. `eu-west1`.
    pub location: String,
    /// Connection name, e.g. `google-docs-connector`.
    pub connection: String,
}

impl ConnectorConfig {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        connection: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            connection: connection.into(),
        }
    }
}

/// An opaque remote action invoker.
#[async_trait]
pub trait ConnectorActionService: Send + Sync {
    /// Connection name this service fronts.
    fn connection(&self) -> &str;

    /// The catalog of actions this connector exposes.
    fn actions(&self) -> &[ConnectorAction];

    /// Invoke a cataloged action. Unknown action names are rejected with
    /// [`PipelineError::UnknownAction`]; transport failures surface as
    /// [`PipelineError::DelegatedService`].
    async fn invoke(&self, action: &str, parameters: Value) -> Result<Value>;
}

/// Executes connector actions against an Application Integration endpoint.
pub struct IntegrationConnector {
    config: ConnectorConfig,
    actions: Vec<ConnectorAction>,
    http: reqwest::Client,
    base_url: String,
}

impl IntegrationConnector {
    pub fn new(config: ConnectorConfig, actions: Vec<ConnectorAction>) -> Self {
        let base_url = format!(
            "https://{}-integrations.googleapis.com/v1",
            config.location
        );
        Self {
            config,
            actions,
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Override the endpoint (test servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn execute_url(&self) -> String {
        format!(
            "{}/projects/{}/locations/{}/connections/{}:executeAction",
            self.base_url, self.config.project_id, self.config.location, self.config.connection
        )
    }
}

#[async_trait]
impl ConnectorActionService for IntegrationConnector {
    fn connection(&self) -> &str {
        &self.config.connection
    }

    fn actions(&self) -> &[ConnectorAction] {
        &self.actions
    }

    async fn invoke(&self, action: &str, parameters: Value) -> Result<Value> {
        if !self.actions.iter().any(|a| a.name == action) {
            return Err(PipelineError::UnknownAction(action.to_string()));
        }

        tracing::debug!(connection = %self.config.connection, action, "invoking connector action");

        let response = self
            .http
            .post(self.execute_url())
            .json(&serde_json::json!({ "action": action, "parameters": parameters }))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
