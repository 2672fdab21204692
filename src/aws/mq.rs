//! Amazon MQ client seam
//!
//! Configuration data travels base64 encoded, as the service expects it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tagging::TaggingApi;
use super::RemoteError;
use crate::reconcile::TagSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateConfigurationInput {
    pub name: String,
    pub engine_type: String,
    pub engine_version: String,
    pub tags: TagSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRevision {
    pub revision: i32,
    pub description: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub engine_type: String,
    pub engine_version: String,
    pub latest_revision: ConfigurationRevision,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfigurationInput {
    pub configuration_id: String,
    /// Base64-encoded XML
    pub data: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionData {
    pub configuration_id: String,
    pub revision: i32,
    /// Base64-encoded XML
    pub data: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait MqApi: TaggingApi {
    async fn create_configuration(
        &self,
        input: &CreateConfigurationInput,
    ) -> Result<Configuration, RemoteError>;

    async fn describe_configuration(
        &self,
        configuration_id: &str,
    ) -> Result<Configuration, RemoteError>;

    async fn describe_configuration_revision(
        &self,
        configuration_id: &str,
        revision: i32,
    ) -> Result<RevisionData, RemoteError>;

    /// Writes a new revision
    async fn update_configuration(
        &self,
        input: &UpdateConfigurationInput,
    ) -> Result<ConfigurationRevision, RemoteError>;
}
