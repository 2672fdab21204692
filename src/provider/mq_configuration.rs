//! aws_mq_configuration
//!
//! Every data or description change writes a new configuration revision.
//! The broker XML is compared structurally so reformatting alone does not
//! produce a revision.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{OpContext, Plan, Resource};
use crate::aws::mq::{CreateConfigurationInput, MqApi, UpdateConfigurationInput};
use crate::aws::tagging::TaggingApi;
use crate::aws::RemoteError;
use crate::reconcile::tags::{ignore_aws, reconcile_tags};
use crate::reconcile::{xml, TagSet};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqConfigurationConfig {
    pub name: String,
    pub engine_type: String,
    pub engine_version: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Broker configuration XML
    pub data: String,
    #[serde(default)]
    pub tags: TagSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MqConfigurationState {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub engine_type: String,
    pub engine_version: String,
    pub description: Option<String>,
    pub data: String,
    pub latest_revision: i32,
    pub tags: TagSet,
}

pub struct MqConfiguration {
    client: Arc<dyn MqApi>,
}

impl MqConfiguration {
    pub fn new(client: Arc<dyn MqApi>) -> Self {
        Self { client }
    }

    async fn write_revision(&self, id: &str, config: &MqConfigurationConfig) -> Result<()> {
        let input = UpdateConfigurationInput {
            configuration_id: id.to_string(),
            data: STANDARD.encode(config.data.as_bytes()),
            description: config.description.clone(),
        };
        let revision = self.client.update_configuration(&input).await?;
        tracing::info!("MQ Configuration {} now at revision {}", id, revision.revision);
        Ok(())
    }
}

#[async_trait]
impl Resource for MqConfiguration {
    const TYPE_NAME: &'static str = "aws_mq_configuration";

    type Config = MqConfigurationConfig;
    type State = MqConfigurationState;

    async fn create(&self, _ctx: &OpContext, config: &MqConfigurationConfig) -> Result<String> {
        let input = CreateConfigurationInput {
            name: config.name.clone(),
            engine_type: config.engine_type.clone(),
            engine_version: config.engine_version.clone(),
            tags: ignore_aws(&config.tags),
        };

        let created = self.client.create_configuration(&input).await?;
        tracing::info!("Created MQ Configuration {}", created.id);

        // The create call carries no data; the first real revision comes from an update
        self.write_revision(&created.id, config).await?;
        Ok(created.id)
    }

    async fn read(&self, id: &str) -> Result<Option<MqConfigurationState>> {
        let configuration = match self.client.describe_configuration(id).await {
            Ok(c) => c,
            Err(RemoteError::NotFound(_)) => {
                tracing::warn!("MQ Configuration {:?} not found, removing from state", id);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let revision = configuration.latest_revision.revision;
        let revision_data = self
            .client
            .describe_configuration_revision(id, revision)
            .await
            .with_context(|| {
                format!("Error reading MQ Configuration ({}) revision {}", id, revision)
            })?;

        let raw = STANDARD
            .decode(revision_data.data.as_bytes())
            .context("MQ Configuration data is not valid base64")?;
        let data = String::from_utf8(raw).context("MQ Configuration data is not valid UTF-8")?;

        let tags = self
            .client
            .list_tags(&configuration.arn)
            .await
            .with_context(|| format!("Error listing tags for MQ Configuration ({})", id))?;

        Ok(Some(MqConfigurationState {
            id: configuration.id,
            arn: configuration.arn,
            name: configuration.name,
            engine_type: configuration.engine_type,
            engine_version: configuration.engine_version,
            description: configuration.latest_revision.description,
            data,
            latest_revision: revision,
            tags: ignore_aws(&tags),
        }))
    }

    async fn update(
        &self,
        _ctx: &OpContext,
        id: &str,
        old: &MqConfigurationConfig,
        new: &MqConfigurationConfig,
    ) -> Result<()> {
        let plan = Resource::plan(self, old, new);
        if plan.has_change("data") || plan.has_change("description") {
            self.write_revision(id, new).await?;
        }

        if plan.has_change("tags") {
            let arn = self.client.describe_configuration(id).await?.arn;
            reconcile_tags(self.client.as_ref(), &arn, &new.tags)
                .await
                .with_context(|| format!("Error updating MQ Configuration ({}) tags", arn))?;
        }
        Ok(())
    }

    async fn delete(&self, _ctx: &OpContext, id: &str) -> Result<()> {
        tracing::warn!(
            "MQ Configuration {} cannot be deleted remotely, removing from state only",
            id
        );
        Ok(())
    }

    fn plan(&self, old: &MqConfigurationConfig, new: &MqConfigurationConfig) -> Plan {
        let mut plan = Plan::default();
        plan.force_new("name", &old.name, &new.name)
            .force_new("engine_type", &old.engine_type, &new.engine_type)
            .force_new("engine_version", &old.engine_version, &new.engine_version)
            .field("description", &old.description, &new.description)
            .suppressible("data", &old.data, &new.data, xml::equivalent)
            .field("tags", &old.tags, &new.tags);

        if plan.has_change("description") || plan.has_change("data") {
            plan.recompute("latest_revision");
        }
        plan
    }
}
