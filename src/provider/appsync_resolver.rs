//! aws_appsync_resolver
//!
//! A resolver is either a UNIT resolver bound to one data source or a
//! PIPELINE resolver calling a list of functions. Its ID is
//! `api_id-type_name-field_name`.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{GraphQlName, OpContext, Plan, Resource};
use crate::aws::appsync::{AppSyncApi, ResolverInput, ResolverKind};
use crate::aws::RemoteError;
use crate::reconcile::id::APPSYNC_RESOLVER;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Function IDs in call order
    pub functions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSyncResolverConfig {
    pub api_id: String,
    pub type_name: GraphQlName,
    pub field_name: GraphQlName,
    #[serde(default)]
    pub datasource_name: Option<GraphQlName>,
    pub request_mapping_template: String,
    pub response_mapping_template: String,
    #[serde(default)]
    pub pipeline_config: Option<PipelineConfig>,
}

impl AppSyncResolverConfig {
    pub fn kind(&self) -> ResolverKind {
        if self.pipeline_config.is_some() {
            ResolverKind::Pipeline
        } else {
            ResolverKind::Unit
        }
    }

    fn input(&self) -> ResolverInput {
        ResolverInput {
            api_id: self.api_id.clone(),
            type_name: self.type_name.to_string(),
            field_name: self.field_name.to_string(),
            data_source_name: self.datasource_name.as_ref().map(|n| n.to_string()),
            kind: self.kind(),
            pipeline_functions: self.pipeline_config.as_ref().map(|p| p.functions.clone()),
            request_mapping_template: self.request_mapping_template.clone(),
            response_mapping_template: self.response_mapping_template.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSyncResolverState {
    pub id: String,
    pub arn: String,
    pub api_id: String,
    pub type_name: String,
    pub field_name: String,
    pub datasource_name: Option<String>,
    pub kind: ResolverKind,
    pub pipeline_config: Option<PipelineConfig>,
    pub request_mapping_template: String,
    pub response_mapping_template: String,
}

pub struct AppSyncResolver {
    client: Arc<dyn AppSyncApi>,
}

impl AppSyncResolver {
    pub fn new(client: Arc<dyn AppSyncApi>) -> Self {
        Self { client }
    }

    fn decode_id(id: &str) -> Result<(String, String, String)> {
        let mut parts = APPSYNC_RESOLVER.decode(id)?.into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(api_id), Some(type_name), Some(field_name)) => {
                Ok((api_id, type_name, field_name))
            }
            _ => anyhow::bail!(
                "expected ID in format {}, received: {}",
                APPSYNC_RESOLVER.format(),
                id
            ),
        }
    }
}

#[async_trait]
impl Resource for AppSyncResolver {
    const TYPE_NAME: &'static str = "aws_appsync_resolver";

    type Config = AppSyncResolverConfig;
    type State = AppSyncResolverState;

    fn validate(config: &AppSyncResolverConfig) -> Result<()> {
        if config.datasource_name.is_some() && config.pipeline_config.is_some() {
            anyhow::bail!("datasource_name conflicts with pipeline_config");
        }
        Ok(())
    }

    async fn create(&self, _ctx: &OpContext, config: &AppSyncResolverConfig) -> Result<String> {
        let id = APPSYNC_RESOLVER.encode(&[
            config.api_id.as_str(),
            config.type_name.as_str(),
            config.field_name.as_str(),
        ])?;

        self.client.create_resolver(&config.input()).await?;
        tracing::info!("Created AppSync Resolver {}", id);
        Ok(id)
    }

    async fn read(&self, id: &str) -> Result<Option<AppSyncResolverState>> {
        let (api_id, type_name, field_name) = Self::decode_id(id)?;

        let resolver = match self
            .client
            .get_resolver(&api_id, &type_name, &field_name)
            .await
        {
            Ok(r) => r,
            Err(RemoteError::NotFound(_)) => {
                tracing::warn!("AppSync Resolver {:?} not found, removing from state", id);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(AppSyncResolverState {
            id: id.to_string(),
            arn: resolver.resolver_arn,
            api_id,
            type_name: resolver.type_name,
            field_name: resolver.field_name,
            datasource_name: resolver.data_source_name,
            kind: resolver.kind,
            pipeline_config: resolver
                .pipeline_functions
                .map(|functions| PipelineConfig { functions }),
            request_mapping_template: resolver.request_mapping_template,
            response_mapping_template: resolver.response_mapping_template,
        }))
    }

    async fn update(
        &self,
        _ctx: &OpContext,
        _id: &str,
        _old: &AppSyncResolverConfig,
        new: &AppSyncResolverConfig,
    ) -> Result<()> {
        self.client.update_resolver(&new.input()).await?;
        Ok(())
    }

    async fn delete(&self, _ctx: &OpContext, id: &str) -> Result<()> {
        let (api_id, type_name, field_name) = Self::decode_id(id)?;
        match self
            .client
            .delete_resolver(&api_id, &type_name, &field_name)
            .await
        {
            Ok(()) | Err(RemoteError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn import(&self, id: &str) -> Result<String> {
        Self::decode_id(id)?;
        Ok(id.to_string())
    }

    fn plan(&self, old: &AppSyncResolverConfig, new: &AppSyncResolverConfig) -> Plan {
        let mut plan = Plan::default();
        plan.force_new("api_id", &old.api_id, &new.api_id)
            .force_new("type_name", &old.type_name, &new.type_name)
            .force_new("field_name", &old.field_name, &new.field_name)
            .field("datasource_name", &old.datasource_name, &new.datasource_name)
            .field(
                "request_mapping_template",
                &old.request_mapping_template,
                &new.request_mapping_template,
            )
            .field(
                "response_mapping_template",
                &old.response_mapping_template,
                &new.response_mapping_template,
            )
            .field("pipeline_config", &old.pipeline_config, &new.pipeline_config);
        if old.kind() != new.kind() {
            plan.recompute("kind");
        }
        plan
    }
}
