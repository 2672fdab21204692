//! aws_appsync_function

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{GraphQlName, OpContext, Plan, Resource};
use crate::aws::appsync::{AppSyncApi, FunctionInput, FUNCTION_VERSION};
use crate::aws::RemoteError;
use crate::reconcile::id::APPSYNC_FUNCTION;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSyncFunctionConfig {
    pub api_id: String,
    pub name: String,
    pub datasource_name: GraphQlName,
    #[serde(default)]
    pub description: Option<String>,
    pub request_mapping_template: String,
    pub response_mapping_template: String,
}

impl AppSyncFunctionConfig {
    fn input(&self, function_id: Option<String>) -> FunctionInput {
        FunctionInput {
            api_id: self.api_id.clone(),
            function_id,
            name: self.name.clone(),
            data_source_name: self.datasource_name.to_string(),
            description: self.description.clone(),
            function_version: FUNCTION_VERSION.to_string(),
            request_mapping_template: self.request_mapping_template.clone(),
            response_mapping_template: self.response_mapping_template.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSyncFunctionState {
    pub id: String,
    pub arn: String,
    pub api_id: String,
    pub function_id: String,
    pub name: String,
    pub datasource_name: String,
    pub description: Option<String>,
    pub function_version: String,
    pub request_mapping_template: String,
    pub response_mapping_template: String,
}

pub struct AppSyncFunction {
    client: Arc<dyn AppSyncApi>,
}

impl AppSyncFunction {
    pub fn new(client: Arc<dyn AppSyncApi>) -> Self {
        Self { client }
    }

    fn decode_id(id: &str) -> Result<(String, String)> {
        let mut parts = APPSYNC_FUNCTION.decode(id)?.into_iter();
        match (parts.next(), parts.next()) {
            (Some(api_id), Some(function_id)) => Ok((api_id, function_id)),
            _ => anyhow::bail!(
                "expected ID in format {}, received: {}",
                APPSYNC_FUNCTION.format(),
                id
            ),
        }
    }
}

#[async_trait]
impl Resource for AppSyncFunction {
    const TYPE_NAME: &'static str = "aws_appsync_function";

    type Config = AppSyncFunctionConfig;
    type State = AppSyncFunctionState;

    async fn create(&self, _ctx: &OpContext, config: &AppSyncFunctionConfig) -> Result<String> {
        let function = self.client.create_function(&config.input(None)).await?;
        let id = APPSYNC_FUNCTION.encode(&[&config.api_id, &function.function_id])?;
        tracing::info!("Created AppSync Function {}", id);
        Ok(id)
    }

    async fn read(&self, id: &str) -> Result<Option<AppSyncFunctionState>> {
        let (api_id, function_id) = Self::decode_id(id)?;

        let function = match self.client.get_function(&api_id, &function_id).await {
            Ok(f) => f,
            Err(RemoteError::NotFound(_)) => {
                tracing::warn!("AppSync Function {:?} not found, removing from state", id);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(AppSyncFunctionState {
            id: id.to_string(),
            arn: function.function_arn,
            api_id,
            function_id: function.function_id,
            name: function.name,
            datasource_name: function.data_source_name,
            description: function.description,
            function_version: function.function_version,
            request_mapping_template: function.request_mapping_template,
            response_mapping_template: function.response_mapping_template,
        }))
    }

    async fn update(
        &self,
        _ctx: &OpContext,
        id: &str,
        _old: &AppSyncFunctionConfig,
        new: &AppSyncFunctionConfig,
    ) -> Result<()> {
        let (_, function_id) = Self::decode_id(id)?;
        self.client.update_function(&new.input(Some(function_id))).await?;
        Ok(())
    }

    async fn delete(&self, _ctx: &OpContext, id: &str) -> Result<()> {
        let (api_id, function_id) = Self::decode_id(id)?;
        match self.client.delete_function(&api_id, &function_id).await {
            Ok(()) | Err(RemoteError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn import(&self, id: &str) -> Result<String> {
        Self::decode_id(id)?;
        Ok(id.to_string())
    }

    fn plan(&self, old: &AppSyncFunctionConfig, new: &AppSyncFunctionConfig) -> Plan {
        let mut plan = Plan::default();
        plan.force_new("api_id", &old.api_id, &new.api_id)
            .field("name", &old.name, &new.name)
            .field("datasource_name", &old.datasource_name, &new.datasource_name)
            .field("description", &old.description, &new.description)
            .field(
                "request_mapping_template",
                &old.request_mapping_template,
                &new.request_mapping_template,
            )
            .field(
                "response_mapping_template",
                &old.response_mapping_template,
                &new.response_mapping_template,
            );
        plan
    }
}
