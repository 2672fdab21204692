//! aws_apigatewayv2_stage
//!
//! Stages are keyed remotely by API ID and stage name; the resource ID is
//! `api_id/name`.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OpContext, Plan, ProviderMeta, Resource};
use crate::aws::apigatewayv2::{
    AccessLogSettings, Api, ApiGatewayV2Api, ProtocolType, RouteSettings, StageInput,
};
use crate::aws::{arn, RemoteError};
use crate::reconcile::id::APIGATEWAYV2_STAGE;
use crate::reconcile::tags::{ignore_aws, reconcile_tags};
use crate::reconcile::TagSet;

const DEFAULT_STAGE: &str = "$default";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub api_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deployment_id: Option<String>,
    #[serde(default)]
    pub client_certificate_id: Option<String>,
    #[serde(default)]
    pub auto_deploy: bool,
    #[serde(default)]
    pub stage_variables: BTreeMap<String, String>,
    #[serde(default)]
    pub default_route_settings: Option<RouteSettings>,
    /// Keyed by route key, e.g. `GET /pets`
    #[serde(default)]
    pub route_settings: BTreeMap<String, RouteSettings>,
    #[serde(default)]
    pub access_log_settings: Option<AccessLogSettings>,
    #[serde(default)]
    pub tags: TagSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageState {
    pub id: String,
    pub api_id: String,
    pub name: String,
    pub arn: String,
    pub execution_arn: String,
    pub invoke_url: String,
    pub description: Option<String>,
    pub deployment_id: Option<String>,
    pub client_certificate_id: Option<String>,
    pub auto_deploy: bool,
    pub stage_variables: BTreeMap<String, String>,
    pub default_route_settings: Option<RouteSettings>,
    pub route_settings: BTreeMap<String, RouteSettings>,
    pub access_log_settings: Option<AccessLogSettings>,
    pub tags: TagSet,
    pub created_date: Option<DateTime<Utc>>,
    pub last_updated_date: Option<DateTime<Utc>>,
}

pub struct ApiGatewayV2Stage {
    client: Arc<dyn ApiGatewayV2Api>,
    meta: ProviderMeta,
}

impl ApiGatewayV2Stage {
    pub fn new(client: Arc<dyn ApiGatewayV2Api>, meta: ProviderMeta) -> Self {
        Self { client, meta }
    }

    fn arn(&self, api_id: &str, name: &str) -> String {
        arn(
            &self.meta.partition,
            "apigateway",
            &self.meta.region,
            "",
            &format!("/apis/{}/stages/{}", api_id, name),
        )
    }

    fn execution_arn(&self, api_id: &str, name: &str) -> String {
        arn(
            &self.meta.partition,
            "execute-api",
            &self.meta.region,
            self.meta.account_id.as_deref().unwrap_or_default(),
            &format!("{}/{}", api_id, name),
        )
    }

    fn input(config: &StageConfig) -> StageInput {
        StageInput {
            api_id: config.api_id.clone(),
            stage_name: config.name.clone(),
            description: config.description.clone(),
            deployment_id: config.deployment_id.clone(),
            client_certificate_id: config.client_certificate_id.clone(),
            auto_deploy: config.auto_deploy,
            stage_variables: config.stage_variables.clone(),
            default_route_settings: config.default_route_settings.clone(),
            route_settings: config.route_settings.clone(),
            access_log_settings: config.access_log_settings.clone(),
            tags: TagSet::new(),
        }
    }

    fn decode_id(id: &str) -> Result<(String, String)> {
        let mut parts = APIGATEWAYV2_STAGE.decode(id)?.into_iter();
        match (parts.next(), parts.next()) {
            (Some(api_id), Some(name)) => Ok((api_id, name)),
            _ => anyhow::bail!("Unexpected stage ID {:?}", id),
        }
    }
}

/// URL clients use to reach a stage
pub fn invoke_url(api: &Api, stage_name: &str) -> String {
    let endpoint = api.api_endpoint.trim_end_matches('/');
    match api.protocol_type {
        ProtocolType::Http if stage_name == DEFAULT_STAGE => format!("{}/", endpoint),
        _ => format!("{}/{}", endpoint, stage_name),
    }
}

#[async_trait]
impl Resource for ApiGatewayV2Stage {
    const TYPE_NAME: &'static str = "aws_apigatewayv2_stage";

    type Config = StageConfig;
    type State = StageState;

    async fn create(&self, _ctx: &OpContext, config: &StageConfig) -> Result<String> {
        let id = APIGATEWAYV2_STAGE.encode(&[&config.api_id, &config.name])?;

        let mut input = Self::input(config);
        input.tags = ignore_aws(&config.tags);
        self.client.create_stage(&input).await?;
        tracing::info!("Created API Gateway v2 stage {}", id);

        Ok(id)
    }

    async fn read(&self, id: &str) -> Result<Option<StageState>> {
        let (api_id, name) = Self::decode_id(id)?;

        let stage = match self.client.get_stage(&api_id, &name).await {
            Ok(stage) => stage,
            Err(RemoteError::NotFound(_)) => {
                tracing::warn!("API Gateway v2 stage {} not found, removing from state", id);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let api = self
            .client
            .get_api(&api_id)
            .await
            .with_context(|| format!("Error reading API Gateway v2 API ({})", api_id))?;

        Ok(Some(StageState {
            id: id.to_string(),
            arn: self.arn(&api_id, &name),
            execution_arn: self.execution_arn(&api_id, &name),
            invoke_url: invoke_url(&api, &name),
            api_id,
            name: stage.stage_name,
            description: stage.description,
            deployment_id: stage.deployment_id,
            client_certificate_id: stage.client_certificate_id,
            auto_deploy: stage.auto_deploy,
            stage_variables: stage.stage_variables,
            default_route_settings: stage.default_route_settings,
            route_settings: stage.route_settings,
            access_log_settings: stage.access_log_settings,
            tags: ignore_aws(&stage.tags),
            created_date: stage.created_date,
            last_updated_date: stage.last_updated_date,
        }))
    }

    async fn update(
        &self,
        _ctx: &OpContext,
        id: &str,
        old: &StageConfig,
        new: &StageConfig,
    ) -> Result<()> {
        let (api_id, name) = Self::decode_id(id)?;

        let mut settings_plan = Resource::plan(self, old, new);
        settings_plan.changed.retain(|field| *field != "tags");
        if !settings_plan.changed.is_empty() {
            self.client.update_stage(&Self::input(new)).await?;
        }

        if old.tags != new.tags {
            reconcile_tags(self.client.as_ref(), &self.arn(&api_id, &name), &new.tags)
                .await
                .context("Error updating tags")?;
        }
        Ok(())
    }

    async fn delete(&self, _ctx: &OpContext, id: &str) -> Result<()> {
        let (api_id, name) = Self::decode_id(id)?;
        match self.client.delete_stage(&api_id, &name).await {
            Ok(()) | Err(RemoteError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn import(&self, id: &str) -> Result<String> {
        let (api_id, name) = Self::decode_id(id)?;
        Ok(APIGATEWAYV2_STAGE.encode(&[api_id, name])?)
    }

    fn plan(&self, old: &StageConfig, new: &StageConfig) -> Plan {
        let mut plan = Plan::default();
        plan.force_new("api_id", &old.api_id, &new.api_id)
            .force_new("name", &old.name, &new.name)
            .field("description", &old.description, &new.description)
            .field("deployment_id", &old.deployment_id, &new.deployment_id)
            .field(
                "client_certificate_id",
                &old.client_certificate_id,
                &new.client_certificate_id,
            )
            .field("auto_deploy", &old.auto_deploy, &new.auto_deploy)
            .field("stage_variables", &old.stage_variables, &new.stage_variables)
            .field(
                "default_route_settings",
                &old.default_route_settings,
                &new.default_route_settings,
            )
            .field("route_settings", &old.route_settings, &new.route_settings)
            .field(
                "access_log_settings",
                &old.access_log_settings,
                &new.access_log_settings,
            )
            .field("tags", &old.tags, &new.tags);
        plan
    }
}
