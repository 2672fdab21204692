//! Resource Registry - explicit table of adapters
//!
//! The registry is built once at startup from the adapters handed to it and
//! passed to whoever drives the resources. Configurations and states cross
//! this boundary as JSON; each adapter decodes them into its own typed
//! structs, so invalid values are rejected before any remote call.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{
    ApiGatewayV2Stage, AppSyncFunction, AppSyncResolver, MqConfiguration, OpContext, Plan,
    ProviderMeta, Resource, VpcLink,
};
use crate::aws::apigatewayv2::ApiGatewayV2Api;
use crate::aws::appsync::AppSyncApi;
use crate::aws::mq::MqApi;

/// Outcome of a create, update or import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied {
    pub id: String,
    pub state: Value,
}

/// Object-safe view of a [`Resource`]
#[async_trait]
pub trait DynResource: Send + Sync {
    fn type_name(&self) -> &'static str;
    async fn create(&self, ctx: &OpContext, config: &Value) -> Result<Applied>;
    async fn read(&self, id: &str) -> Result<Option<Value>>;
    async fn update(&self, ctx: &OpContext, id: &str, old: &Value, new: &Value) -> Result<Applied>;
    async fn delete(&self, ctx: &OpContext, id: &str) -> Result<()>;
    async fn import(&self, id: &str) -> Result<Applied>;
    fn plan(&self, old: &Value, new: &Value) -> Result<Plan>;
}

fn decode<R: Resource>(config: &Value) -> Result<R::Config> {
    let config: R::Config = serde_json::from_value(config.clone())
        .with_context(|| format!("Invalid configuration for {}", R::TYPE_NAME))?;
    R::validate(&config).with_context(|| format!("Invalid configuration for {}", R::TYPE_NAME))?;
    Ok(config)
}

async fn read_state<R: Resource>(resource: &R, id: &str) -> Result<Option<Value>> {
    match Resource::read(resource, id).await? {
        Some(state) => Ok(Some(serde_json::to_value(state)?)),
        None => Ok(None),
    }
}

async fn read_existing<R: Resource>(resource: &R, id: &str, after: &str) -> Result<Applied> {
    let state = read_state(resource, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("{} {} not found after {}", R::TYPE_NAME, id, after))?;
    Ok(Applied {
        id: id.to_string(),
        state,
    })
}

#[async_trait]
impl<R: Resource> DynResource for R {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    async fn create(&self, ctx: &OpContext, config: &Value) -> Result<Applied> {
        let config = decode::<R>(config)?;
        tracing::info!("Creating {}", R::TYPE_NAME);
        let id = Resource::create(self, ctx, &config)
            .await
            .with_context(|| format!("Error creating {}", R::TYPE_NAME))?;
        read_existing(self, &id, "create").await
    }

    async fn read(&self, id: &str) -> Result<Option<Value>> {
        read_state(self, id)
            .await
            .with_context(|| format!("Error reading {} ({})", R::TYPE_NAME, id))
    }

    async fn update(&self, ctx: &OpContext, id: &str, old: &Value, new: &Value) -> Result<Applied> {
        let old = decode::<R>(old)?;
        let new = decode::<R>(new)?;
        let plan = Resource::plan(self, &old, &new);

        if plan.requires_replacement() {
            anyhow::bail!(
                "Changing {} on {} ({}) requires replacement",
                plan.replace.join(", "),
                R::TYPE_NAME,
                id
            );
        }

        if plan.is_empty() {
            tracing::debug!("No changes for {} ({})", R::TYPE_NAME, id);
        } else {
            tracing::info!("Updating {} ({}): {}", R::TYPE_NAME, id, plan.changed.join(", "));
            Resource::update(self, ctx, id, &old, &new)
                .await
                .with_context(|| format!("Error updating {} ({})", R::TYPE_NAME, id))?;
        }
        read_existing(self, id, "update").await
    }

    async fn delete(&self, ctx: &OpContext, id: &str) -> Result<()> {
        tracing::info!("Deleting {} ({})", R::TYPE_NAME, id);
        Resource::delete(self, ctx, id)
            .await
            .with_context(|| format!("Error deleting {} ({})", R::TYPE_NAME, id))
    }

    async fn import(&self, id: &str) -> Result<Applied> {
        let id = Resource::import(self, id)
            .with_context(|| format!("Cannot import {} from {:?}", R::TYPE_NAME, id))?;
        read_existing(self, &id, "import").await
    }

    fn plan(&self, old: &Value, new: &Value) -> Result<Plan> {
        Ok(Resource::plan(self, &decode::<R>(old)?, &decode::<R>(new)?))
    }
}

/// Table of adapters keyed by resource type
pub struct Registry {
    resources: BTreeMap<&'static str, Box<dyn DynResource>>,
}

#[derive(Default)]
pub struct RegistryBuilder {
    resources: Vec<Box<dyn DynResource>>,
}

impl RegistryBuilder {
    pub fn register<R: Resource>(mut self, resource: R) -> Self {
        self.resources.push(Box::new(resource));
        self
    }

    pub fn build(self) -> Result<Registry> {
        let mut resources = BTreeMap::new();
        for resource in self.resources {
            let name = resource.type_name();
            if resources.insert(name, resource).is_some() {
                anyhow::bail!("Resource type {} registered twice", name);
            }
        }
        Ok(Registry { resources })
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, type_name: &str) -> Option<&dyn DynResource> {
        self.resources.get(type_name).map(|r| r.as_ref())
    }

    pub fn resource(&self, type_name: &str) -> Result<&dyn DynResource> {
        self.get(type_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown resource type: {}", type_name))
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }
}

/// Remote clients the AWS adapters are built from
#[derive(Clone)]
pub struct Clients {
    pub apigatewayv2: Arc<dyn ApiGatewayV2Api>,
    pub appsync: Arc<dyn AppSyncApi>,
    pub mq: Arc<dyn MqApi>,
}

/// Registry with every AWS adapter this crate provides
pub fn aws_registry(meta: ProviderMeta, clients: Clients) -> Result<Registry> {
    Registry::builder()
        .register(VpcLink::new(clients.apigatewayv2.clone(), meta.clone()))
        .register(ApiGatewayV2Stage::new(clients.apigatewayv2, meta))
        .register(MqConfiguration::new(clients.mq))
        .register(AppSyncResolver::new(clients.appsync.clone()))
        .register(AppSyncFunction::new(clients.appsync))
        .build()
}
