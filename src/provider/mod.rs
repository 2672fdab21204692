//! Resource adapters
//!
//! Each adapter maps one AWS resource kind onto a typed configuration with
//! Create/Read/Update/Delete plus import. Adapters are plain values collected
//! into a [`Registry`] once at startup.
//!
//! # Architecture
//!
//! - [`Resource`] - typed adapter contract implemented by every resource kind
//! - [`registry`] - type-erased table of adapters keyed by resource type
//! - [`Plan`] - field-level change summary, with diff suppression applied
//!
//! # Example
//!
//! ```ignore
//! let registry = awsrecon::provider::aws_registry(meta, clients)?;
//! let vpc_link = registry.resource("aws_apigatewayv2_vpc_link")?;
//! let applied = vpc_link.create(&OpContext::default(), &config).await?;
//! ```

mod appsync_function;
mod appsync_resolver;
mod graphql;
mod mq_configuration;
pub mod registry;
mod stage;
mod vpc_link;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, Timeouts};

pub use appsync_function::{AppSyncFunction, AppSyncFunctionConfig, AppSyncFunctionState};
pub use appsync_resolver::{
    AppSyncResolver, AppSyncResolverConfig, AppSyncResolverState, PipelineConfig,
};
pub use graphql::GraphQlName;
pub use mq_configuration::{MqConfiguration, MqConfigurationConfig, MqConfigurationState};
pub use registry::{aws_registry, Applied, Clients, DynResource, Registry, RegistryBuilder};
pub use stage::{ApiGatewayV2Stage, StageConfig, StageState};
pub use vpc_link::{VpcLink, VpcLinkConfig, VpcLinkState};

/// Provider-wide settings every adapter may need
#[derive(Debug, Clone)]
pub struct ProviderMeta {
    pub region: String,
    pub partition: String,
    pub account_id: Option<String>,
    pub timeouts: Timeouts,
}

impl ProviderMeta {
    pub fn from_config(config: &Config) -> Self {
        Self {
            region: config.effective_region(),
            partition: config.effective_partition(),
            account_id: config.account_id.clone(),
            timeouts: config.timeouts.clone(),
        }
    }
}

/// Per-invocation context
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    /// Aborts any wait in progress
    pub cancel: CancellationToken,
}

/// Field-level summary of the difference between two configurations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Fields updatable in place
    pub changed: Vec<&'static str>,
    /// Fields whose change forces a new resource
    pub replace: Vec<&'static str>,
    /// Fields that differ textually but are equivalent
    pub suppressed: Vec<&'static str>,
    /// Computed attributes that will take a new value
    pub recomputed: Vec<&'static str>,
}

impl Plan {
    pub fn field<T: PartialEq + ?Sized>(
        &mut self,
        name: &'static str,
        old: &T,
        new: &T,
    ) -> &mut Self {
        if old != new {
            self.changed.push(name);
        }
        self
    }

    pub fn force_new<T: PartialEq + ?Sized>(
        &mut self,
        name: &'static str,
        old: &T,
        new: &T,
    ) -> &mut Self {
        if old != new {
            self.replace.push(name);
        }
        self
    }

    /// Like [`Plan::field`], but a difference `equivalent` accepts is suppressed
    pub fn suppressible(
        &mut self,
        name: &'static str,
        old: &str,
        new: &str,
        equivalent: fn(&str, &str) -> bool,
    ) -> &mut Self {
        if old == new {
            return self;
        }
        if equivalent(old, new) {
            self.suppressed.push(name);
        } else {
            self.changed.push(name);
        }
        self
    }

    pub fn recompute(&mut self, name: &'static str) -> &mut Self {
        if !self.recomputed.contains(&name) {
            self.recomputed.push(name);
        }
        self
    }

    pub fn has_change(&self, name: &str) -> bool {
        self.changed.contains(&name) || self.replace.contains(&name)
    }

    pub fn requires_replacement(&self) -> bool {
        !self.replace.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.replace.is_empty()
    }
}

/// Typed Create/Read/Update/Delete contract for one resource kind
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Resource type name, e.g. `aws_apigatewayv2_vpc_link`
    const TYPE_NAME: &'static str;

    type Config: DeserializeOwned + Send + Sync;
    type State: Serialize + Send;

    /// Cross-field checks run right after a configuration is decoded
    fn validate(_config: &Self::Config) -> Result<()> {
        Ok(())
    }

    /// Create the remote object and return its ID
    async fn create(&self, ctx: &OpContext, config: &Self::Config) -> Result<String>;

    /// Current remote state, or `None` when the object no longer exists
    async fn read(&self, id: &str) -> Result<Option<Self::State>>;

    async fn update(
        &self,
        ctx: &OpContext,
        id: &str,
        old: &Self::Config,
        new: &Self::Config,
    ) -> Result<()>;

    /// Delete the remote object. An object that is already gone is not an error.
    async fn delete(&self, ctx: &OpContext, id: &str) -> Result<()>;

    /// Turn an import ID into the resource ID
    fn import(&self, id: &str) -> Result<String> {
        Ok(id.to_string())
    }

    fn plan(&self, old: &Self::Config, new: &Self::Config) -> Plan;
}
